mod middleware;
mod public;

pub use public::{HttpState, build_router};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;

const DB_HEALTH_SOURCE: &str = "infra::http::db_health";

fn db_health_response(result: Option<Result<(), SqlxError>>) -> Response {
    let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
    let report = match result {
        Some(Ok(())) => return StatusCode::NO_CONTENT.into_response(),
        Some(Err(err)) => {
            ErrorReport::from_error(DB_HEALTH_SOURCE, StatusCode::SERVICE_UNAVAILABLE, &err)
        }
        None => ErrorReport::from_message(
            DB_HEALTH_SOURCE,
            StatusCode::SERVICE_UNAVAILABLE,
            "no database configured",
        ),
    };
    report.attach(&mut response);
    response
}
