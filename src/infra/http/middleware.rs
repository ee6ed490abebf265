use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::{error::ErrorReport, replies::FeedType};

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Which feed a response belongs to, attached by the reply handlers.
#[derive(Debug, Clone)]
pub struct FeedContext {
    pub nick: String,
    pub feed_type: Option<FeedType>,
}

impl FeedContext {
    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Log fields for a response: the nick (empty when unknown) and `page`,
/// `rss` or `atom`.
fn feed_fields(context: Option<&FeedContext>) -> (&str, &'static str) {
    match context {
        Some(context) => (
            context.nick.as_str(),
            context.feed_type.map_or("page", FeedType::as_str),
        ),
        None => ("", "page"),
    }
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Log failed requests together with the [`ErrorReport`] handlers attach.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    let feed = response.extensions().get::<FeedContext>().cloned();
    let (nick, output) = feed_fields(feed.as_ref());

    if status.is_success() && feed.is_some() {
        debug!(
            target = "replyfeed::http::response",
            status = status.as_u16(),
            nick,
            output,
            elapsed_ms = start.elapsed().as_millis(),
            request_id = request_id,
            "reply feed served",
        );
    }

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "replyfeed::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                nick,
                output,
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "request failed",
            );
        } else {
            warn!(
                target = "replyfeed::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                nick,
                output,
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                request_id = request_id,
                "client request error",
            );
        }
    }

    response
}
