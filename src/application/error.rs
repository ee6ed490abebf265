use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{replies::ReplyFeedError, repos::RepoError},
    domain::error::DomainError,
    infra::error::InfraError,
};

const REPLY_FEED_SOURCE: &str = "application::error::reply_feed_error_to_http_error";

/// Diagnostic attached to error responses for the response logger.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

impl From<ReplyFeedError> for HttpError {
    fn from(error: ReplyFeedError) -> Self {
        match error {
            ReplyFeedError::InvalidIdentifier(nick) => HttpError::new(
                REPLY_FEED_SOURCE,
                StatusCode::BAD_REQUEST,
                "Invalid nick",
                format!("Nick `{nick}` is not well formed"),
            ),
            ReplyFeedError::UserNotFound(nick) => HttpError::new(
                REPLY_FEED_SOURCE,
                StatusCode::NOT_FOUND,
                "Unknown user",
                format!("No user with nick `{nick}`"),
            ),
            ReplyFeedError::Repo(RepoError::Timeout) => HttpError::new(
                REPLY_FEED_SOURCE,
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
                "Database timed out while loading replies",
            ),
            err @ (ReplyFeedError::AuthorNotFound(_)
            | ReplyFeedError::Repo(_)
            | ReplyFeedError::Render(_)) => HttpError::from_error(
                REPLY_FEED_SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err,
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("resource not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(DomainError::NotFound { .. }) | AppError::NotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::Domain(DomainError::Validation { .. }) | AppError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Infra(InfraError::Database { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Infra(
                InfraError::Configuration { .. }
                | InfraError::Telemetry(_)
                | InfraError::Io(_)
                | InfraError::Cache(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Domain(DomainError::Invariant { .. }) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::NotFound { .. }) | AppError::NotFound => {
                "Resource not found"
            }
            AppError::Domain(DomainError::Validation { .. }) | AppError::Validation(_) => {
                "Request could not be processed"
            }
            AppError::Infra(InfraError::Database { .. }) => "Service temporarily unavailable",
            AppError::Infra(InfraError::Configuration { .. }) => "Service misconfigured",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Io(_)) => "I/O failure during request",
            AppError::Infra(InfraError::Cache(_)) => "Cache backend unavailable",
            AppError::Domain(DomainError::Invariant { .. }) | AppError::Unexpected(_) => {
                "Unexpected error occurred"
            }
        }
    }
}

impl From<ReplyFeedError> for AppError {
    fn from(error: ReplyFeedError) -> Self {
        match error {
            ReplyFeedError::InvalidIdentifier(nick) => AppError::Domain(DomainError::validation(
                "nick",
                format!("`{nick}` is not well formed"),
            )),
            ReplyFeedError::UserNotFound(_) => AppError::Domain(DomainError::not_found("user")),
            ReplyFeedError::AuthorNotFound(author_id) => AppError::Domain(
                DomainError::invariant(format!("comment author {author_id} does not exist")),
            ),
            ReplyFeedError::Repo(err) => AppError::Infra(InfraError::database(err.to_string())),
            ReplyFeedError::Render(err) => AppError::unexpected(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.presentation_message();
        let report = ErrorReport::from_error("application::error::AppError", status, &self);
        let mut response = (status, message).into_response();
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::render::RenderError;

    fn status_of(error: ReplyFeedError) -> StatusCode {
        HttpError::from(error).status()
    }

    #[test]
    fn reply_feed_errors_map_to_statuses() {
        assert_eq!(
            status_of(ReplyFeedError::InvalidIdentifier("1x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ReplyFeedError::UserNotFound("ghost".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ReplyFeedError::Repo(RepoError::Timeout)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(ReplyFeedError::Repo(RepoError::from_persistence("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ReplyFeedError::AuthorNotFound(3)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ReplyFeedError::Render(RenderError::SourceTooLarge {
                size: 2,
                limit: 1
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_response_carries_report() {
        let response =
            HttpError::from(ReplyFeedError::Repo(RepoError::from_persistence("disk on fire")))
                .into_response();
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(report.messages[0].contains("disk on fire"), "{:?}", report.messages);
    }

    #[test]
    fn app_error_classifies_reply_feed_failures() {
        let not_found = AppError::from(ReplyFeedError::UserNotFound("ghost".into()));
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let invalid = AppError::from(ReplyFeedError::InvalidIdentifier("1x".into()));
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let invariant = AppError::from(ReplyFeedError::AuthorNotFound(9));
        assert_eq!(invariant.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let database = AppError::from(ReplyFeedError::Repo(RepoError::Timeout));
        assert_eq!(database.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
