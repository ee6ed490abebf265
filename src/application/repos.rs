//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{ReplyEventRecord, UserRef};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Window into a user's reply events.
#[derive(Debug, Clone, Copy)]
pub struct ReplyEventsQuery<'a> {
    pub user_id: i32,
    /// Authors whose comments must not appear (the user's ignore list).
    pub excluded_authors: &'a [i32],
    pub offset: u64,
    pub limit: u32,
}

#[async_trait]
pub trait ReplyEventsRepo: Send + Sync {
    /// Reply events for `query.user_id`, newest first, already limited and
    /// offset. Deleted comments, deleted topics and excluded authors are
    /// filtered out by the implementation.
    async fn list_reply_events(
        &self,
        query: ReplyEventsQuery<'_>,
    ) -> Result<Vec<ReplyEventRecord>, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_nick(&self, nick: &str) -> Result<Option<UserRef>, RepoError>;

    async fn find_nick_by_id(&self, user_id: i32) -> Result<Option<String>, RepoError>;

    async fn list_ignored(&self, user_id: i32) -> Result<Vec<i32>, RepoError>;
}
