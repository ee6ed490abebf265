//! Per-user reply feeds.
//!
//! The read path normalises the request, consults the TTL cache and, on a
//! miss, loads reply events from the repository, assembles them into
//! [`ReplyItem`]s and offers the list back to the cache.

mod assemble;
mod params;
mod service;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::render::RenderError;
use crate::application::repos::RepoError;
use crate::domain::entities::ReplyItem;

pub use assemble::ReplyAssembler;
pub use params::{FeedQuery, MAX_ITEM_LIMIT, SYNDICATION_ITEM_LIMIT};
pub use service::{
    METRIC_CACHE_BACKEND_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CACHE_STORE_SKIPPED,
    ReplyFeedRequest, ReplyFeedService, SHOW_REPLIES_TAG,
};

/// Immutable, shareable list of feed items.
pub type ReplyList = Arc<Vec<ReplyItem>>;

/// Syndication document flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedType {
    Rss,
    Atom,
}

impl FeedType {
    /// Interpret an `output` request value. Only `atom` selects Atom; any
    /// other value still asks for syndication and gets RSS.
    pub fn from_output(output: &str) -> Self {
        if output == "atom" {
            FeedType::Atom
        } else {
            FeedType::Rss
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeedType::Rss => "rss",
            FeedType::Atom => "atom",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            FeedType::Rss => "application/rss+xml",
            FeedType::Atom => "application/atom+xml",
        }
    }
}

/// Result of a reply feed read.
#[derive(Debug, Clone)]
pub struct ReplyFeed {
    pub nick: String,
    pub query: FeedQuery,
    pub items: ReplyList,
    /// Seconds the response may be cached by clients.
    pub freshness_seconds: u32,
    pub expires_at: OffsetDateTime,
    pub feed_type: Option<FeedType>,
}

#[derive(Debug, Error)]
pub enum ReplyFeedError {
    #[error("invalid nick `{0}`")]
    InvalidIdentifier(String),
    #[error("user `{0}` not found")]
    UserNotFound(String),
    #[error("comment author {0} could not be resolved")]
    AuthorNotFound(i32),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
