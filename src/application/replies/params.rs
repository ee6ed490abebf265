//! Request parameter normalisation for reply feeds.

use serde::Serialize;

/// Items per syndication document.
pub const SYNDICATION_ITEM_LIMIT: u32 = 50;
/// Hard ceiling on items per request, whatever the mode.
pub const MAX_ITEM_LIMIT: u32 = 200;

/// Normalised request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedQuery {
    pub offset: u64,
    pub first_page: bool,
    pub item_limit: u32,
    /// Render message bodies and author nicks.
    pub full_content: bool,
}

impl FeedQuery {
    /// Sanitize raw request input. Never fails: negative or absent offsets
    /// become zero and the item limit is clamped into `1..=MAX_ITEM_LIMIT`.
    pub fn normalize(
        raw_offset: Option<i64>,
        syndication_requested: bool,
        configured_default: i64,
    ) -> Self {
        let offset = u64::try_from(raw_offset.unwrap_or(0)).unwrap_or(0);

        let requested = if syndication_requested {
            i64::from(SYNDICATION_ITEM_LIMIT)
        } else {
            configured_default
        };
        let item_limit = u32::try_from(requested.clamp(1, i64::from(MAX_ITEM_LIMIT)))
            .unwrap_or(MAX_ITEM_LIMIT);

        Self {
            offset,
            first_page: offset == 0,
            item_limit,
            full_content: syndication_requested,
        }
    }
}
