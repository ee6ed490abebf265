//! Freshness policy for reply feed pages.
//!
//! The head of a feed keeps changing as new replies arrive, deeper pages
//! barely move. The same window drives both cache expiry and the client
//! caching headers.

pub const FIRST_PAGE_FRESHNESS_SECS: u32 = 90;
pub const DEEP_PAGE_FRESHNESS_SECS: u32 = 60 * 60;

pub fn freshness_seconds(first_page: bool) -> u32 {
    if first_page {
        FIRST_PAGE_FRESHNESS_SECS
    } else {
        DEEP_PAGE_FRESHNESS_SECS
    }
}
