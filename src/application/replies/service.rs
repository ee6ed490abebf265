use std::sync::Arc;

use metrics::counter;
use time::{Duration, OffsetDateTime};
use tracing::{debug, instrument, warn};

use crate::application::repos::{ReplyEventsQuery, ReplyEventsRepo, UsersRepo};
use crate::cache::{CacheKeys, TtlCache, policy};
use crate::domain::nick::validate_nick;

use super::{FeedQuery, FeedType, ReplyAssembler, ReplyFeed, ReplyFeedError, ReplyList};

/// Operation tag baked into every reply feed cache key.
pub const SHOW_REPLIES_TAG: &str = "show-replies";

pub const METRIC_CACHE_HIT: &str = "replyfeed_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "replyfeed_cache_miss_total";
pub const METRIC_CACHE_STORE_SKIPPED: &str = "replyfeed_cache_store_skipped_total";
pub const METRIC_CACHE_BACKEND_ERROR: &str = "replyfeed_cache_backend_error_total";

const SOURCE: &str = "application::replies::service";

/// Raw request input, before any validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyFeedRequest<'a> {
    pub nick: &'a str,
    pub offset: Option<i64>,
    /// Present when a syndication document was asked for.
    pub output: Option<&'a str>,
}

#[derive(Clone)]
pub struct ReplyFeedService {
    users: Arc<dyn UsersRepo>,
    events: Arc<dyn ReplyEventsRepo>,
    cache: Arc<dyn TtlCache<ReplyList>>,
    assembler: ReplyAssembler,
    keys: CacheKeys,
    default_page_size: i64,
}

impl ReplyFeedService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        events: Arc<dyn ReplyEventsRepo>,
        cache: Arc<dyn TtlCache<ReplyList>>,
        assembler: ReplyAssembler,
        keys: CacheKeys,
        default_page_size: i64,
    ) -> Self {
        Self {
            users,
            events,
            cache,
            assembler,
            keys,
            default_page_size,
        }
    }

    /// Read one page of `request.nick`'s reply feed, going through the cache.
    ///
    /// Cache failures are treated as misses. A failed fetch is never stored.
    #[instrument(
        skip(self, request),
        fields(nick = %request.nick, offset = ?request.offset, output = ?request.output)
    )]
    pub async fn get_reply_feed(
        &self,
        request: &ReplyFeedRequest<'_>,
    ) -> Result<ReplyFeed, ReplyFeedError> {
        let nick = validate_nick(request.nick)
            .map_err(|_| ReplyFeedError::InvalidIdentifier(request.nick.to_string()))?;

        let feed_type = request.output.map(FeedType::from_output);
        let query = FeedQuery::normalize(request.offset, feed_type.is_some(), self.default_page_size);

        let freshness_seconds = policy::freshness_seconds(query.first_page);
        let expires_at =
            OffsetDateTime::now_utc() + Duration::seconds(i64::from(freshness_seconds));

        let key = self
            .keys
            .reply_feed(SHOW_REPLIES_TAG, nick, query.offset, query.full_content);

        let items = match self.cached(&key).await {
            Some(items) => items,
            None => {
                let items = self.load(nick, &query).await?;
                self.store(&key, items.clone(), expires_at).await;
                items
            }
        };

        Ok(ReplyFeed {
            nick: nick.to_string(),
            query,
            items,
            freshness_seconds,
            expires_at,
            feed_type,
        })
    }

    async fn cached(&self, key: &str) -> Option<ReplyList> {
        match self.cache.get(key).await {
            Ok(Some(items)) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                debug!(key, items = items.len(), "Reply feed served from cache");
                Some(items)
            }
            Ok(None) => {
                counter!(METRIC_CACHE_MISS).increment(1);
                debug!(key, "Reply feed cache miss");
                None
            }
            Err(err) => {
                counter!(METRIC_CACHE_BACKEND_ERROR, "op" => "get").increment(1);
                counter!(METRIC_CACHE_MISS).increment(1);
                warn!(
                    target = SOURCE,
                    key,
                    error = %err,
                    "Cache read failed; treating as miss"
                );
                None
            }
        }
    }

    async fn load(&self, nick: &str, query: &FeedQuery) -> Result<ReplyList, ReplyFeedError> {
        let user = self
            .users
            .find_by_nick(nick)
            .await?
            .ok_or_else(|| ReplyFeedError::UserNotFound(nick.to_string()))?;

        let ignored = self.users.list_ignored(user.id).await?;
        let records = self
            .events
            .list_reply_events(ReplyEventsQuery {
                user_id: user.id,
                excluded_authors: &ignored,
                offset: query.offset,
                limit: query.item_limit,
            })
            .await?;

        let items = self.assembler.assemble(records, query.full_content).await?;
        Ok(Arc::new(items))
    }

    async fn store(&self, key: &str, items: ReplyList, expires_at: OffsetDateTime) {
        if !self.cache.accepts_writes() {
            debug!(key, "Reply feed caching disabled; not storing");
            return;
        }

        match self.cache.put_if_absent(key, items, expires_at).await {
            Ok(true) => debug!(key, "Reply feed stored in cache"),
            Ok(false) => {
                counter!(METRIC_CACHE_STORE_SKIPPED).increment(1);
                debug!(key, "Reply feed cache slot already occupied");
            }
            Err(err) => {
                counter!(METRIC_CACHE_BACKEND_ERROR, "op" => "put").increment(1);
                warn!(
                    target = SOURCE,
                    key,
                    error = %err,
                    "Cache write failed; response served uncached"
                );
            }
        }
    }
}
