//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use replyfeed::application::render::MarkdownRenderer;
use replyfeed::application::replies::{ReplyAssembler, ReplyFeedService, ReplyList};
use replyfeed::application::repos::{ReplyEventsQuery, ReplyEventsRepo, RepoError, UsersRepo};
use replyfeed::cache::{CacheError, CacheKeys, MemoryTtlCache, TtlCache};
use replyfeed::domain::entities::{ReplyEventRecord, UserRef};
use time::OffsetDateTime;
use time::macros::datetime;

pub const ALICE: i32 = 1;
pub const BOB: i32 = 2;
pub const CAROL: i32 = 3;
pub const DAVE: i32 = 4;

#[derive(Default)]
pub struct FakeUsers {
    users: Vec<UserRef>,
    ignored: HashMap<i32, Vec<i32>>,
    pub nick_lookups: AtomicUsize,
}

impl FakeUsers {
    pub fn seeded() -> Self {
        let users = [(ALICE, "alice"), (BOB, "bob"), (CAROL, "carol"), (DAVE, "dave")]
            .into_iter()
            .map(|(id, nick)| UserRef {
                id,
                nick: nick.to_string(),
            })
            .collect();
        Self {
            users,
            ignored: HashMap::from([(ALICE, vec![DAVE])]),
            nick_lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl UsersRepo for FakeUsers {
    async fn find_by_nick(&self, nick: &str) -> Result<Option<UserRef>, RepoError> {
        self.nick_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.iter().find(|user| user.nick == nick).cloned())
    }

    async fn find_nick_by_id(&self, user_id: i32) -> Result<Option<String>, RepoError> {
        Ok(self
            .users
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| user.nick.clone()))
    }

    async fn list_ignored(&self, user_id: i32) -> Result<Vec<i32>, RepoError> {
        Ok(self.ignored.get(&user_id).cloned().unwrap_or_default())
    }
}

/// Reply events keyed by the user they were addressed to.
#[derive(Default)]
pub struct FakeEvents {
    events: HashMap<i32, Vec<ReplyEventRecord>>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeEvents {
    pub fn seeded() -> Self {
        let alice_events = (0..45)
            .map(|n| {
                let author = match n % 3 {
                    0 => CAROL,
                    1 => BOB,
                    _ => DAVE,
                };
                event(1000 - n, author, n % 2 == 0)
            })
            .collect();
        Self {
            events: HashMap::from([
                (ALICE, alice_events),
                (BOB, vec![event(10, ALICE, false)]),
            ]),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplyEventsRepo for FakeEvents {
    async fn list_reply_events(
        &self,
        query: ReplyEventsQuery<'_>,
    ) -> Result<Vec<ReplyEventRecord>, RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("connection reset"));
        }

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(self
            .events
            .get(&query.user_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|event| !query.excluded_authors.contains(&event.comment_author_id))
                    .skip(offset)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn event(comment_id: i32, author: i32, markup: bool) -> ReplyEventRecord {
    ReplyEventRecord {
        comment_id,
        comment_author_id: author,
        comment_date: datetime!(2024-03-01 12:00 UTC),
        topic_title: Some(format!("Topic   {comment_id}")),
        section_title: "Forum".to_string(),
        group_title: "General".to_string(),
        group_url_segment: "general".to_string(),
        section_id: 2,
        topic_id: comment_id / 10,
        last_modified: (comment_id % 2 == 0).then_some(datetime!(2024-03-02 08:00 UTC)),
        message: if markup {
            "hello *world*".to_string()
        } else {
            "plain reply".to_string()
        },
        markup,
    }
}

/// Memory cache that counts traffic and remembers the last requested expiry.
pub struct CountingCache {
    inner: MemoryTtlCache<ReplyList>,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    last_expiry: Mutex<Option<OffsetDateTime>>,
}

impl CountingCache {
    pub fn new() -> Self {
        Self {
            inner: MemoryTtlCache::new(NonZeroUsize::new(64).expect("non-zero")),
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            last_expiry: Mutex::new(None),
        }
    }

    pub fn last_expiry(&self) -> Option<OffsetDateTime> {
        *self.last_expiry.lock().expect("expiry lock")
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl TtlCache<ReplyList> for CountingCache {
    async fn get(&self, key: &str) -> Result<Option<ReplyList>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn put_if_absent(
        &self,
        key: &str,
        value: ReplyList,
        expires_at: OffsetDateTime,
    ) -> Result<bool, CacheError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        *self.last_expiry.lock().expect("expiry lock") = Some(expires_at);
        self.inner.put_if_absent(key, value, expires_at).await
    }
}

/// Cache whose backend is down.
#[derive(Default)]
pub struct FailingCache {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl TtlCache<ReplyList> for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<ReplyList>, CacheError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::backend("connection refused"))
    }

    async fn put_if_absent(
        &self,
        _key: &str,
        _value: ReplyList,
        _expires_at: OffsetDateTime,
    ) -> Result<bool, CacheError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::backend("connection refused"))
    }
}

/// Cache whose slots are always taken by another writer.
#[derive(Default)]
pub struct OccupiedCache {
    pub puts: AtomicUsize,
}

#[async_trait]
impl TtlCache<ReplyList> for OccupiedCache {
    async fn get(&self, _key: &str) -> Result<Option<ReplyList>, CacheError> {
        Ok(None)
    }

    async fn put_if_absent(
        &self,
        _key: &str,
        _value: ReplyList,
        _expires_at: OffsetDateTime,
    ) -> Result<bool, CacheError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(false)
    }
}

/// Switched-off cache that still counts write attempts.
#[derive(Default)]
pub struct SwitchedOffCache {
    pub puts: AtomicUsize,
}

#[async_trait]
impl TtlCache<ReplyList> for SwitchedOffCache {
    async fn get(&self, _key: &str) -> Result<Option<ReplyList>, CacheError> {
        Ok(None)
    }

    async fn put_if_absent(
        &self,
        _key: &str,
        _value: ReplyList,
        _expires_at: OffsetDateTime,
    ) -> Result<bool, CacheError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(false)
    }

    fn accepts_writes(&self) -> bool {
        false
    }
}

pub struct Harness {
    pub users: Arc<FakeUsers>,
    pub events: Arc<FakeEvents>,
    pub service: ReplyFeedService,
}

pub fn harness(cache: Arc<dyn TtlCache<ReplyList>>, default_page_size: i64) -> Harness {
    let users = Arc::new(FakeUsers::seeded());
    let events = Arc::new(FakeEvents::seeded());
    let assembler = ReplyAssembler::new(users.clone(), Arc::new(MarkdownRenderer::default()));
    let service = ReplyFeedService::new(
        users.clone(),
        events.clone(),
        cache,
        assembler,
        CacheKeys::new("test"),
        default_page_size,
    );
    Harness {
        users,
        events,
        service,
    }
}
