//! Postgres-backed repository implementations.

mod replies;
mod users;
mod util;

pub use util::map_sqlx_error;

use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
};

use lru::LruCache;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    query,
};

const NICK_CACHE_CAPACITY: usize = 512;

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
    nick_cache: Arc<Mutex<LruCache<i32, String>>>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            nick_cache: Arc::new(Mutex::new(LruCache::new(
                NonZeroUsize::new(NICK_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ))),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }
}
