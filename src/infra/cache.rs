use std::sync::Arc;

use tracing::info;

use crate::{
    application::replies::ReplyList,
    cache::{CacheBackend, CacheConfig, DisabledCache, MemoryTtlCache, TtlCache},
};

use super::{error::InfraError, redis_cache::RedisTtlCache};

/// Build the reply feed cache selected by `config`.
pub async fn build_reply_cache(
    config: &CacheConfig,
) -> Result<Arc<dyn TtlCache<ReplyList>>, InfraError> {
    let cache: Arc<dyn TtlCache<ReplyList>> = match config.backend {
        CacheBackend::Memory => Arc::new(MemoryTtlCache::<ReplyList>::new(
            config.memory_capacity_non_zero(),
        )),
        CacheBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                InfraError::configuration("cache.redis_url is required for the redis backend")
            })?;
            Arc::new(RedisTtlCache::<ReplyList>::connect(url).await?)
        }
        CacheBackend::Disabled => Arc::new(DisabledCache),
    };

    info!(
        backend = %config.backend,
        namespace = config.namespace.as_str(),
        capacity = config.memory_capacity,
        "Reply feed cache ready"
    );
    Ok(cache)
}
