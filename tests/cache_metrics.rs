mod support;

use std::collections::HashSet;
use std::sync::Arc;

use metrics_util::debugging::{DebuggingRecorder, Snapshotter};
use replyfeed::application::replies::{
    METRIC_CACHE_BACKEND_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_CACHE_STORE_SKIPPED,
    ReplyFeedRequest, ReplyList,
};
use replyfeed::cache::{DisabledCache, TtlCache};
use support::{CountingCache, FailingCache, OccupiedCache, harness};

fn metric_names(snapshotter: &Snapshotter) -> HashSet<String> {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect()
}

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let request = ReplyFeedRequest {
        nick: "alice",
        offset: Some(0),
        output: None,
    };

    // disabled cache: misses, but never a skipped store
    let disabled: Arc<dyn TtlCache<ReplyList>> = Arc::new(DisabledCache);
    let disabled = harness(disabled, 20);
    disabled
        .service
        .get_reply_feed(&request)
        .await
        .expect("disabled cache");
    let names = metric_names(&snapshotter);
    assert!(names.contains(METRIC_CACHE_MISS));
    assert!(
        !names.contains(METRIC_CACHE_STORE_SKIPPED),
        "disabled cache must not report skipped stores"
    );

    // miss, then hit
    let memory = harness(Arc::new(CountingCache::new()), 20);
    memory.service.get_reply_feed(&request).await.expect("miss");
    memory.service.get_reply_feed(&request).await.expect("hit");

    // slot taken by a concurrent writer
    let occupied = harness(Arc::new(OccupiedCache::default()), 20);
    occupied
        .service
        .get_reply_feed(&request)
        .await
        .expect("store skipped");

    // unreachable backend
    let failing = harness(Arc::new(FailingCache::default()), 20);
    failing
        .service
        .get_reply_feed(&request)
        .await
        .expect("backend error");

    let names = metric_names(&snapshotter);
    for metric in [
        METRIC_CACHE_HIT,
        METRIC_CACHE_MISS,
        METRIC_CACHE_STORE_SKIPPED,
        METRIC_CACHE_BACKEND_ERROR,
    ] {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
