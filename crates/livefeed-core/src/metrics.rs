// Metrics implementations
//
// CounterMetrics records through the `metrics` facade, so whatever recorder the
// process installs (Prometheus exporter, statsd, ...) sees the counters. With no
// recorder installed the calls are no-ops.
//
// Metric naming follows `<area>_<what>_total`; warnings carry a `kind` label.

use metrics::{counter, describe_counter};

use crate::error::PipelineWarning;
use crate::traits::PipelineMetrics;

/// Feed reads served from the cache
pub const FEED_CACHE_HITS: &str = "feed_cache_hits_total";

/// Feed reads that fell through to the store
pub const FEED_CACHE_MISSES: &str = "feed_cache_misses_total";

/// Non-fatal cache/stream failures, labelled by `kind`
pub const PIPELINE_WARNINGS: &str = "pipeline_warnings_total";

/// Metrics sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl PipelineMetrics for NoopMetrics {
    fn record_cache_hit(&self) {}

    fn record_cache_miss(&self) {}

    fn record_warning(&self, _warning: &PipelineWarning) {}
}

/// Metrics collaborator backed by the `metrics` crate
///
/// # Example
///
/// ```ignore
/// livefeed_core::metrics::describe_metrics();
/// let feeds = FeedReadPipeline::new(store, cache, config)
///     .with_metrics(Arc::new(CounterMetrics));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct CounterMetrics;

impl CounterMetrics {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineMetrics for CounterMetrics {
    fn record_cache_hit(&self) {
        counter!(FEED_CACHE_HITS).increment(1);
    }

    fn record_cache_miss(&self) {
        counter!(FEED_CACHE_MISSES).increment(1);
    }

    fn record_warning(&self, warning: &PipelineWarning) {
        counter!(PIPELINE_WARNINGS, "kind" => warning_kind(warning)).increment(1);
    }
}

/// Label value for a warning
pub fn warning_kind(warning: &PipelineWarning) -> &'static str {
    match warning {
        PipelineWarning::CachePopulate { .. } => "cache_populate",
        PipelineWarning::Publish { .. } => "publish",
    }
}

/// Register descriptions for the pipeline metrics.
///
/// Call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(FEED_CACHE_HITS, "Feed reads served from the cache");
    describe_counter!(FEED_CACHE_MISSES, "Feed reads that queried the store");
    describe_counter!(
        PIPELINE_WARNINGS,
        "Non-fatal cache populate or publish failures (label: kind)"
    );
}
