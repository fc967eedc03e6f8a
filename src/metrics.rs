//! Prometheus metrics
//!
//! Cache effectiveness and upstream health, exported on GET /metrics.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    /// Counter: cache lookups by cache and outcome (hit/miss)
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec!(
        "pagefeed_cache_operations_total",
        "Cache operations by cache and type",
        &["cache", "operation"]
    )
    .expect("Failed to create cache_operations metric");

    /// Counter: failed Graph API reads by operation and error kind
    pub static ref UPSTREAM_ERRORS: CounterVec = register_counter_vec!(
        "pagefeed_upstream_errors_total",
        "Graph API errors by operation and kind",
        &["operation", "kind"]
    )
    .expect("Failed to create upstream_errors metric");

    /// Histogram: Graph API read latency (seconds)
    pub static ref UPSTREAM_DURATION: HistogramVec = register_histogram_vec!(
        "pagefeed_upstream_duration_seconds",
        "Duration of Graph API reads",
        &["operation"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create upstream_duration metric");

    /// Counter: tags invalidated through the revalidation endpoint
    pub static ref REVALIDATIONS: CounterVec = register_counter_vec!(
        "pagefeed_revalidations_total",
        "Cache tags invalidated on request",
        &["tag"]
    )
    .expect("Failed to create revalidations metric");
}

/// Record a cache hit or miss
pub fn record_cache_operation(cache: &str, operation: &str) {
    CACHE_OPERATIONS
        .with_label_values(&[cache, operation])
        .inc();
}

/// Increment upstream error counter
pub fn record_upstream_error(operation: &str, kind: &str) {
    UPSTREAM_ERRORS.with_label_values(&[operation, kind]).inc();
}

/// Record the duration of one upstream read
pub fn record_upstream_duration(operation: &str, duration_secs: f64) {
    UPSTREAM_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);
}

/// Record an invalidated tag
pub fn record_revalidation(tag: &str) {
    REVALIDATIONS.with_label_values(&[tag]).inc();
}

/// Encode all metrics as Prometheus text format
pub fn encode_metrics() -> crate::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| crate::PageFeedError::Other(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| crate::PageFeedError::Other(format!("Metrics are not UTF-8: {}", e)))
}
