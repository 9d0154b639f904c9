//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("photogram_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "photogram_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Social graph metrics
    pub static ref FOLLOW_EDGES_TOTAL: IntGauge = IntGauge::new(
        "photogram_follow_edges_total",
        "Current number of follow edges (actor side)"
    ).expect("metric can be created");
    pub static ref RECONCILE_REPAIRS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("photogram_reconcile_repairs_total", "Asymmetric follow edges repaired by reconciliation"),
        &["repair"]
    ).expect("metric can be created");

    // Content metrics
    pub static ref POSTS_TOTAL: IntGauge = IntGauge::new(
        "photogram_posts_total",
        "Total number of posts"
    ).expect("metric can be created");
    pub static ref FEED_BUILD_DURATION_SECONDS: prometheus::Histogram = prometheus::Histogram::with_opts(
        HistogramOpts::new(
            "photogram_feed_build_duration_seconds",
            "Feed assembly duration in seconds"
        ).buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0])
    ).expect("metric can be created");

    // Aggregate recomputation
    pub static ref AGGREGATE_RECOMPUTE_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "photogram_aggregate_recompute_failures_total",
        "Average-likes recomputations that failed and were logged"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("photogram_errors_total", "Total number of errors"),
        &["error_type", "endpoint"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("HTTP_REQUESTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(FOLLOW_EDGES_TOTAL.clone()))
        .expect("FOLLOW_EDGES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(RECONCILE_REPAIRS_TOTAL.clone()))
        .expect("RECONCILE_REPAIRS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(POSTS_TOTAL.clone()))
        .expect("POSTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(FEED_BUILD_DURATION_SECONDS.clone()))
        .expect("FEED_BUILD_DURATION_SECONDS can be registered");
    REGISTRY
        .register(Box::new(AGGREGATE_RECOMPUTE_FAILURES_TOTAL.clone()))
        .expect("AGGREGATE_RECOMPUTE_FAILURES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
