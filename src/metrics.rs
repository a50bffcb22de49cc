use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Gauge, Histogram, TextEncoder, register_counter, register_gauge,
    register_histogram,
};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("github_requests_total", "Total number of requests sent to GitHub").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "github_request_latency_seconds",
        "GitHub request latency in seconds"
    )
    .unwrap();
    pub static ref IN_FLIGHT: Gauge =
        register_gauge!("github_requests_in_flight", "Requests currently holding a permit").unwrap();
    pub static ref WINDOW_WAITS: Counter =
        register_counter!("governor_window_waits_total", "Admissions delayed by the per-window cap").unwrap();
    pub static ref RATE_LIMIT_RETRIES: Counter =
        register_counter!("governor_rate_limit_retries_total", "Requests retried after a rate limit response").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("content_cache_hits_total", "Total cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("content_cache_misses_total", "Total cache misses").unwrap();
}

// Render every registered metric in the text exposition format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
