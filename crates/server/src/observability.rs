use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};
use service::ServiceResponse;

// Prometheus metrics (default registry)
pub static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "chatter_requests_total",
        "Total service requests by service and outcome",
        &["service", "outcome"]
    )
    .expect("register chatter_requests_total")
});

pub fn outcome_label(resp: &ServiceResponse) -> &'static str {
    if resp.failure_occurred { "failure" } else { "success" }
}

pub fn record_request(service: &str, resp: &ServiceResponse) {
    REQUESTS_TOTAL.with_label_values(&[service, outcome_label(resp)]).inc();
}

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
