// ============================================================================
// PROMETHEUS METRICS - Sistema de Observabilidad
// ============================================================================
// Métricas del cache de transcripciones y del acceso al upstream
// ============================================================================

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter,
    register_int_counter_vec, Histogram, HistogramVec, IntCounter, IntCounterVec,
};

lazy_static! {
    // ========================================================================
    // HTTP REQUEST METRICS
    // ========================================================================

    /// Total de requests HTTP por método, endpoint y status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "endpoint", "status"]
    )
    .unwrap();

    /// Duración de requests HTTP en segundos
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "endpoint"],
        vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .unwrap();

    // ========================================================================
    // TRANSCRIPT CACHE METRICS
    // ========================================================================

    /// Lookups al cache por resultado (hit / miss / bypass)
    pub static ref CACHE_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "transcript_cache_lookups_total",
        "Transcript cache lookups by result",
        &["result"]
    )
    .unwrap();

    /// Filas eliminadas por la purga de retención
    pub static ref CACHE_PURGED_TOTAL: IntCounter = register_int_counter!(
        "transcript_cache_purged_total",
        "Transcript cache rows removed by retention purge"
    )
    .unwrap();

    // ========================================================================
    // UPSTREAM METRICS
    // ========================================================================

    /// Llamadas al upstream por resultado
    pub static ref UPSTREAM_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "transcript_upstream_calls_total",
        "Upstream transcript calls by outcome",
        &["operation", "outcome"]
    )
    .unwrap();

    /// Tiempo de espera impuesto por el throttle global
    pub static ref THROTTLE_WAIT_SECONDS: Histogram = register_histogram!(
        "transcript_throttle_wait_seconds",
        "Time callers spent waiting on the upstream throttle",
        vec![0.0, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]
    )
    .unwrap();
}

/// Helper para registrar una request HTTP
pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, endpoint])
        .observe(duration_secs);
}

/// Helper para registrar el resultado de un lookup
pub fn record_cache_lookup(result: &str) {
    CACHE_LOOKUPS_TOTAL.with_label_values(&[result]).inc();
}

/// Helper para registrar una llamada al upstream
pub fn record_upstream_call(operation: &str, outcome: &str) {
    UPSTREAM_CALLS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

pub fn record_throttle_wait(wait_secs: f64) {
    THROTTLE_WAIT_SECONDS.observe(wait_secs);
}

pub fn record_purge(rows: u64) {
    CACHE_PURGED_TOTAL.inc_by(rows);
}
