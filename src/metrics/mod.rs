//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Step execution per chain family
//! - Transaction submission
//! - Status and approval polling
//! - Failure reporting

use crate::error::{ExecutorError, ExecutorResult};
use crate::model::ChainFamily;

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    // Step metrics
    pub static ref STEPS_STARTED: CounterVec = register_counter_vec!(
        "xswap_steps_started_total",
        "Total route steps started",
        &["chain_family"]
    ).unwrap();

    pub static ref STEPS_SUCCEEDED: CounterVec = register_counter_vec!(
        "xswap_steps_succeeded_total",
        "Total route steps that reached SUCCESS",
        &["chain_family"]
    ).unwrap();

    pub static ref STEPS_FAILED: CounterVec = register_counter_vec!(
        "xswap_steps_failed_total",
        "Total route steps that failed",
        &["chain_family", "kind"]
    ).unwrap();

    // Transaction metrics
    pub static ref TX_SUBMITTED: CounterVec = register_counter_vec!(
        "xswap_transactions_submitted_total",
        "Total transactions signed and broadcast",
        &["chain_family"]
    ).unwrap();

    // Polling metrics
    pub static ref STATUS_POLLS: CounterVec = register_counter_vec!(
        "xswap_status_polls_total",
        "Total status checks by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref APPROVALS: CounterVec = register_counter_vec!(
        "xswap_approvals_total",
        "Total approval sub-flows by outcome",
        &["outcome"]
    ).unwrap();

    // Reporting metrics
    pub static ref FAILURE_REPORTS: CounterVec = register_counter_vec!(
        "xswap_failure_reports_total",
        "Total failure reports by delivery outcome",
        &["outcome"]
    ).unwrap();

    pub static ref ROUTE_DURATION: HistogramVec = register_histogram_vec!(
        "xswap_route_duration_seconds",
        "Wall-clock time to run a route to completion or failure",
        &["outcome"],
        vec![5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0]
    ).unwrap();
}

/// Encode every registered metric in the Prometheus text format
pub fn render() -> ExecutorResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ExecutorError::Config(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| ExecutorError::Config(format!("Metrics are not valid UTF-8: {}", e)))
}

// Helper functions to record metrics

pub fn record_step_started(family: ChainFamily) {
    STEPS_STARTED.with_label_values(&[family.as_str()]).inc();
}

pub fn record_step_succeeded(family: ChainFamily) {
    STEPS_SUCCEEDED.with_label_values(&[family.as_str()]).inc();
}

pub fn record_step_failed(family: ChainFamily, error: &ExecutorError) {
    STEPS_FAILED
        .with_label_values(&[family.as_str(), error.kind()])
        .inc();
}

pub fn record_tx_submitted(family: ChainFamily) {
    TX_SUBMITTED.with_label_values(&[family.as_str()]).inc();
}

pub fn record_status_poll(outcome: &str) {
    STATUS_POLLS.with_label_values(&[outcome]).inc();
}

pub fn record_approval(outcome: &str) {
    APPROVALS.with_label_values(&[outcome]).inc();
}

pub fn record_failure_report(delivered: bool) {
    let outcome = if delivered { "delivered" } else { "dropped" };
    FAILURE_REPORTS.with_label_values(&[outcome]).inc();
}

pub fn record_route_duration(completed: bool, secs: f64) {
    let outcome = if completed { "completed" } else { "failed" };
    ROUTE_DURATION.with_label_values(&[outcome]).observe(secs);
}
