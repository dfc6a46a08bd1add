//! Prometheus metrics for sow-server.
//!
//! Exposes counters in Prometheus format at the `/metrics` endpoint. Until
//! [`init_metrics`] installs a recorder the record functions are no-ops, which
//! is what tests rely on.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering.
///
/// Call once at server startup before any metrics are recorded.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!("sow_created_total", "Statements of Work created and sent");
    describe_counter!(
        "sow_signing_completed_total",
        "Signing flows completed by the client"
    );
    describe_counter!(
        "sow_signing_rejected_total",
        "Signing attempts rejected, by reason"
    );
    describe_counter!("sow_email_sent_total", "Emails delivered, by kind");
    describe_counter!(
        "sow_email_failures_total",
        "Emails that failed after all retry attempts, by kind"
    );

    Ok(handle)
}

pub fn record_sow_created() {
    counter!("sow_created_total").increment(1);
}

pub fn record_signing_completed() {
    counter!("sow_signing_completed_total").increment(1);
}

/// `reason` is one of `invalid`, `used`, `expired`.
pub fn record_signing_rejected(reason: &'static str) {
    counter!("sow_signing_rejected_total", "reason" => reason).increment(1);
}

pub fn record_email_sent(kind: &'static str) {
    counter!("sow_email_sent_total", "kind" => kind).increment(1);
}

pub fn record_email_failure(kind: &'static str) {
    counter!("sow_email_failures_total", "kind" => kind).increment(1);
}
