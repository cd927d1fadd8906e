use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::{Mutex, OnceLock};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

static INSTALL: Mutex<()> = Mutex::new(());

/// Install the global Prometheus recorder. Safe to call more than once,
/// including concurrently.
pub fn init_metrics() -> Result<(), anyhow::Error> {
    let _guard = INSTALL
        .lock()
        .map_err(|_| anyhow::anyhow!("Metrics install lock poisoned"))?;

    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// `scheme` is `bearer` or `api_key`; `outcome` is `success`, `rejected` or `error`.
pub fn record_auth_attempt(scheme: &'static str, outcome: &'static str) {
    counter!("auth_attempts_total", "scheme" => scheme, "outcome" => outcome).increment(1);
}

/// `outcome` is `granted`, `denied` or `error`.
pub fn record_membership_check(outcome: &'static str) {
    counter!("membership_checks_total", "outcome" => outcome).increment(1);
}
