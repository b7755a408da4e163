//! Prometheus counters for CLI runs.
//!
//! A command is a short-lived process, so instead of serving `/metrics` the
//! rendered snapshot is written to a text file once the command finishes.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use tracing::info;

use crate::config::ObservabilityConfig;

/// Installs the global Prometheus recorder when metrics are enabled.
pub fn init_metrics(config: &ObservabilityConfig) -> Result<Option<PrometheusHandle>> {
    if !config.metrics_enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");

    Ok(Some(handle))
}

pub async fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create metrics directory {}", parent.display()))?;
    }

    tokio::fs::write(path, handle.render())
        .await
        .with_context(|| format!("Failed to write metrics to {}", path.display()))?;

    Ok(())
}
