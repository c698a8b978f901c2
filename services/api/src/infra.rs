use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use realty_match::error::AppError;
use realty_match::workflows::matching::Dataset;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn load_dataset(path: &Path) -> Result<Dataset, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn write_dataset(path: &Path, dataset: &Dataset) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(dataset)?;
    std::fs::write(path, rendered)?;
    Ok(())
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}
