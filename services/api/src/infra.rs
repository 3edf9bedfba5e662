use chrono::{NaiveDate, NaiveDateTime};
use metrics_exporter_prometheus::PrometheusHandle;
use school_admissions::workflows::admissions::{
    AdmissionsConfig, AdmissionsService, InMemoryAdmissionsStore, InMemoryNotificationFeeds,
};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type InMemoryAdmissions =
    AdmissionsService<InMemoryAdmissionsStore, InMemoryNotificationFeeds>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Service over fresh in-memory collections, returned with its feeds so callers can read
/// what screening announcements were posted.
pub(crate) fn in_memory_admissions(
    config: AdmissionsConfig,
) -> (Arc<InMemoryAdmissions>, Arc<InMemoryNotificationFeeds>) {
    let store = Arc::new(InMemoryAdmissionsStore::new());
    let feeds = Arc::new(InMemoryNotificationFeeds::new());
    let service = Arc::new(AdmissionsService::new(store, Arc::clone(&feeds), config));
    (service, feeds)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M"))
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DDTHH:MM ({err})"))
}
