use async_trait::async_trait;
use rustc_hash::FxHashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::installation::{InstallationLog, LogAction, NewInstallation, PvInstallation};
use crate::value::{NewReport, Sample};

/// Interval-end semantics of a range fetch. The interval start is always
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    Inclusive,
    Exclusive,
}

/// Infrastructure failure of the sample store. Never used for deterministic
/// query errors; callers propagate it uninterpreted.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sample store unavailable: {0}")]
    Unavailable(String),
}

/// Durable time series of samples, keyed by installation id and timestamp.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// All samples of one installation with `start <= timestamp < end`
    /// (or `<= end`, per `end_bound`), ordered by timestamp ascending.
    async fn fetch_samples(
        &self,
        installation_id: u64,
        start: OffsetDateTime,
        end: OffsetDateTime,
        end_bound: RangeEnd,
    ) -> Result<Vec<Sample>, StoreError>;

    async fn installation_exists(&self, installation_id: u64) -> Result<bool, StoreError>;
}

/// In-process store backing the service and the tests. Samples are kept
/// sorted by timestamp per installation, so range fetches reduce to two
/// binary searches.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_installation_id: u64,
    next_log_id: u64,
    installations: FxHashMap<u64, PvInstallation>,
    samples: FxHashMap<u64, Vec<Sample>>,
    logs: Vec<InstallationLog>,
}

impl Inner {
    fn push_log(
        &mut self,
        installation_id: u64,
        action: LogAction,
        previous_value: String,
        next_value: String,
        timestamp: OffsetDateTime,
    ) {
        self.next_log_id += 1;
        self.logs.push(InstallationLog {
            id: self.next_log_id,
            timestamp,
            action,
            previous_value,
            next_value,
            installation_id,
        });
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an installation, assigns it the next sequential id and
    /// records a `created` audit entry.
    pub async fn create_installation(
        &self,
        new: NewInstallation,
        now: OffsetDateTime,
    ) -> PvInstallation {
        let mut inner = self.inner.write().await;
        inner.next_installation_id += 1;
        let id = inner.next_installation_id;
        let installation = PvInstallation {
            id,
            longitude: new.longitude,
            latitude: new.latitude,
            address: new.address,
            owner_name: new.owner_name,
            is_active: true,
            comments: new.comments,
        };
        let next_value = installation.to_string();
        inner.installations.insert(id, installation.clone());
        inner.push_log(id, LogAction::Created, String::new(), next_value, now);
        installation
    }

    /// Marks an installation inactive and records an `updated` audit entry
    /// carrying the previous and next activation state. `None` when the id
    /// is unknown.
    pub async fn deactivate(&self, id: u64, now: OffsetDateTime) -> Option<PvInstallation> {
        let mut inner = self.inner.write().await;
        let installation = inner.installations.get_mut(&id)?;
        let previous_value = installation.is_active.to_string();
        installation.is_active = false;
        let updated = installation.clone();
        inner.push_log(id, LogAction::Updated, previous_value, false.to_string(), now);
        Some(updated)
    }

    /// Appends one production report as a sample. `None` when the
    /// installation id is unknown.
    pub async fn append_report(
        &self,
        installation_id: u64,
        report: NewReport,
        timestamp: OffsetDateTime,
    ) -> Option<Sample> {
        let mut inner = self.inner.write().await;
        if !inner.installations.contains_key(&installation_id) {
            return None;
        }
        let sample = Sample {
            timestamp,
            produced_wattage: report.produced_wattage,
            household_wattage: report.household_wattage,
            battery_wattage: report.battery_wattage,
            grid_wattage: report.grid_wattage,
            installation_id,
        };
        let samples = inner.samples.entry(installation_id).or_default();
        let at = samples.partition_point(|s| s.timestamp <= timestamp);
        samples.insert(at, sample);
        Some(sample)
    }

    pub async fn installation(&self, id: u64) -> Option<PvInstallation> {
        self.inner.read().await.installations.get(&id).cloned()
    }

    /// Audit entries of one installation, oldest first.
    pub async fn logs(&self, installation_id: u64) -> Vec<InstallationLog> {
        self.inner
            .read()
            .await
            .logs
            .iter()
            .filter(|log| log.installation_id == installation_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SampleStore for MemoryStore {
    async fn fetch_samples(
        &self,
        installation_id: u64,
        start: OffsetDateTime,
        end: OffsetDateTime,
        end_bound: RangeEnd,
    ) -> Result<Vec<Sample>, StoreError> {
        let inner = self.inner.read().await;
        let Some(samples) = inner.samples.get(&installation_id) else {
            return Ok(Vec::new());
        };
        let lo = samples.partition_point(|s| s.timestamp < start);
        let hi = match end_bound {
            RangeEnd::Inclusive => samples.partition_point(|s| s.timestamp <= end),
            RangeEnd::Exclusive => samples.partition_point(|s| s.timestamp < end),
        };
        // `hi < lo` happens when the interval is empty (end before start).
        Ok(samples.get(lo..hi).map_or_else(Vec::new, <[Sample]>::to_vec))
    }

    async fn installation_exists(&self, installation_id: u64) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .installations
            .contains_key(&installation_id))
    }
}
