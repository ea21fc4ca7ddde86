use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Number of one-minute slots in a full timeline page.
pub const PAGE_MINUTES: i64 = 60;

/// One power-flow reading of an installation. Immutable once stored; several
/// samples may fall within the same minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub produced_wattage: f32,
    pub household_wattage: f32,
    pub battery_wattage: f32,
    pub grid_wattage: f32,
    pub installation_id: u64,
}

/// The four wattage readings of a production report, before the store has
/// stamped them with a timestamp and an installation id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    pub produced_wattage: f32,
    pub household_wattage: f32,
    pub battery_wattage: f32,
    pub grid_wattage: f32,
}

/// Per-minute aggregate of zero or more samples. The all-zero default is
/// also the gap fill for minutes without samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub produced_wattage: f32,
    pub household_wattage: f32,
    pub battery_wattage: f32,
    pub grid_wattage: f32,
}

impl std::ops::AddAssign<&Sample> for Bucket {
    fn add_assign(&mut self, sample: &Sample) {
        self.produced_wattage += sample.produced_wattage;
        self.household_wattage += sample.household_wattage;
        self.battery_wattage += sample.battery_wattage;
        self.grid_wattage += sample.grid_wattage;
    }
}
