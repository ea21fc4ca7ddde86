use std::{fs, path::Path, sync::Arc};

use color_eyre::eyre::{eyre, Result, WrapErr};
use itertools::Itertools;
use pvseries::installation::NewInstallation;
use pvseries::store::MemoryStore;
use pvseries::value::NewReport;
use serde::Deserialize;
use time::OffsetDateTime;

pub mod api;
pub mod http;

/// One seed file: an installation and its recorded production reports.
#[derive(Debug, Deserialize)]
struct SeedFile {
    installation: NewInstallation,
    #[serde(default)]
    reports: Vec<SeedReport>,
}

#[derive(Debug, Deserialize)]
struct SeedReport {
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    #[serde(flatten)]
    report: NewReport,
}

/// Creates the in-memory store, optionally seeded from a directory of JSON
/// sample files.
pub async fn create_store(samples_dir: Option<impl AsRef<Path>>) -> Result<Arc<MemoryStore>> {
    let store = Arc::new(MemoryStore::new());
    if let Some(dir) = samples_dir {
        let dir = dir.as_ref();
        let paths = fs::read_dir(dir).wrap_err_with(|| format!("{}", dir.display()))?;
        for dentry in paths {
            seed_from_file(&store, dentry?.path()).await?;
        }
    }
    Ok(store)
}

async fn seed_from_file(store: &MemoryStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.extension().map_or(true, |ext| ext != "json") {
        return Ok(());
    }
    let data = fs::read(path).wrap_err_with(|| format!("{}", path.display()))?;
    let seed: SeedFile = serde_json::from_slice(&data)
        .map_err(|e| eyre!("failed to parse JSON file {}: {e}", path.display()))?;

    let installation = store
        .create_installation(seed.installation, OffsetDateTime::now_utc())
        .await;
    let mut nr_reports = 0usize;
    for entry in seed.reports.into_iter().sorted_by_key(|r| r.timestamp) {
        if store
            .append_report(installation.id, entry.report, entry.timestamp)
            .await
            .is_some()
        {
            nr_reports += 1;
        }
    }
    tracing::info!(
        id = installation.id,
        nr_reports,
        path = %path.display(),
        "seeded installation"
    );
    Ok(())
}
