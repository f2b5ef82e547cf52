// src/pipeline/show.rs

//! Report the dates held by the latest snapshot without touching the network.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::models::{Config, ProcessingDates};
use crate::services::Extractor;
use crate::storage::{LocalStorage, SnapshotStorage};

/// What the latest snapshot says.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SnapshotReport {
    pub path: PathBuf,
    pub taken_at: NaiveDateTime,
    /// `None` when the snapshot no longer parses
    pub dates: Option<ProcessingDates>,
}

/// Read the latest snapshot and extract its dates.
pub async fn latest_report(
    storage: &dyn SnapshotStorage,
    extractor: &Extractor,
) -> Result<Option<SnapshotReport>> {
    let Some(snapshot) = storage.load_latest().await? else {
        return Ok(None);
    };
    let dates = extractor.extract_optional(Some(&snapshot.content));
    Ok(Some(SnapshotReport {
        path: snapshot.path,
        taken_at: snapshot.taken_at,
        dates,
    }))
}

/// Print the latest snapshot's dates, as log lines or as JSON on stdout.
pub async fn run_show(config: &Config, json: bool) -> Result<()> {
    let storage = LocalStorage::new(&config.watcher.snapshot_dir);
    let extractor = Extractor::from_config(&config.watcher)?;
    let report = latest_report(&storage, &extractor).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match report {
        None => info!("No snapshot found yet."),
        Some(report) => {
            info!("Latest snapshot: {}", report.path.display());
            info!("Taken at: {}", report.taken_at);
            match report.dates {
                Some(dates) => {
                    info!("Last Update: {}", dates.update_date);
                    info!("Priority Date for Analyst Review: {}", dates.priority_date);
                }
                None => info!("Processing dates not obtained from local file."),
            }
        }
    }
    Ok(())
}
