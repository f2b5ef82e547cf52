//! Local filesystem snapshot store.
//!
//! Snapshots are flat files named `webpage_content_<YYYYMMDDHHMMSS>.txt`,
//! stamped in UTC so the names never repeat or run backwards across a
//! daylight-saving change. Ordering is decided by the parsed timestamp, not
//! by the file name string, and names that do not carry a valid timestamp are
//! ignored.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::SnapshotStorage;

const FILE_PREFIX: &str = "webpage_content_";
const FILE_EXTENSION: &str = ".txt";
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// File name for a snapshot taken at `taken_at`.
    pub fn file_name(taken_at: NaiveDateTime) -> String {
        format!(
            "{}{}{}",
            FILE_PREFIX,
            taken_at.format(TIMESTAMP_FORMAT),
            FILE_EXTENSION
        )
    }

    /// Timestamp embedded in the name of a snapshot taken at `at` (UTC).
    pub fn snapshot_time<Tz: TimeZone>(at: &DateTime<Tz>) -> NaiveDateTime {
        at.naive_utc()
    }

    /// Parse the timestamp out of a snapshot file name.
    pub fn parse_file_name(name: &str) -> Option<NaiveDateTime> {
        let stamp = name
            .strip_prefix(FILE_PREFIX)?
            .strip_suffix(FILE_EXTENSION)?;
        if stamp.len() != 14 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
    }

    /// Write a snapshot stamped with an explicit time.
    pub async fn save_at(&self, markup: &str, taken_at: NaiveDateTime) -> Result<PathBuf> {
        let path = self.root_dir.join(Self::file_name(taken_at));
        let write_err = |source| AppError::StoreWrite {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.root_dir)
            .await
            .map_err(write_err)?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(write_err)?;
        file.write_all(markup.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;

        Ok(path)
    }

    /// List all snapshots with a parsable timestamp, unordered.
    pub async fn list(&self) -> Result<Vec<(NaiveDateTime, PathBuf)>> {
        let read_err = |source| AppError::StoreRead {
            path: self.root_dir.clone(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(&self.root_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_err(e)),
        };

        let mut snapshots = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            match Self::parse_file_name(name) {
                Some(taken_at) => snapshots.push((taken_at, entry.path())),
                None if name.starts_with(FILE_PREFIX) => {
                    debug!("Ignoring {name}: no valid timestamp in file name");
                }
                None => {}
            }
        }
        Ok(snapshots)
    }
}

#[async_trait]
impl SnapshotStorage for LocalStorage {
    async fn save(&self, markup: &str) -> Result<PathBuf> {
        let path = self.save_at(markup, Self::snapshot_time(&Utc::now())).await?;
        debug!("Content has been dumped to {}", path.display());
        Ok(path)
    }

    async fn load_latest(&self) -> Result<Option<Snapshot>> {
        let latest = self
            .list()
            .await?
            .into_iter()
            .max_by_key(|(taken_at, _)| *taken_at);

        let Some((taken_at, path)) = latest else {
            info!(
                "No {FILE_PREFIX}*{FILE_EXTENSION} files found in {}.",
                self.root_dir.display()
            );
            return Ok(None);
        };

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| AppError::StoreRead {
                path: path.clone(),
                source,
            })?;
        debug!("Content read from {}", path.display());

        Ok(Some(Snapshot {
            path,
            taken_at,
            content,
        }))
    }
}
