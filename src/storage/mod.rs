//! Snapshot persistence.
//!
//! Every successful run appends one file holding the raw markup it fetched.
//! The newest file is the baseline for the next run's comparison.
//!
//! ## Directory Structure
//!
//! ```text
//! {snapshot_dir}/
//! ├── webpage_content_20240105093000.txt
//! ├── webpage_content_20240112093000.txt
//! └── webpage_content_20240119093000.txt   # latest
//! ```

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Snapshot;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Write markup to a new snapshot stamped with the current time.
    ///
    /// Existing snapshots are never overwritten.
    async fn save(&self, markup: &str) -> Result<PathBuf>;

    /// Load the snapshot with the greatest embedded timestamp, if any.
    async fn load_latest(&self) -> Result<Option<Snapshot>>;
}
