//! Snapshot data structure.

use std::path::PathBuf;

use chrono::NaiveDateTime;

/// A previously fetched copy of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// File the markup was read from
    pub path: PathBuf,

    /// Timestamp embedded in the file name
    pub taken_at: NaiveDateTime,

    /// Raw markup, verbatim
    pub content: String,
}
