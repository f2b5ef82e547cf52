//! Pipeline entry points for watcher operations.
//!
//! - `run_check`: Fetch, compare, notify and persist
//! - `run_show`: Report the dates in the latest snapshot
//! - `run_validate`: Validate configuration and credentials

pub mod check;
pub mod diff;
pub mod show;
pub mod validate;

pub use check::{RunOutcome, Watcher, run_check};
pub use diff::{DateDiff, has_changed};
pub use show::run_show;
pub use validate::run_validate;
