// src/models/mod.rs

//! Domain models for the watcher.

mod config;
mod dates;
mod snapshot;

// Re-export all public types
pub use config::{Config, EmailConfig, LoggingConfig, SmtpConfig, WatcherConfig};
pub use dates::ProcessingDates;
pub use snapshot::Snapshot;
