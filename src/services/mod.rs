//! Service layer for the watcher.
//!
//! This module contains the business logic for:
//! - Page fetching (`HttpFetcher`)
//! - Date extraction (`Extractor`)
//! - Email notification (`Notifier`)

mod extractor;
mod fetcher;
pub mod notifier;

pub use extractor::Extractor;
pub use fetcher::{HttpFetcher, PageSource};
pub use notifier::{Mailer, Notifier, NotifyReport, OutgoingMail, SmtpMailer};
