// src/pipeline/check.rs

//! The watch run: fetch, compare, notify, persist.
//!
//! ```text
//! FETCH → EXTRACT_CURRENT → LOAD_PREVIOUS → EXTRACT_PREVIOUS → COMPARE
//!       → (NOTIFY if changed) → PERSIST → EXIT
//! ```
//!
//! Failing to fetch or read the live page ends the run before anything is
//! persisted. A missing or unreadable baseline only means "changed". A failed
//! notification is reported through the exit code but the snapshot is still
//! written.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::error::Result;
use crate::models::{Config, EmailConfig, ProcessingDates};
use crate::services::{Extractor, HttpFetcher, Notifier, PageSource};
use crate::storage::{LocalStorage, SnapshotStorage};

use super::diff::DateDiff;

/// How a run that got as far as persisting ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Update date unchanged; nobody was notified
    Unchanged,
    /// Update date changed and every receiver was notified
    Notified,
    /// Update date changed but notification failed for some receiver
    NotifyFailed,
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Unchanged | Self::Notified => 0,
            Self::NotifyFailed => 2,
        }
    }
}

/// Wires the fetcher, extractor, store and notifier together.
pub struct Watcher {
    source: Box<dyn PageSource>,
    extractor: Extractor,
    storage: Box<dyn SnapshotStorage>,
    notifier: Notifier,
    credentials_path: PathBuf,
}

impl Watcher {
    pub fn new(
        source: Box<dyn PageSource>,
        extractor: Extractor,
        storage: Box<dyn SnapshotStorage>,
        notifier: Notifier,
        credentials_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            extractor,
            storage,
            notifier,
            credentials_path: credentials_path.into(),
        }
    }

    /// Build the production watcher: HTTP fetcher, local snapshots, SMTP.
    ///
    /// Email credentials are re-read from `config_path` when a notification
    /// is due.
    pub fn from_config(config: &Config, config_path: &Path) -> Result<Self> {
        Ok(Self::new(
            Box::new(HttpFetcher::new(&config.watcher)?),
            Extractor::from_config(&config.watcher)?,
            Box::new(LocalStorage::new(&config.watcher.snapshot_dir)),
            Notifier::smtp(&config.smtp),
            config_path,
        ))
    }

    /// Execute one run.
    pub async fn run(&self) -> Result<RunOutcome> {
        info!("Checking {}", self.source.url());

        // FETCH + EXTRACT_CURRENT
        let content = self.source.fetch().await.inspect_err(|_| {
            error!("Failed to get processing dates from the webpage.");
        })?;
        let current = self.extractor.extract(&content).inspect_err(|e| {
            error!("An unexpected error occurred while getting processing dates: {e}");
            error!("Failed to get processing dates from the webpage.");
        })?;
        debug!("Obtained webpage_dates as {{{}}}", current);

        // LOAD_PREVIOUS + EXTRACT_PREVIOUS
        let snapshot = self.storage.load_latest().await?;
        let previous = self
            .extractor
            .extract_optional(snapshot.as_ref().map(|s| s.content.as_str()));
        match &previous {
            Some(dates) => debug!("Obtained local_dates as {{{}}}", dates),
            None => info!("Processing dates not obtained from local file."),
        }

        // COMPARE + NOTIFY
        let diff = DateDiff::new(&current, previous.as_ref());
        let outcome = if diff.has_changed() {
            info!(
                "Processing dates have been updated as of \"{}\".",
                current.update_date
            );
            info!(
                "The latest Priority Date for the Analyst Review process is \"{}\" as of \"{}\" (was \"{}\" as of \"{}\").",
                current.priority_date,
                current.update_date,
                diff.previous_priority_date(),
                diff.previous_update_date()
            );
            self.notify(&current).await
        } else {
            info!(
                "Processing dates haven't been updated since \"{}\".",
                current.update_date
            );
            info!(
                "The latest Priority Date for the Analyst Review process is \"{}\" as of \"{}\".",
                current.priority_date, current.update_date
            );
            RunOutcome::Unchanged
        };

        // PERSIST
        self.storage.save(&content).await?;

        Ok(outcome)
    }

    async fn notify(&self, dates: &ProcessingDates) -> RunOutcome {
        let config = match EmailConfig::load(&self.credentials_path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load email configurations: {e}");
                return RunOutcome::NotifyFailed;
            }
        };

        let report = self.notifier.notify(dates, &config).await;
        if report.is_success() {
            RunOutcome::Notified
        } else {
            error!(
                "Notification failed for {} of {} receivers.",
                report.failed.len(),
                config.receiver_emails.len()
            );
            RunOutcome::NotifyFailed
        }
    }
}

/// Run one check with the production wiring.
pub async fn run_check(config: &Config, config_path: &Path) -> Result<RunOutcome> {
    Watcher::from_config(config, config_path)?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::notifier::tests::RecordingMailer;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const CREDENTIALS: &str = r#"
        [EmailCredentials]
        sender_email = "watcher@example.com"
        sender_password = "app-password"
        receiver_emails = "a@x.com, b@x.com"
    "#;

    fn page(update_date: &str, priority_date: &str) -> String {
        format!(
            r#"<html><body><table>
              <caption><strong>PERM Processing Times</strong> <em>(as of {update_date})</em></caption>
              <tr><td>Analyst Review</td><td>{priority_date}</td></tr>
            </table></body></html>"#
        )
    }

    enum Stub {
        Page(String),
        Status(u16),
    }

    #[async_trait]
    impl PageSource for Stub {
        fn url(&self) -> &str {
            "https://flag.dol.gov/processingtimes"
        }

        async fn fetch(&self) -> Result<String> {
            match self {
                Stub::Page(markup) => Ok(markup.clone()),
                Stub::Status(status) => Err(AppError::FetchStatus {
                    url: self.url().to_string(),
                    status: *status,
                }),
            }
        }
    }

    struct Fixture {
        dir: TempDir,
        mailer: RecordingMailer,
    }

    impl Fixture {
        fn new(credentials: &str) -> Self {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join("config.toml"), credentials).unwrap();
            Self {
                dir,
                mailer: RecordingMailer::default(),
            }
        }

        fn storage(&self) -> LocalStorage {
            LocalStorage::new(self.dir.path().join("snapshots"))
        }

        fn watcher(&self, source: Stub) -> Watcher {
            Watcher::new(
                Box::new(source),
                Extractor::new("PERM Processing Times", "Analyst Review").unwrap(),
                Box::new(self.storage()),
                Notifier::new(Box::new(self.mailer.clone())),
                self.dir.path().join("config.toml"),
            )
        }

        async fn seed(&self, markup: &str) {
            let taken_at = NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap();
            self.storage().save_at(markup, taken_at).await.unwrap();
        }

        async fn snapshots(&self) -> Vec<String> {
            let mut found = Vec::new();
            for (_, path) in self.storage().list().await.unwrap() {
                found.push(std::fs::read_to_string(path).unwrap());
            }
            found
        }
    }

    #[tokio::test]
    async fn test_first_run_notifies_and_persists() {
        let fx = Fixture::new(CREDENTIALS);
        let markup = page("01/05/2024", "March 2023");

        let outcome = fx.watcher(Stub::Page(markup.clone())).run().await.unwrap();

        assert_eq!(outcome, RunOutcome::Notified);
        assert_eq!(outcome.exit_code(), 0);
        let messages = fx.mailer.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].body.contains("Last Update: 01/05/2024"));
        assert_eq!(fx.snapshots().await, vec![markup]);
    }

    #[tokio::test]
    async fn test_identical_page_is_unchanged_but_still_persisted() {
        let fx = Fixture::new(CREDENTIALS);
        let markup = page("01/05/2024", "March 2023");
        fx.seed(&markup).await;

        let outcome = fx.watcher(Stub::Page(markup.clone())).run().await.unwrap();

        assert_eq!(outcome, RunOutcome::Unchanged);
        assert!(fx.mailer.messages().is_empty());
        assert_eq!(fx.snapshots().await, vec![markup.clone(), markup]);
    }

    #[tokio::test]
    async fn test_priority_date_only_change_is_not_announced() {
        let fx = Fixture::new(CREDENTIALS);
        fx.seed(&page("01/05/2024", "March 2023")).await;

        let outcome = fx
            .watcher(Stub::Page(page("01/05/2024", "April 2023")))
            .run()
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Unchanged);
        assert!(fx.mailer.messages().is_empty());
        assert_eq!(fx.snapshots().await.len(), 2);
    }

    #[tokio::test]
    async fn test_new_update_date_is_announced() {
        let fx = Fixture::new(CREDENTIALS);
        fx.seed(&page("01/05/2024", "March 2023")).await;

        let outcome = fx
            .watcher(Stub::Page(page("02/09/2024", "April 2023")))
            .run()
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Notified);
        let messages = fx.mailer.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].body.contains("Priority Date for Analyst Review: April 2023"));
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_before_persistence() {
        let fx = Fixture::new(CREDENTIALS);

        let err = fx.watcher(Stub::Status(503)).run().await.unwrap_err();

        assert!(matches!(err, AppError::FetchStatus { status: 503, .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(fx.mailer.messages().is_empty());
        assert!(fx.snapshots().await.is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_page_aborts_before_persistence() {
        let fx = Fixture::new(CREDENTIALS);

        let err = fx
            .watcher(Stub::Page("<html>maintenance</html>".to_string()))
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert!(fx.snapshots().await.is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_baseline_counts_as_changed() {
        let fx = Fixture::new(CREDENTIALS);
        fx.seed("<html>maintenance</html>").await;

        let outcome = fx
            .watcher(Stub::Page(page("01/05/2024", "March 2023")))
            .run()
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Notified);
        assert_eq!(fx.snapshots().await.len(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_baseline_aborts_before_persistence() {
        let fx = Fixture::new(CREDENTIALS);
        let dir = fx.dir.path().join("snapshots");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("webpage_content_20240101000000.txt"), [0xff, 0xfe]).unwrap();

        let err = fx
            .watcher(Stub::Page(page("01/05/2024", "March 2023")))
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StoreRead { .. }));
        assert_eq!(err.exit_code(), 4);
        assert!(fx.mailer.messages().is_empty());
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_notification_failure_still_persists() {
        let mut fx = Fixture::new(CREDENTIALS);
        fx.mailer.reject = vec!["a@x.com".to_string()];

        let outcome = fx
            .watcher(Stub::Page(page("01/05/2024", "March 2023")))
            .run()
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::NotifyFailed);
        assert_eq!(outcome.exit_code(), 2);
        assert_eq!(fx.mailer.messages().len(), 1);
        assert_eq!(fx.snapshots().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_a_notification_failure() {
        let fx = Fixture::new("[watcher]\nsnapshot_dir = \".\"\n");

        let outcome = fx
            .watcher(Stub::Page(page("01/05/2024", "March 2023")))
            .run()
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::NotifyFailed);
        assert!(fx.mailer.messages().is_empty());
        assert_eq!(fx.snapshots().await.len(), 1);
    }
}
