//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::utils::redact;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Page fetching and extraction settings
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Mail relay settings
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Log sinks
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    ///
    /// A file that exists but does not parse is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path).map_err(|e| AppError::config(format!("{}: {}", path.display(), e)))
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.watcher.url)?;
        if self.watcher.user_agent.trim().is_empty() {
            return Err(AppError::config("watcher.user_agent is empty"));
        }
        if self.watcher.timeout_secs == 0 {
            return Err(AppError::config("watcher.timeout_secs must be > 0"));
        }
        if self.watcher.caption_label.trim().is_empty() || self.watcher.review_label.trim().is_empty()
        {
            return Err(AppError::config("watcher labels must not be empty"));
        }
        if self.smtp.host.trim().is_empty() {
            return Err(AppError::config("smtp.host is empty"));
        }
        if self.smtp.port == 0 {
            return Err(AppError::config("smtp.port must be > 0"));
        }
        if self.smtp.timeout_secs == 0 {
            return Err(AppError::config("smtp.timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// Page fetching and extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Processing-times page
    #[serde(default = "defaults::url")]
    pub url: String,

    /// User-Agent header for the fetch
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Directory holding `webpage_content_*.txt` snapshots
    #[serde(default = "defaults::snapshot_dir")]
    pub snapshot_dir: PathBuf,

    /// Text of the `<strong>` inside the table caption
    #[serde(default = "defaults::caption_label")]
    pub caption_label: String,

    /// Text of the cell preceding the priority date
    #[serde(default = "defaults::review_label")]
    pub review_label: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            snapshot_dir: defaults::snapshot_dir(),
            caption_label: defaults::caption_label(),
            review_label: defaults::review_label(),
        }
    }
}

/// Mail relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "defaults::smtp_host")]
    pub host: String,

    #[serde(default = "defaults::smtp_port")]
    pub port: u16,

    /// Per-session timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: defaults::smtp_host(),
            port: defaults::smtp_port(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Log sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Console level; the file sink always records debug
    #[serde(default = "defaults::log_level")]
    pub level: String,

    /// Append-mode log file. Empty disables the file sink.
    #[serde(default = "defaults::log_file")]
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            file: defaults::log_file(),
        }
    }
}

/// Sender credentials and distribution list.
///
/// Read from the `[EmailCredentials]` section each time a notification is
/// about to go out.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub sender_email: String,
    pub sender_password: String,
    pub receiver_emails: Vec<String>,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("sender_email", &self.sender_email)
            .field("sender_password", &redact(&self.sender_password))
            .field("receiver_emails", &self.receiver_emails)
            .finish()
    }
}

#[derive(Deserialize)]
struct CredentialsFile {
    #[serde(rename = "EmailCredentials")]
    credentials: Option<RawCredentials>,
}

#[derive(Deserialize)]
struct RawCredentials {
    sender_email: Option<String>,
    sender_password: Option<String>,
    receiver_emails: Option<ReceiverList>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReceiverList {
    Delimited(String),
    List(Vec<String>),
}

impl ReceiverList {
    fn into_vec(self) -> Vec<String> {
        let items = match self {
            Self::Delimited(s) => s.split(',').map(str::to_string).collect(),
            Self::List(list) => list,
        };
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl EmailConfig {
    /// Load the `[EmailCredentials]` section from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Failed to load email configuration from {path:?}: {e}"))
        })?;
        Self::from_toml(&content)
    }

    /// Parse the `[EmailCredentials]` section from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: CredentialsFile = toml::from_str(content)?;
        let raw = file
            .credentials
            .ok_or_else(|| AppError::config("missing [EmailCredentials] section"))?;

        let sender_email = raw
            .sender_email
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::config("EmailCredentials.sender_email is missing"))?;
        let sender_password = raw
            .sender_password
            .ok_or_else(|| AppError::config("EmailCredentials.sender_password is missing"))?;
        let receiver_emails = raw
            .receiver_emails
            .map(ReceiverList::into_vec)
            .unwrap_or_default();
        if receiver_emails.is_empty() {
            return Err(AppError::config("EmailCredentials.receiver_emails is empty"));
        }

        Ok(Self {
            sender_email: sender_email.trim().to_string(),
            sender_password,
            receiver_emails,
        })
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn url() -> String {
        "https://flag.dol.gov/processingtimes".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn snapshot_dir() -> PathBuf {
        PathBuf::from(".")
    }
    pub fn caption_label() -> String {
        "PERM Processing Times".into()
    }
    pub fn review_label() -> String {
        "Analyst Review".into()
    }

    pub fn smtp_host() -> String {
        "smtp.gmail.com".into()
    }
    pub fn smtp_port() -> u16 {
        587
    }

    pub fn log_level() -> String {
        "info".into()
    }
    pub fn log_file() -> String {
        "check_perm_processing_times.log".into()
    }
}
