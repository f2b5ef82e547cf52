// src/pipeline/validate.rs

use std::path::Path;

use tracing::{error, info};

use crate::error::Result;
use crate::models::{Config, EmailConfig};
use crate::services::Extractor;
use crate::utils::redact;

/// Validate settings and the email credentials section.
pub fn run_validate(config: &Config, config_path: &Path) -> Result<()> {
    info!("Validating configuration {}...", config_path.display());

    let checked = config
        .validate()
        .and_then(|_| Extractor::from_config(&config.watcher).map(|_| ()))
        .and_then(|_| EmailConfig::load(config_path));

    match checked {
        Ok(email) => {
            info!("Config OK");
            info!("    url: {}", config.watcher.url);
            info!("    timeout: {}s", config.watcher.timeout_secs);
            info!("    snapshot_dir: {}", config.watcher.snapshot_dir.display());
            info!("    smtp: {}:{}", config.smtp.host, config.smtp.port);
            info!("    sender: {} ({})", email.sender_email, redact(&email.sender_password));
            info!("    receivers: {}", email.receiver_emails.join(", "));
            Ok(())
        }
        Err(e) => {
            error!("Config validation failed: {}", e);
            Err(e)
        }
    }
}
