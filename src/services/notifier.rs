// src/services/notifier.rs

//! Email notification service.
//!
//! Each receiver gets a separate message over a separate authenticated
//! STARTTLS session, with only that receiver as recipient.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error, info};

use crate::error::{AppError, Result};
use crate::models::{EmailConfig, ProcessingDates, SmtpConfig};
use crate::utils::redact;

/// Subject line of every notification.
pub const SUBJECT: &str = "PERM Processing Times Update";

/// A rendered message addressed to one receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers a single message.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, credentials: &EmailConfig, mail: &OutgoingMail) -> Result<()>;
}

/// Mailer backed by an SMTP relay with STARTTLS and login.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_message(mail: &OutgoingMail) -> Result<Message> {
        let from: Mailbox = mail
            .from
            .parse()
            .map_err(|e| AppError::send(&mail.to, format!("invalid sender address: {e}")))?;
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| AppError::send(&mail.to, format!("invalid receiver address: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| AppError::send(&mail.to, e))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, credentials: &EmailConfig, mail: &OutgoingMail) -> Result<()> {
        let message = Self::build_message(mail)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(|e| AppError::send(&mail.to, e))?
            .port(self.config.port)
            .credentials(Credentials::new(
                credentials.sender_email.clone(),
                credentials.sender_password.clone(),
            ))
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| AppError::send(&mail.to, e))?;
        Ok(())
    }
}

/// Outcome of notifying the whole distribution list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Receivers that accepted the message, in send order
    pub sent: Vec<String>,
    /// Receivers that failed, with the error text
    pub failed: Vec<(String, String)>,
}

impl NotifyReport {
    /// True when at least one message went out and none failed.
    pub fn is_success(&self) -> bool {
        !self.sent.is_empty() && self.failed.is_empty()
    }
}

/// Sends the change notification to every configured receiver.
pub struct Notifier {
    mailer: Box<dyn Mailer>,
}

impl Notifier {
    pub fn new(mailer: Box<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Notifier that talks to the configured SMTP relay.
    pub fn smtp(config: &SmtpConfig) -> Self {
        Self::new(Box::new(SmtpMailer::new(config.clone())))
    }

    /// Plain-text body announcing the new dates.
    pub fn body(dates: &ProcessingDates) -> String {
        format!(
            "PERM Processing Times have been updated.\n\nLast Update: {}\nPriority Date for Analyst Review: {}",
            dates.update_date, dates.priority_date
        )
    }

    /// Render the message for one receiver.
    pub fn compose(dates: &ProcessingDates, sender: &str, receiver: &str) -> OutgoingMail {
        OutgoingMail {
            from: sender.to_string(),
            to: receiver.to_string(),
            subject: SUBJECT.to_string(),
            body: Self::body(dates),
        }
    }

    /// Send to every receiver in order.
    ///
    /// A failed receiver is recorded and the loop moves on to the next.
    pub async fn notify(&self, dates: &ProcessingDates, config: &EmailConfig) -> NotifyReport {
        debug!(
            "sender_email: {}, sender_password: {}, receiver_emails: {:?}",
            config.sender_email,
            redact(&config.sender_password),
            config.receiver_emails
        );

        let mut report = NotifyReport::default();
        for receiver in &config.receiver_emails {
            debug!("Sending email to \"{}\"...", receiver);
            let mail = Self::compose(dates, &config.sender_email, receiver);

            match self.mailer.send(config, &mail).await {
                Ok(()) => {
                    info!("Email sent successfully to \"{}\".", receiver);
                    report.sent.push(receiver.clone());
                }
                Err(e) => {
                    error!("Error sending email: {}", e);
                    report.failed.push((receiver.clone(), e.to_string()));
                }
            }
        }
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mailer that records messages and fails for chosen receivers.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingMailer {
        pub sent: Arc<Mutex<Vec<OutgoingMail>>>,
        pub reject: Vec<String>,
    }

    impl RecordingMailer {
        pub fn messages(&self) -> Vec<OutgoingMail> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, _credentials: &EmailConfig, mail: &OutgoingMail) -> Result<()> {
            if self.reject.contains(&mail.to) {
                return Err(AppError::send(&mail.to, "550 mailbox unavailable"));
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    fn email_config(receivers: &[&str]) -> EmailConfig {
        EmailConfig {
            sender_email: "watcher@example.com".into(),
            sender_password: "app-password".into(),
            receiver_emails: receivers.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn dates() -> ProcessingDates {
        ProcessingDates::new("01/05/2024", "March 2023")
    }

    #[test]
    fn test_message_template() {
        let mail = Notifier::compose(&dates(), "watcher@example.com", "a@x.com");
        assert_eq!(mail.subject, "PERM Processing Times Update");
        assert_eq!(mail.from, "watcher@example.com");
        assert_eq!(mail.to, "a@x.com");
        assert_eq!(
            mail.body,
            "PERM Processing Times have been updated.\n\nLast Update: 01/05/2024\nPriority Date for Analyst Review: March 2023"
        );
    }

    #[tokio::test]
    async fn test_every_receiver_gets_a_message() {
        let mailer = RecordingMailer::default();
        let notifier = Notifier::new(Box::new(mailer.clone()));

        let report = notifier
            .notify(&dates(), &email_config(&["a@x.com", "b@x.com"]))
            .await;

        assert!(report.is_success());
        assert_eq!(report.sent, vec!["a@x.com", "b@x.com"]);

        let messages = mailer.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].to, "a@x.com");
        assert_eq!(messages[1].to, "b@x.com");
        assert_eq!(messages[0].body, messages[1].body);
    }

    #[tokio::test]
    async fn test_failed_receiver_does_not_stop_the_rest() {
        let mailer = RecordingMailer {
            reject: vec!["a@x.com".to_string()],
            ..RecordingMailer::default()
        };
        let notifier = Notifier::new(Box::new(mailer.clone()));

        let report = notifier
            .notify(&dates(), &email_config(&["a@x.com", "b@x.com"]))
            .await;

        assert!(!report.is_success());
        assert_eq!(report.sent, vec!["b@x.com"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "a@x.com");
        assert_eq!(mailer.messages().len(), 1);
    }

    #[test]
    fn test_smtp_message_rejects_bad_address() {
        let mail = Notifier::compose(&dates(), "watcher@example.com", "not an address");
        let err = SmtpMailer::build_message(&mail).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let mail = Notifier::compose(&dates(), "watcher@example.com", "a@x.com");
        assert!(SmtpMailer::build_message(&mail).is_ok());
    }

    #[test]
    fn test_empty_report_is_not_success() {
        assert!(!NotifyReport::default().is_success());
    }
}
