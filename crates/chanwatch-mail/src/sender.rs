//! Report delivery over SMTP, or to the log.

use crate::error::{NotifyError, Result};
use crate::report::Report;
use crate::Notifier;
use async_trait::async_trait;
use chanwatch_core::NotificationConfig;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use sha2::{Digest, Sha256};

/// Sends reports through an SMTP relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from.to_string())
            .field("recipients", &self.to.len())
            .finish_non_exhaustive()
    }
}

impl SmtpNotifier {
    /// Build a notifier from the `[notifications]` section.
    ///
    /// Addresses are parsed up front; no connection is made until the
    /// first report is sent.
    pub fn from_config(config: &NotificationConfig) -> Result<Self> {
        if config.smtp_host.trim().is_empty() {
            return Err(NotifyError::NotConfigured(
                "notifications.smtp_host is empty".to_string(),
            ));
        }
        if config.to.is_empty() {
            return Err(NotifyError::NotConfigured(
                "notifications.to has no recipients".to_string(),
            ));
        }

        let from = parse_mailbox(&config.from)?;
        let to = config
            .to
            .iter()
            .map(|address| parse_mailbox(address))
            .collect::<Result<Vec<_>>>()?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(config.smtp_host.trim())
            .map_err(|e| NotifyError::Transport(format!("SMTP relay error: {e}")))?
            .port(config.smtp_port);

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone().unwrap_or_default(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    fn build_message(&self, report: &Report) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(&report.subject);
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }

        builder
            .body(report.body.clone())
            .map_err(|e| NotifyError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, report: &Report) -> Result<()> {
        let message = self.build_message(report)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        tracing::info!(
            recipients = self.to.len(),
            body_sha256 = %body_hash(&report.body),
            "Sent scan report: {}",
            report.subject
        );
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "smtp"
    }
}

/// Writes reports to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, report: &Report) -> Result<()> {
        tracing::info!("{}\n{}", report.subject, report.body);
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "log"
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address.trim().parse().map_err(|e: lettre::address::AddressError| {
        NotifyError::Address {
            address: address.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Returns SHA-256 hex of a report body, for correlating deliveries in logs.
#[must_use]
pub fn body_hash(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> NotificationConfig {
        NotificationConfig {
            enabled: true,
            from: "Chanwatch <chanwatch@example.com>".to_string(),
            to: vec!["ops@example.com".to_string(), "merch@example.com".to_string()],
            smtp_host: "smtp.example.com".to_string(),
            smtp_username: "chanwatch".to_string(),
            smtp_password: Some("hunter2".to_string()),
            ..NotificationConfig::default()
        }
    }

    fn report() -> Report {
        Report {
            subject: "[chanwatch] channel-audit: no violations".to_string(),
            body: "checked 3 products, no violations.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_from_config_builds_without_connecting() {
        let notifier = SmtpNotifier::from_config(&config()).expect("valid config");
        assert_eq!(notifier.to.len(), 2);
        assert_eq!(notifier.channel(), "smtp");
    }

    #[tokio::test]
    async fn test_message_has_all_recipients() {
        let notifier = SmtpNotifier::from_config(&config()).expect("valid config");
        let message = notifier.build_message(&report()).expect("build message");

        let envelope = message.envelope();
        assert_eq!(envelope.to().len(), 2);
        assert_eq!(
            envelope.from().map(ToString::to_string).as_deref(),
            Some("chanwatch@example.com")
        );

        let raw = String::from_utf8(message.formatted()).expect("utf-8 message");
        assert!(raw.contains("checked 3 products, no violations."));
    }

    #[tokio::test]
    async fn test_bad_recipient_rejected() {
        let mut bad = config();
        bad.to.push("not an address".to_string());
        let err = SmtpNotifier::from_config(&bad).expect_err("bad address");
        assert!(matches!(err, NotifyError::Address { ref address, .. } if address == "not an address"));
    }

    #[tokio::test]
    async fn test_missing_host_or_recipients() {
        let mut no_host = config();
        no_host.smtp_host = String::new();
        assert!(matches!(
            SmtpNotifier::from_config(&no_host),
            Err(NotifyError::NotConfigured(_))
        ));

        let mut no_recipients = config();
        no_recipients.to.clear();
        assert!(matches!(
            SmtpNotifier::from_config(&no_recipients),
            Err(NotifyError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_debug_hides_credentials() {
        let notifier = SmtpNotifier::from_config(&config()).expect("valid config");
        assert!(!format!("{notifier:?}").contains("hunter2"));
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        LogNotifier.notify(&report()).await.expect("log delivery");
        assert_eq!(LogNotifier.channel(), "log");
    }

    #[test]
    fn test_body_hash_is_deterministic() {
        let h1 = body_hash("hello");
        let h2 = body_hash("hello");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, body_hash("world"));
    }
}
