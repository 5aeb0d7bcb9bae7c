//! Outbound email for decryption keys
//!
//! The uploader can ask the service to mail the key for a share to a
//! recipient. Delivery goes through SMTP with `lettre`; when no SMTP host is
//! configured every send fails with [`MailError::NotConfigured`].

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::SmtpConfig;

const SUBJECT: &str = "Your Sanchar decryption key";

/// Email delivery errors
#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),

    #[error("Email delivery is not configured")]
    NotConfigured,
}

/// A key to deliver
#[derive(Debug, Clone)]
pub struct KeyEmail {
    pub to: String,
    pub key: String,
    /// Download page for the share, when known
    pub share_url: Option<String>,
}

/// Sends decryption keys to recipients
#[async_trait]
pub trait KeyMailer: Send + Sync {
    async fn send_key(&self, email: &KeyEmail) -> Result<(), MailError>;
}

/// Build the mailer described by `config`
pub fn from_config(config: &SmtpConfig) -> Result<Arc<dyn KeyMailer>, MailError> {
    match config.host {
        Some(ref host) => Ok(Arc::new(SmtpMailer::new(host, config)?)),
        None => {
            info!("No SMTP host configured, key emails are disabled");
            Ok(Arc::new(DisabledMailer))
        }
    }
}

/// SMTP-backed mailer
pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from)
            .field("transport", &"<AsyncSmtpTransport>")
            .finish()
    }
}

impl SmtpMailer {
    /// Create a mailer relaying through `host`
    pub fn new(host: &str, config: &SmtpConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| MailError::InvalidAddress(format!("from address: {e}")))?;

        let builder = if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| MailError::Transport(format!("SMTP TLS relay error: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };

        let builder = builder.port(config.port);

        let builder = if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder.credentials(Credentials::new(user.clone(), pass.clone()))
        } else {
            builder
        };

        info!(host, port = config.port, tls = config.tls, "SMTP mailer initialized");
        Ok(Self {
            from,
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl KeyMailer for SmtpMailer {
    async fn send_key(&self, email: &KeyEmail) -> Result<(), MailError> {
        let message = build_message(&self.from, email)?;

        debug!(to = %email.to, "Sending key email");
        self.transport.send(message).await.map_err(|e| {
            error!(error = %e, "SMTP send failed");
            MailError::Transport(e.to_string())
        })?;

        info!(to = %email.to, "Key email sent");
        Ok(())
    }
}

/// Mailer used when SMTP is not configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMailer;

#[async_trait]
impl KeyMailer for DisabledMailer {
    async fn send_key(&self, _email: &KeyEmail) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }
}

fn build_message(from: &Mailbox, email: &KeyEmail) -> Result<Message, MailError> {
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| MailError::InvalidAddress(format!("{}: {e}", email.to)))?;

    let mut body = format!(
        "Someone shared encrypted files with you.\n\nDecryption key:\n{}\n",
        email.key
    );
    if let Some(url) = &email.share_url {
        body.push_str(&format!("\nDownload them here:\n{url}\n"));
    }
    body.push_str("\nThe link stops working once the share expires.\n");

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(SUBJECT)
        .body(body)
        .map_err(|e| MailError::Build(e.to_string()))
}
