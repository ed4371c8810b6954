//! Email transports behind the [`Mailer`] trait.
//!
//! [`SmtpMailer`] sends multipart (plain text + HTML) messages through
//! lettre's async SMTP transport. [`MemoryMailer`] keeps sent messages in an
//! outbox; it backs the test suites and deployments without SMTP.

use std::sync::{LazyLock, Mutex};

use async_trait::async_trait;
use lettre::message::header::{HeaderName, HeaderValue};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use regex::Regex;

use crate::config::EmailConfig;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The transport refused the message.
    #[error("Email rejected: {0}")]
    Rejected(String),

    /// No usable transport is configured.
    #[error("Email configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A rendered email ready to hand to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body_html: String,
    /// Extra headers such as `X-Notification-Template`.
    pub headers: Vec<(String, String)>,
}

impl OutgoingEmail {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body_html: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body_html: body_html.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Plain-text alternative: the HTML body with tags removed.
    pub fn body_text(&self) -> String {
        static TAG_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
        TAG_RE.replace_all(&self.body_html, "").trim().to_string()
    }
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// Something that can deliver an [`OutgoingEmail`].
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError>;
}

/// Build the lettre message for `email` sent from `from`.
pub fn build_message(from: &str, email: &OutgoingEmail) -> Result<Message, EmailError> {
    let from: Mailbox = from.parse()?;
    let to: Mailbox = email.to.parse()?;

    let mut builder = Message::builder().from(from).to(to).subject(&email.subject);
    for (name, value) in &email.headers {
        let name = HeaderName::new_from_ascii(name.clone())
            .map_err(|e| EmailError::Build(format!("invalid header {name}: {e}")))?;
        builder = builder.raw_header(HeaderValue::new(name, value.clone()));
    }

    builder
        .multipart(MultiPart::alternative_plain_html(
            email.body_text(),
            email.body_html.clone(),
        ))
        .map_err(|e| EmailError::Build(e.to_string()))
}

/// Sends email through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let Some(creds) = &config.credentials {
            transport_builder = transport_builder
                .credentials(Credentials::new(creds.user.clone(), creds.password.clone()));
        }

        Ok(Self {
            transport: transport_builder.build(),
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let message = build_message(&self.from_address, email)?;
        self.transport.send(message).await?;
        tracing::info!(to = %email.to, subject = %email.subject, "Notification email sent");
        Ok(())
    }
}

/// Collects messages instead of sending them.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<OutgoingEmail>>,
    failing: Mutex<Vec<String>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message accepted so far, oldest first.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Make every later send to `address` fail.
    pub fn fail_for(&self, address: impl Into<String>) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.push(address.into());
        }
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), EmailError> {
        let refused = self
            .failing
            .lock()
            .map(|f| f.contains(&email.to))
            .unwrap_or(false);
        if refused {
            return Err(EmailError::Rejected(format!("{} refused", email.to)));
        }
        // Reject the same malformed addresses SMTP would.
        email.to.parse::<Mailbox>()?;

        let mut outbox = self
            .outbox
            .lock()
            .map_err(|_| EmailError::Build("outbox lock poisoned".to_string()))?;
        outbox.push(email.clone());
        tracing::debug!(to = %email.to, subject = %email.subject, "Email stored in memory outbox");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
