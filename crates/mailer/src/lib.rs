//! Outgoing notification email.
//!
//! - [`config`] -- SMTP settings from the environment.
//! - [`transport`] -- the [`Mailer`] seam with SMTP and in-memory transports.
//! - [`dispatch`] -- rendering templates per recipient, sending, and
//!   recording the send log.

pub mod config;
pub mod dispatch;
pub mod transport;

pub use config::{EmailBackend, EmailConfig};
pub use dispatch::{DispatchError, DispatchSummary, Dispatcher};
pub use transport::{EmailError, Mailer, MemoryMailer, OutgoingEmail, SmtpMailer};

use std::sync::Arc;

/// The transport chosen by [`EmailBackend::from_env`].
pub fn mailer_from_env() -> Result<Arc<dyn Mailer>, EmailError> {
    match EmailBackend::from_env()? {
        EmailBackend::Smtp(config) => {
            tracing::info!(host = %config.smtp_host, port = config.smtp_port, "SMTP mailer configured");
            Ok(Arc::new(SmtpMailer::new(&config)?))
        }
        EmailBackend::Memory => {
            tracing::warn!("EMAIL_BACKEND=memory, outgoing email is kept in memory and never delivered");
            Ok(Arc::new(MemoryMailer::new()))
        }
    }
}
