//! SMTP settings and transport selection.

use crate::transport::EmailError;

const DEFAULT_SMTP_PORT: u16 = 587;

/// Sender used when `SMTP_FROM` is unset.
pub const DEFAULT_FROM_ADDRESS: &str = "noreply@notifications.local";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    /// STARTTLS port, 587 unless `SMTP_PORT` says otherwise.
    pub smtp_port: u16,
    pub from_address: String,
    /// Only set when both `SMTP_USER` and `SMTP_PASSWORD` are present.
    pub credentials: Option<SmtpCredentials>,
}

impl EmailConfig {
    /// `None` when `SMTP_HOST` is unset or blank.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let smtp_host = var("SMTP_HOST")?;
        let smtp_port = match var("SMTP_PORT").map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(_)) => {
                tracing::warn!(default = DEFAULT_SMTP_PORT, "Ignoring invalid SMTP_PORT");
                DEFAULT_SMTP_PORT
            }
            None => DEFAULT_SMTP_PORT,
        };
        let credentials = match (var("SMTP_USER"), var("SMTP_PASSWORD")) {
            (Some(user), Some(password)) => Some(SmtpCredentials { user, password }),
            _ => None,
        };

        Some(Self {
            smtp_host,
            smtp_port,
            from_address: var("SMTP_FROM").unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            credentials,
        })
    }
}

/// Transport selected by `EMAIL_BACKEND`.
#[derive(Debug, Clone)]
pub enum EmailBackend {
    Smtp(EmailConfig),
    /// Keep messages in an in-memory outbox. Never chosen implicitly.
    Memory,
}

impl EmailBackend {
    /// `EMAIL_BACKEND` is `smtp` (the default) or `memory`. The SMTP backend
    /// needs `SMTP_HOST`; without it startup fails instead of silently
    /// dropping every message.
    pub fn from_env() -> Result<Self, EmailError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EmailError> {
        let backend = lookup("EMAIL_BACKEND")
            .map(|b| b.trim().to_ascii_lowercase())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "smtp".to_string());

        match backend.as_str() {
            "smtp" => EmailConfig::from_lookup(&lookup).map(Self::Smtp).ok_or_else(|| {
                EmailError::Config(
                    "SMTP_HOST is not set; set it, or EMAIL_BACKEND=memory to keep mail in memory"
                        .to_string(),
                )
            }),
            "memory" => Ok(Self::Memory),
            other => Err(EmailError::Config(format!("Unknown EMAIL_BACKEND '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn config(vars: &[(&str, &str)]) -> Option<EmailConfig> {
        let vars = env(vars);
        EmailConfig::from_lookup(|key| vars.get(key).cloned())
    }

    fn backend(vars: &[(&str, &str)]) -> Result<EmailBackend, EmailError> {
        let vars = env(vars);
        EmailBackend::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn smtp_backend_requires_a_host() {
        assert!(matches!(backend(&[]), Err(EmailError::Config(_))));
        assert!(matches!(
            backend(&[("EMAIL_BACKEND", "smtp"), ("SMTP_HOST", " ")]),
            Err(EmailError::Config(_))
        ));
        assert!(matches!(
            backend(&[("SMTP_HOST", "mail.example.org")]),
            Ok(EmailBackend::Smtp(c)) if c.smtp_host == "mail.example.org"
        ));
    }

    #[test]
    fn memory_backend_is_opt_in() {
        assert!(matches!(backend(&[("EMAIL_BACKEND", "Memory")]), Ok(EmailBackend::Memory)));
        assert!(matches!(
            backend(&[("EMAIL_BACKEND", "sendmail")]),
            Err(EmailError::Config(msg)) if msg.contains("sendmail")
        ));
    }

    #[test]
    fn missing_or_blank_host_disables_smtp() {
        assert!(config(&[]).is_none());
        assert!(config(&[("SMTP_HOST", "  ")]).is_none());
    }

    #[test]
    fn defaults_apply() {
        let config = config(&[("SMTP_HOST", "mail.example.org"), ("SMTP_PORT", "smtp")]).unwrap();
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.from_address, DEFAULT_FROM_ADDRESS);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn credentials_need_both_parts() {
        let only_user = config(&[("SMTP_HOST", "mail"), ("SMTP_USER", "bdr")]).unwrap();
        assert!(only_user.credentials.is_none());

        let both = config(&[
            ("SMTP_HOST", "mail"),
            ("SMTP_PORT", "2525"),
            ("SMTP_USER", "bdr"),
            ("SMTP_PASSWORD", "secret"),
        ])
        .unwrap();
        assert_eq!(both.smtp_port, 2525);
        assert_eq!(
            both.credentials,
            Some(SmtpCredentials {
                user: "bdr".into(),
                password: "secret".into()
            })
        );
    }
}
