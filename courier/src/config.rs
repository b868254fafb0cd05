//! Environment configuration.

use serde::Deserialize;

use crate::error::MailError;
use crate::jobs::DEFAULT_BATCH_LIMIT;
use crate::mail::{Encryption, Mailbox, SmtpConfig, TransportConfig};

/// Mail settings read from `MAIL_*` environment variables.
///
/// | Variable | Description |
/// |----------|-------------|
/// | `MAIL_DRIVER` | `smtp` (default), `sendmail`, or `mail` |
/// | `MAIL_HOST` | SMTP server hostname |
/// | `MAIL_PORT` | SMTP server port |
/// | `MAIL_ENCRYPTION` | `ssl`, `tls`, or unset for plaintext |
/// | `MAIL_USERNAME` | SMTP username, set together with the password |
/// | `MAIL_PASSWORD` | SMTP password |
/// | `MAIL_TIMEOUT` | SMTP connection timeout in seconds (default: 10) |
/// | `MAIL_SENDMAIL` | sendmail command path, for the `sendmail` driver |
/// | `MAIL_FROM_ADDRESS` | Default sender address |
/// | `MAIL_FROM_NAME` | Default sender name |
/// | `MAIL_QUEUE_BATCH` | Jobs per drain cycle (default: 50, `0` for no limit) |
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_driver")]
    pub driver: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub encryption: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Option<u64>,
    pub sendmail: Option<String>,
    pub from_address: Option<String>,
    pub from_name: Option<String>,
    pub queue_batch: Option<usize>,
}

fn default_driver() -> String {
    "smtp".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            host: None,
            port: None,
            encryption: None,
            username: None,
            password: None,
            timeout: None,
            sendmail: None,
            from_address: None,
            from_name: None,
            queue_batch: None,
        }
    }
}

impl MailConfig {
    /// Load `MAIL_*` variables, reading a `.env` file first if present.
    pub fn from_env() -> Result<Self, MailError> {
        dotenvy::dotenv().ok();
        Self::from_env_with_prefix("MAIL")
    }

    /// Load variables named `<PREFIX>_<KEY>` from the process environment.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, MailError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix(prefix))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| MailError::config(e.to_string()))
    }

    /// The transport these settings select.
    pub fn transport(&self) -> Result<TransportConfig, MailError> {
        let transport = match TransportConfig::driver(&self.driver)? {
            TransportConfig::Smtp(_) => TransportConfig::Smtp(SmtpConfig {
                host: self.host.clone(),
                port: self.port,
                encryption: self
                    .encryption
                    .as_deref()
                    .map(|s| s.parse::<Encryption>())
                    .transpose()?,
                username: self.username.clone(),
                password: self.password.clone(),
                timeout: self.timeout,
            }),
            TransportConfig::Sendmail { .. } => TransportConfig::Sendmail {
                command: self.sendmail.clone(),
            },
            TransportConfig::Mail => TransportConfig::Mail,
        };
        Ok(transport)
    }

    pub fn default_from(&self) -> Option<Mailbox> {
        self.from_address
            .as_ref()
            .map(|email| Mailbox::new(email.clone(), self.from_name.clone()))
    }

    /// Batch limit for a drain cycle; `None` drains until the queue is empty.
    pub fn batch_limit(&self) -> Option<usize> {
        match self.queue_batch {
            Some(0) => None,
            Some(limit) => Some(limit),
            None => Some(DEFAULT_BATCH_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smtp_settings_map_to_transport() {
        let config = MailConfig {
            driver: "smtp".into(),
            host: Some("smtp.example.com".into()),
            port: Some(587),
            encryption: Some("tls".into()),
            ..Default::default()
        };

        let TransportConfig::Smtp(smtp) = config.transport().unwrap() else {
            panic!("expected smtp");
        };
        assert_eq!(smtp.host.as_deref(), Some("smtp.example.com"));
        assert_eq!(smtp.port, Some(587));
        assert_eq!(smtp.encryption, Some(Encryption::Tls));
    }

    #[test]
    fn unknown_driver_is_config_error() {
        let config = MailConfig {
            driver: "fax".into(),
            ..Default::default()
        };
        assert!(matches!(config.transport(), Err(MailError::Config(m)) if m == "invalid driver"));
    }

    #[test]
    fn batch_limit_defaults_and_unbounded() {
        let mut config = MailConfig::default();
        assert_eq!(config.batch_limit(), Some(DEFAULT_BATCH_LIMIT));

        config.queue_batch = Some(0);
        assert_eq!(config.batch_limit(), None);

        config.queue_batch = Some(3);
        assert_eq!(config.batch_limit(), Some(3));
    }

    #[test]
    fn default_from_combines_address_and_name() {
        let config = MailConfig {
            from_address: Some("a@x.com".into()),
            from_name: Some("A".into()),
            ..Default::default()
        };
        assert_eq!(config.default_from(), Some(Mailbox::from(("a@x.com", "A"))));
        assert_eq!(MailConfig::default().default_from(), None);
    }
}
