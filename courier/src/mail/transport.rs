//! Delivery transports and the factory that builds them from configuration.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::{ContentType, HeaderName, HeaderValue};
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSendmailTransport, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use serde::Deserialize;
use tracing::debug;

use super::message::Message;
use crate::error::MailError;

/// Async delivery backend.
///
/// Implement this trait to plug in alternative backends (SES, an HTTP API).
/// Implementations connect lazily; construction never touches the network.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Deliver a composed message.
    async fn send(&self, message: &Message) -> Result<DeliveryResult, MailError>;
}

/// What a transport reports back for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    /// Name of the transport that accepted the message.
    pub transport: &'static str,
    /// Number of envelope recipients.
    pub recipients: usize,
    /// Server response line, when the transport has one.
    pub response: Option<String>,
}

/// SMTP connection security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    /// TLS from the first byte (usually port 465).
    Ssl,
    /// Plaintext connect, upgraded with STARTTLS (usually port 587).
    Tls,
}

impl FromStr for Encryption {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ssl" => Ok(Self::Ssl),
            "tls" | "starttls" => Ok(Self::Tls),
            other => Err(MailError::config(format!("invalid encryption '{other}'"))),
        }
    }
}

/// SMTP transport settings. Host and port are checked when the transport is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub encryption: Option<Encryption>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Connection timeout in seconds (default: 10).
    pub timeout: Option<u64>,
}

/// Which transport to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportConfig {
    Smtp(SmtpConfig),
    /// A sendmail-compatible binary at the given path.
    Sendmail { command: Option<String> },
    /// The system `sendmail` found on `PATH`.
    Mail,
}

impl TransportConfig {
    /// Select a transport by driver name.
    pub fn driver(name: &str) -> Result<Self, MailError> {
        match name {
            "smtp" => Ok(Self::Smtp(SmtpConfig::default())),
            "sendmail" => Ok(Self::Sendmail { command: None }),
            "mail" => Ok(Self::Mail),
            _ => Err(MailError::config("invalid driver")),
        }
    }
}

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Builds a [`Transport`] from a [`TransportConfig`].
pub struct TransportFactory;

impl TransportFactory {
    pub fn build(config: &TransportConfig) -> Result<Arc<dyn Transport>, MailError> {
        let transport: Arc<dyn Transport> = match config {
            TransportConfig::Smtp(smtp) => Arc::new(SmtpTransport::from_config(smtp)?),
            TransportConfig::Sendmail { command } => {
                let command = command
                    .as_deref()
                    .filter(|c| !c.trim().is_empty())
                    .ok_or_else(|| MailError::config("missing sendmail command path"))?;
                Arc::new(SendmailTransport::with_command(command))
            }
            TransportConfig::Mail => Arc::new(SendmailTransport::system()),
        };
        Ok(transport)
    }
}

/// SMTP delivery through lettre's pooled async transport.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailError> {
        let (host, port) = match (config.host.as_deref(), config.port) {
            (Some(host), Some(port)) if !host.is_empty() => (host, port),
            _ => return Err(MailError::config("missing host/port")),
        };

        let mut builder = match config.encryption {
            None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
            Some(Encryption::Ssl) => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| MailError::config(e.to_string()))?,
            Some(Encryption::Tls) => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| MailError::config(e.to_string()))?,
        };

        builder = builder.port(port).timeout(Some(Duration::from_secs(
            config.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
        )));

        match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            }
            (None, None) => {}
            _ => {
                return Err(MailError::config(
                    "smtp username and password must be set together",
                ))
            }
        }

        debug!(%host, port, encryption = ?config.encryption, "smtp transport configured");
        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, message: &Message) -> Result<DeliveryResult, MailError> {
        let email = build_message(message)?;
        let recipients = email.envelope().to().len();

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let lines: Vec<String> = response.message().map(|line| line.to_string()).collect();
        Ok(DeliveryResult {
            transport: "smtp",
            recipients,
            response: Some(format!("{} {}", response.code(), lines.join(" "))),
        })
    }
}

/// Delivery by piping the message into a sendmail-compatible binary.
pub struct SendmailTransport {
    transport: AsyncSendmailTransport<Tokio1Executor>,
    name: &'static str,
}

impl SendmailTransport {
    pub fn with_command(command: &str) -> Self {
        debug!(%command, "sendmail transport configured");
        Self {
            transport: AsyncSendmailTransport::<Tokio1Executor>::new_with_command(command),
            name: "sendmail",
        }
    }

    /// The platform mailer: `sendmail` resolved from `PATH`.
    pub fn system() -> Self {
        Self {
            transport: AsyncSendmailTransport::<Tokio1Executor>::new(),
            name: "mail",
        }
    }
}

#[async_trait]
impl Transport for SendmailTransport {
    async fn send(&self, message: &Message) -> Result<DeliveryResult, MailError> {
        let email = build_message(message)?;
        let recipients = email.envelope().to().len();

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(DeliveryResult {
            transport: self.name,
            recipients,
            response: None,
        })
    }
}

enum Content {
    Alternative(MultiPart),
    Single(SinglePart),
}

/// Convert a [`Message`] into a lettre message ready for any lettre transport.
pub fn build_message(message: &Message) -> Result<lettre::Message, MailError> {
    let from = message
        .from
        .as_ref()
        .ok_or_else(|| MailError::validation("from address required"))?
        .to_lettre()?;

    let mut builder = lettre::Message::builder().from(from).subject(&message.subject);

    for to in &message.to {
        builder = builder.to(to.to_lettre()?);
    }
    for cc in &message.cc {
        builder = builder.cc(cc.to_lettre()?);
    }
    for bcc in &message.bcc {
        builder = builder.bcc(bcc.to_lettre()?);
    }
    for reply_to in &message.reply_to {
        builder = builder.reply_to(reply_to.to_lettre()?);
    }

    for (name, value) in &message.headers {
        let name = HeaderName::new_from_ascii(name.clone())
            .map_err(|_| MailError::validation(format!("invalid header name: {name}")))?;
        builder = builder.raw_header(HeaderValue::new(name, value.clone()));
    }

    let content = match (message.html(), message.plain()) {
        (Some(html), Some(plain)) => Content::Alternative(MultiPart::alternative_plain_html(
            plain.to_string(),
            html.to_string(),
        )),
        (Some(html), None) => Content::Single(SinglePart::html(html.to_string())),
        (None, Some(plain)) => Content::Single(SinglePart::plain(plain.to_string())),
        (None, None) => return Err(MailError::validation("message has no html or plain body")),
    };

    let built = if message.attachments.is_empty() {
        match content {
            Content::Alternative(part) => builder.multipart(part),
            Content::Single(part) => builder.singlepart(part),
        }
    } else {
        let mixed = match content {
            Content::Alternative(part) => MultiPart::mixed().multipart(part),
            Content::Single(part) => MultiPart::mixed().singlepart(part),
        };
        let mixed = message.attachments.iter().try_fold(mixed, |mixed, file| {
            let content_type = ContentType::parse(&file.content_type).map_err(|_| {
                MailError::validation(format!("invalid content type: {}", file.content_type))
            })?;
            let attachment =
                Attachment::new(file.filename.clone()).body(file.data.clone(), content_type);
            Ok::<_, MailError>(mixed.singlepart(attachment))
        })?;
        builder.multipart(mixed)
    };

    built.map_err(|e| MailError::validation(format!("failed to build message: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp(host: Option<&str>, port: Option<u16>) -> TransportConfig {
        TransportConfig::Smtp(SmtpConfig {
            host: host.map(str::to_string),
            port,
            ..Default::default()
        })
    }

    fn message() -> Message {
        let mut message = Message::new();
        message
            .from(("a@x.com", "A"))
            .to("b@y.com")
            .bcc("c@z.com")
            .subject("Hello")
            .header("X-Campaign", "spring");
        message
    }

    #[test]
    fn smtp_requires_host_and_port() {
        let configs = [
            smtp(None, Some(25)),
            smtp(Some("mail.example.com"), None),
            smtp(Some(""), Some(25)),
        ];
        for config in configs {
            let err = TransportFactory::build(&config).err().unwrap();
            assert!(matches!(err, MailError::Config(m) if m == "missing host/port"));
        }
    }

    #[tokio::test]
    async fn smtp_builds_without_connecting() {
        let config = TransportConfig::Smtp(SmtpConfig {
            host: Some("localhost".into()),
            port: Some(2525),
            encryption: Some(Encryption::Tls),
            username: Some("user".into()),
            password: Some("secret".into()),
            timeout: Some(1),
        });
        assert!(TransportFactory::build(&config).is_ok());
    }

    #[test]
    fn smtp_rejects_half_credentials() {
        let config = TransportConfig::Smtp(SmtpConfig {
            host: Some("localhost".into()),
            port: Some(25),
            username: Some("user".into()),
            ..Default::default()
        });
        assert!(matches!(TransportFactory::build(&config), Err(MailError::Config(_))));
    }

    #[test]
    fn sendmail_requires_command_path() {
        let config = TransportConfig::Sendmail { command: None };
        assert!(matches!(TransportFactory::build(&config), Err(MailError::Config(_))));

        let config = TransportConfig::Sendmail {
            command: Some("/usr/sbin/sendmail".into()),
        };
        assert!(TransportFactory::build(&config).is_ok());
    }

    #[test]
    fn unknown_driver_is_rejected() {
        assert!(matches!(
            TransportConfig::driver("carrier-pigeon"),
            Err(MailError::Config(m)) if m == "invalid driver"
        ));
        assert_eq!(TransportConfig::driver("mail").unwrap(), TransportConfig::Mail);
    }

    #[test]
    fn encryption_parses_case_insensitively() {
        assert_eq!("SSL".parse::<Encryption>().unwrap(), Encryption::Ssl);
        assert_eq!("starttls".parse::<Encryption>().unwrap(), Encryption::Tls);
        assert!("rot13".parse::<Encryption>().is_err());
    }

    #[test]
    fn builds_alternative_message() {
        let mut message = message();
        message.html_body("<p>Hi</p>").plain_body("Hi");

        let email = build_message(&message).unwrap();
        assert_eq!(email.envelope().to().len(), 2);

        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("X-Campaign: spring"));
        assert!(raw.contains("Subject: Hello"));
    }

    #[test]
    fn builds_mixed_message_with_attachment() {
        let mut message = message();
        message
            .html_body("<p>Report</p>")
            .attach("report.csv", "text/csv", b"a,b\n1,2\n".to_vec());

        let raw = String::from_utf8(build_message(&message).unwrap().formatted()).unwrap();
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("report.csv"));
    }

    #[test]
    fn rejects_bad_attachment_content_type() {
        let mut message = message();
        message.html_body("x").attach("f", "not a mime", vec![1, 2]);
        assert!(matches!(build_message(&message), Err(MailError::Validation(_))));
    }
}
