//! Mail composition, delivery, and queueing.
//!
//! This module provides a thin abstraction over [lettre](https://lettre.rs)
//! with template rendering and integration with the [`jobs`](crate::jobs)
//! queue.
//!
//! # Quick Start
//!
//! ```ignore
//! // 1. Build a mailer from MAIL_* environment variables
//! let config = MailConfig::from_env()?;
//! let renderer = Arc::new(TeraRenderer::new("templates/mail/**/*")?);
//! let mailer = Mailer::from_config(&config, renderer)?.with_queue(queue.clone());
//!
//! // 2. Send directly
//! mailer
//!     .send_view("welcome.html", &json!({ "name": "Ann" }), |m| {
//!         m.to("ann@example.com").subject("Welcome!");
//!     })
//!     .await?;
//!
//! // 3. Or queue for background delivery
//! mailer
//!     .queue_view(("digest.html", "digest.txt"), &data, |m| {
//!         m.to("ann@example.com").subject("Your digest");
//!     })
//!     .await?;
//! mailer.drainer()?.handle_queue(config.batch_limit()).await;
//! ```
//!
//! # Transports
//!
//! | Driver | Transport | Notes |
//! |--------|-----------|-------|
//! | `smtp` | [`SmtpTransport`] | pooled; `ssl`, `tls` (STARTTLS) or plaintext |
//! | `sendmail` | [`SendmailTransport`] | pipes to the configured binary |
//! | `mail` | [`SendmailTransport::system`] | `sendmail` from `PATH` |

mod body;
mod builder;
mod job;
mod mailer;
mod memory;
mod message;
mod render;
mod transport;

pub use body::{Body, View};
pub use builder::MessageBuilder;
pub use job::{SendMailJob, JOB_TYPE, PAYLOAD_VERSION};
pub use mailer::Mailer;
pub use memory::MemoryTransport;
pub use message::{Attachment, Mailbox, Message, Part, PartType};
pub use render::{Renderer, TeraRenderer};
pub use transport::{
    build_message, DeliveryResult, Encryption, SendmailTransport, SmtpConfig, SmtpTransport,
    Transport, TransportConfig, TransportFactory,
};
