//! Dispatcher: send now or queue for later.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::body::{Body, View};
use super::builder::MessageBuilder;
use super::job::SendMailJob;
use super::message::{Mailbox, Message};
use super::render::Renderer;
use super::transport::{DeliveryResult, Transport, TransportFactory};
use crate::config::MailConfig;
use crate::error::MailError;
use crate::jobs::{JobId, QueueDrainer, QueueProvider};

/// Builds messages and hands them to a transport or a queue.
///
/// Sending and queueing share one build step, so a queued message carries
/// exactly the content a direct send would have.
///
/// ```ignore
/// let mut mailer = Mailer::new(transport, renderer).with_queue(queue);
/// mailer.always_from("noreply@example.com", Some("Example"));
///
/// mailer
///     .send_view("welcome.html", &json!({ "name": "Ann" }), |m| {
///         m.to("ann@example.com").subject("Welcome!");
///     })
///     .await?;
/// ```
pub struct Mailer {
    transport: Arc<dyn Transport>,
    builder: MessageBuilder,
    queue: Option<Arc<dyn QueueProvider>>,
    from: Option<Mailbox>,
}

impl Mailer {
    pub fn new(transport: Arc<dyn Transport>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            transport,
            builder: MessageBuilder::new(renderer),
            queue: None,
            from: None,
        }
    }

    /// Build the transport and default sender from configuration.
    pub fn from_config(
        config: &MailConfig,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self, MailError> {
        let transport = TransportFactory::build(&config.transport()?)?;
        let mut mailer = Self::new(transport, renderer);
        mailer.from = config.default_from();
        Ok(mailer)
    }

    /// Enable [`queue`](Self::queue) and [`queue_view`](Self::queue_view).
    pub fn with_queue(mut self, queue: Arc<dyn QueueProvider>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Use this sender for every message built from now on. The
    /// customization callback can still override it.
    pub fn always_from(&mut self, email: impl Into<String>, name: Option<&str>) -> &mut Self {
        self.from = Some(Mailbox::new(email, name.map(str::to_string)));
        self
    }

    /// A drainer delivering this mailer's queue through its transport.
    pub fn drainer(&self) -> Result<QueueDrainer, MailError> {
        Ok(QueueDrainer::new(self.require_queue()?, self.transport.clone()))
    }

    /// Render `view` with `data` and send the message now.
    pub async fn send_view<F>(
        &self,
        view: impl Into<View>,
        data: &Value,
        customize: F,
    ) -> Result<DeliveryResult, MailError>
    where
        F: FnOnce(&mut Message),
    {
        let message = self
            .builder
            .build_view(&view.into(), data, customize, self.from.as_ref())?;
        self.deliver(message).await
    }

    /// Send pre-rendered content now.
    pub async fn send<F>(
        &self,
        body: impl Into<Body>,
        customize: F,
    ) -> Result<DeliveryResult, MailError>
    where
        F: FnOnce(&mut Message),
    {
        let message = self.builder.build(body.into(), customize, self.from.as_ref());
        self.deliver(message).await
    }

    /// Render `view` with `data` now and queue the result for delivery.
    ///
    /// Template errors surface here, before anything reaches the queue.
    pub async fn queue_view<F>(
        &self,
        view: impl Into<View>,
        data: &Value,
        customize: F,
    ) -> Result<JobId, MailError>
    where
        F: FnOnce(&mut Message),
    {
        let message = self
            .builder
            .build_view(&view.into(), data, customize, self.from.as_ref())?;
        self.enqueue(message).await
    }

    /// Queue pre-rendered content for delivery.
    pub async fn queue<F>(&self, body: impl Into<Body>, customize: F) -> Result<JobId, MailError>
    where
        F: FnOnce(&mut Message),
    {
        let message = self.builder.build(body.into(), customize, self.from.as_ref());
        self.enqueue(message).await
    }

    async fn deliver(&self, message: Message) -> Result<DeliveryResult, MailError> {
        message.validate()?;
        debug!(subject = %message.subject, "sending mail");

        let result = self.transport.send(&message).await?;
        info!(
            transport = result.transport,
            recipients = result.recipients,
            "mail sent"
        );
        Ok(result)
    }

    async fn enqueue(&self, message: Message) -> Result<JobId, MailError> {
        message.validate()?;
        let queue = self.require_queue()?;

        let payload = SendMailJob::new(message).encode()?;
        let job_id = queue.put(payload).await?;
        info!(%job_id, "mail queued");
        Ok(job_id)
    }

    fn require_queue(&self) -> Result<Arc<dyn QueueProvider>, MailError> {
        self.queue
            .clone()
            .ok_or_else(|| MailError::config("no queue configured"))
    }
}
