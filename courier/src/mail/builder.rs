//! Two-phase message construction: customize, render, attach.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::body::{Body, View};
use super::message::{Mailbox, Message};
use super::render::Renderer;
use crate::error::MailError;

/// Builds [`Message`]s from a body spec and a customization callback.
#[derive(Clone)]
pub struct MessageBuilder {
    renderer: Arc<dyn Renderer>,
}

impl MessageBuilder {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }

    /// Build a message whose body is rendered from `view` with `data`.
    ///
    /// The callback runs before rendering, so it sees the default sender but
    /// no body parts yet.
    pub fn build_view<F>(
        &self,
        view: &View,
        data: &Value,
        customize: F,
        default_from: Option<&Mailbox>,
    ) -> Result<Message, MailError>
    where
        F: FnOnce(&mut Message),
    {
        let mut message = Self::create(customize, default_from);

        let (html, plain) = view.templates();
        let body = Body {
            html: html.map(|t| self.render(t, data)).transpose()?,
            plain: plain.map(|t| self.render(t, data)).transpose()?,
        };

        Self::attach(&mut message, body);
        Ok(message)
    }

    /// Build a message from pre-rendered content. The renderer is not used.
    pub fn build<F>(&self, body: Body, customize: F, default_from: Option<&Mailbox>) -> Message
    where
        F: FnOnce(&mut Message),
    {
        let mut message = Self::create(customize, default_from);
        Self::attach(&mut message, body);
        message
    }

    fn create<F>(customize: F, default_from: Option<&Mailbox>) -> Message
    where
        F: FnOnce(&mut Message),
    {
        let mut message = Message::new();
        if let Some(from) = default_from {
            message.from(from.clone());
        }
        customize(&mut message);
        message
    }

    fn render(&self, template: &str, data: &Value) -> Result<String, MailError> {
        debug!(%template, "rendering mail template");
        self.renderer.render(template, data)
    }

    fn attach(message: &mut Message, body: Body) {
        if let Some(html) = body.html {
            message.html_body(html);
        }
        if let Some(plain) = body.plain {
            message.plain_body(plain);
        }
    }
}
