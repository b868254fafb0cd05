//! Message envelope and body parts.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MailError;

/// An address with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Mailbox {
    pub fn new(email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            email: email.into(),
            name,
        }
    }

    /// Parse into a lettre mailbox, rejecting syntactically invalid addresses.
    pub fn to_lettre(&self) -> Result<lettre::message::Mailbox, MailError> {
        let address: lettre::Address = self
            .email
            .parse()
            .map_err(|_| MailError::validation(format!("invalid email address: {}", self.email)))?;
        Ok(lettre::message::Mailbox::new(self.name.clone(), address))
    }
}

impl From<&str> for Mailbox {
    fn from(email: &str) -> Self {
        Self::new(email, None)
    }
}

impl From<String> for Mailbox {
    fn from(email: String) -> Self {
        Self::new(email, None)
    }
}

impl From<(&str, &str)> for Mailbox {
    fn from((email, name): (&str, &str)) -> Self {
        Self::new(email, Some(name.to_string()))
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => f.write_str(&self.email),
        }
    }
}

/// MIME type of a body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartType {
    #[serde(rename = "text/html")]
    Html,
    #[serde(rename = "text/plain")]
    Plain,
}

/// A rendered body part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub content: String,
    #[serde(rename = "mime")]
    pub part_type: PartType,
}

/// A file carried inline with the message.
///
/// Attachments are held in memory so a queued message stays complete even
/// after the original file is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A mail message under construction.
///
/// The envelope is mutated freely by the customization callback. Body parts
/// hold at most one HTML part and at most one plain-text alternative; setting
/// either again replaces the previous content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub from: Option<Mailbox>,
    #[serde(default)]
    pub to: Vec<Mailbox>,
    #[serde(default)]
    pub cc: Vec<Mailbox>,
    #[serde(default)]
    pub bcc: Vec<Mailbox>,
    #[serde(default)]
    pub reply_to: Vec<Mailbox>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    parts: Vec<Part>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sender, replacing any default.
    pub fn from(&mut self, mailbox: impl Into<Mailbox>) -> &mut Self {
        self.from = Some(mailbox.into());
        self
    }

    /// Add a primary recipient.
    pub fn to(&mut self, mailbox: impl Into<Mailbox>) -> &mut Self {
        self.to.push(mailbox.into());
        self
    }

    pub fn cc(&mut self, mailbox: impl Into<Mailbox>) -> &mut Self {
        self.cc.push(mailbox.into());
        self
    }

    pub fn bcc(&mut self, mailbox: impl Into<Mailbox>) -> &mut Self {
        self.bcc.push(mailbox.into());
        self
    }

    pub fn reply_to(&mut self, mailbox: impl Into<Mailbox>) -> &mut Self {
        self.reply_to.push(mailbox.into());
        self
    }

    pub fn subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = subject.into();
        self
    }

    /// Add a custom header. Setting the same name twice keeps the last value.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach in-memory data as a file.
    pub fn attach(
        &mut self,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.attachments.push(Attachment {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        });
        self
    }

    /// Set the HTML body part.
    pub fn html_body(&mut self, content: impl Into<String>) -> &mut Self {
        self.set_part(PartType::Html, content.into())
    }

    /// Set the plain-text alternative part.
    pub fn plain_body(&mut self, content: impl Into<String>) -> &mut Self {
        self.set_part(PartType::Plain, content.into())
    }

    fn set_part(&mut self, part_type: PartType, content: String) -> &mut Self {
        self.parts.retain(|p| p.part_type != part_type);
        let part = Part { content, part_type };
        // html first, the plain alternative after it
        match part_type {
            PartType::Html => self.parts.insert(0, part),
            PartType::Plain => self.parts.push(part),
        }
        self
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn html(&self) -> Option<&str> {
        self.part(PartType::Html)
    }

    pub fn plain(&self) -> Option<&str> {
        self.part(PartType::Plain)
    }

    fn part(&self, part_type: PartType) -> Option<&str> {
        self.parts
            .iter()
            .find(|p| p.part_type == part_type)
            .map(|p| p.content.as_str())
    }

    /// Every envelope recipient: to, cc and bcc.
    pub fn recipients(&self) -> impl Iterator<Item = &Mailbox> {
        self.to.iter().chain(&self.cc).chain(&self.bcc)
    }

    /// Check that the message can be handed to a transport.
    pub fn validate(&self) -> Result<(), MailError> {
        if !self.parts.iter().any(|p| !p.content.is_empty()) {
            return Err(MailError::validation("message has no html or plain body"));
        }

        let from = self
            .from
            .as_ref()
            .ok_or_else(|| MailError::validation("from address required"))?;
        from.to_lettre()?;

        if self.recipients().next().is_none() {
            return Err(MailError::validation("at least one recipient required"));
        }

        for mailbox in self.recipients().chain(&self.reply_to) {
            mailbox.to_lettre()?;
        }

        for name in self.headers.keys() {
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_graphic() && b != b':') {
                return Err(MailError::validation(format!("invalid header name: {name}")));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Message {
        let mut message = Message::new();
        message
            .from(("sender@example.com", "Sender"))
            .to("user@example.com")
            .subject("Hello")
            .html_body("<p>Body</p>");
        message
    }

    #[test]
    fn html_part_sorts_before_plain() {
        let mut message = Message::new();
        message.plain_body("Plain").html_body("<p>Rich</p>");

        assert_eq!(message.parts()[0].part_type, PartType::Html);
        assert_eq!(message.parts()[1].part_type, PartType::Plain);
    }

    #[test]
    fn setting_a_part_twice_replaces_it() {
        let mut message = Message::new();
        message.html_body("first").html_body("second");

        assert_eq!(message.parts().len(), 1);
        assert_eq!(message.html(), Some("second"));
        assert_eq!(message.plain(), None);
    }

    #[test]
    fn mailbox_display_includes_name() {
        let mailbox = Mailbox::from(("a@x.com", "A"));
        assert_eq!(mailbox.to_string(), "A <a@x.com>");
        assert_eq!(Mailbox::from("b@y.com").to_string(), "b@y.com");
    }

    #[test]
    fn validate_accepts_complete_message() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_requires_body() {
        let mut message = valid();
        message.parts.clear();
        assert!(matches!(message.validate(), Err(MailError::Validation(_))));

        message.plain_body("");
        assert!(matches!(message.validate(), Err(MailError::Validation(_))));
    }

    #[test]
    fn validate_requires_from() {
        let mut message = valid();
        message.from = None;
        assert!(message.validate().is_err());
    }

    #[test]
    fn validate_requires_recipient() {
        let mut message = valid();
        message.to.clear();
        assert!(message.validate().is_err());

        message.bcc("hidden@example.com");
        assert!(message.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_header_name() {
        let mut message = valid();
        message.header("X Bad:Name", "v");
        assert!(message.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_address() {
        let mut message = valid();
        message.cc("not an address");
        assert!(matches!(
            message.validate(),
            Err(MailError::Validation(m)) if m.contains("not an address")
        ));
    }
}
