//! Template rendering capability.

use std::collections::HashMap;

use serde_json::Value;
use tera::Tera;
use tracing::debug;

use crate::error::MailError;

/// Turns a template identifier and a data map into rendered content.
///
/// The mailer depends only on this trait; plug in any template engine.
pub trait Renderer: Send + Sync + 'static {
    fn render(&self, template: &str, data: &Value) -> Result<String, MailError>;
}

impl<F> Renderer for F
where
    F: Fn(&str, &Value) -> Result<String, MailError> + Send + Sync + 'static,
{
    fn render(&self, template: &str, data: &Value) -> Result<String, MailError> {
        (self)(template, data)
    }
}

/// [`Renderer`] backed by [tera](https://keats.github.io/tera/) templates.
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    /// Load every template matching a glob, e.g. `"templates/mail/**/*"`.
    pub fn new(glob: &str) -> Result<Self, MailError> {
        let tera = Tera::new(glob)
            .map_err(|e| MailError::config(format!("failed to load templates from {glob}: {e}")))?;
        debug!(%glob, templates = tera.get_template_names().count(), "mail templates loaded");
        Ok(Self { tera })
    }

    /// Build from in-memory `name -> source` templates.
    pub fn from_strings(templates: HashMap<String, String>) -> Result<Self, MailError> {
        let mut tera = Tera::default();
        // all at once, so `extends` resolves regardless of insertion order;
        // autoescape is keyed off the template name's extension
        tera.add_raw_templates(templates)
            .map_err(|e| MailError::config(format!("failed to add templates: {e}")))?;
        Ok(Self { tera })
    }
}

impl Renderer for TeraRenderer {
    fn render(&self, template: &str, data: &Value) -> Result<String, MailError> {
        let render_error = |message: String| MailError::Render {
            template: template.to_string(),
            message,
        };

        let context =
            tera::Context::from_serialize(data).map_err(|e| render_error(e.to_string()))?;
        self.tera
            .render(template, &context)
            .map_err(|e| render_error(source_chain(&e)))
    }
}

// tera's top-level message is generic; the cause is further down the chain
fn source_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
