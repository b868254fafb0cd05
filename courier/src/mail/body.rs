//! Body specifications: template references or pre-rendered content.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MailError;

/// Templates that produce a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// A single template rendered as the HTML body.
    Template(String),
    /// Positional `(html, plain)` templates.
    Pair(Option<String>, Option<String>),
    /// Named templates; `text` renders the plain-text part.
    Keyed {
        html: Option<String>,
        text: Option<String>,
    },
}

impl View {
    pub fn keyed(html: Option<&str>, text: Option<&str>) -> Self {
        Self::Keyed {
            html: html.map(str::to_string),
            text: text.map(str::to_string),
        }
    }

    /// The `(html, plain)` template identifiers, in that order.
    pub fn templates(&self) -> (Option<&str>, Option<&str>) {
        match self {
            Self::Template(html) => (Some(html.as_str()), None),
            Self::Pair(html, plain) => (html.as_deref(), plain.as_deref()),
            Self::Keyed { html, text } => (html.as_deref(), text.as_deref()),
        }
    }
}

impl From<&str> for View {
    fn from(template: &str) -> Self {
        Self::Template(template.to_string())
    }
}

impl From<String> for View {
    fn from(template: String) -> Self {
        Self::Template(template)
    }
}

impl From<(&str, &str)> for View {
    fn from((html, plain): (&str, &str)) -> Self {
        Self::Pair(Some(html.to_string()), Some(plain.to_string()))
    }
}

/// Untyped body specs, as they arrive from configuration or another process.
///
/// A string is a single template, a two-element array is an `(html, plain)`
/// pair, and an object is read by its `html` and `text` keys.
impl TryFrom<Value> for View {
    type Error = MailError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        fn template(value: Option<&Value>) -> Result<Option<String>, MailError> {
            match value {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(_) => Err(MailError::validation("invalid body spec")),
            }
        }

        match value {
            Value::String(s) => Ok(Self::Template(s)),
            Value::Array(items) if items.len() == 2 => {
                Ok(Self::Pair(template(items.first())?, template(items.get(1))?))
            }
            Value::Object(map) => Ok(Self::Keyed {
                html: template(map.get("html"))?,
                text: template(map.get("text"))?,
            }),
            _ => Err(MailError::validation("invalid body spec")),
        }
    }
}

/// Already-rendered body content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub plain: Option<String>,
}

impl Body {
    pub fn html(content: impl Into<String>) -> Self {
        Self {
            html: Some(content.into()),
            plain: None,
        }
    }

    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            html: None,
            plain: Some(content.into()),
        }
    }

    pub fn with_plain(mut self, content: impl Into<String>) -> Self {
        self.plain = Some(content.into());
        self
    }
}

impl From<&str> for Body {
    fn from(html: &str) -> Self {
        Self::html(html)
    }
}

impl From<String> for Body {
    fn from(html: String) -> Self {
        Self::html(html)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn string_is_single_html_template() {
        let view = View::try_from(json!("welcome")).unwrap();
        assert_eq!(view.templates(), (Some("welcome"), None));
    }

    #[test]
    fn array_is_positional_pair() {
        let view = View::try_from(json!(["welcome.html", "welcome.txt"])).unwrap();
        assert_eq!(view.templates(), (Some("welcome.html"), Some("welcome.txt")));
    }

    #[test]
    fn object_maps_text_to_plain() {
        let view = View::try_from(json!({ "text": "welcome.txt" })).unwrap();
        assert_eq!(view.templates(), (None, Some("welcome.txt")));

        let view = View::try_from(json!({ "html": "a", "text": "b" })).unwrap();
        assert_eq!(view.templates(), (Some("a"), Some("b")));
    }

    #[test]
    fn other_shapes_are_rejected() {
        for value in [json!(42), json!(["one"]), json!(["a", "b", "c"]), json!({ "html": 1 })] {
            assert!(matches!(
                View::try_from(value),
                Err(MailError::Validation(m)) if m == "invalid body spec"
            ));
        }
    }

    #[test]
    fn str_body_is_html() {
        let body = Body::from("hello");
        assert_eq!(body.html.as_deref(), Some("hello"));
        assert_eq!(body.plain, None);
    }

    #[test]
    fn plain_body_can_gain_html_and_back() {
        let body = Body::plain("hi");
        assert_eq!((body.html.as_deref(), body.plain.as_deref()), (None, Some("hi")));

        let body = Body::html("<p>hi</p>").with_plain("hi");
        assert_eq!(body.html.as_deref(), Some("<p>hi</p>"));
        assert_eq!(body.plain.as_deref(), Some("hi"));
    }
}
