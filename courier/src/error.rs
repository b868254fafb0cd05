use thiserror::Error;

/// Every failure the mail pipeline can produce.
///
/// Variants follow the point in the pipeline where the failure happens, which
/// also decides how it is handled: configuration, validation and render
/// errors fail the caller immediately, while transport and serialization
/// errors met while draining the queue are recorded per job.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("failed to render template '{template}': {message}")]
    Render { template: String, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("queue error: {0}")]
    Queue(String),
}

/// Coarse classification of a [`MailError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Validation,
    Render,
    Transport,
    Serialization,
    Queue,
}

impl MailError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Render { .. } => ErrorKind::Render,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Queue(_) => ErrorKind::Queue,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<serde_json::Error> for MailError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Validation => write!(f, "validation"),
            Self::Render => write!(f, "render"),
            Self::Transport => write!(f, "transport"),
            Self::Serialization => write!(f, "serialization"),
            Self::Queue => write!(f, "queue"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_become_serialization_errors() {
        let err: MailError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn render_error_names_the_template() {
        let err = MailError::Render {
            template: "welcome.html".into(),
            message: "unknown variable".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to render template 'welcome.html': unknown variable"
        );
    }
}
