pub mod config;
pub mod error;
pub mod jobs;
pub mod mail;

pub use crate::config::MailConfig;
pub use crate::error::{ErrorKind, MailError};
