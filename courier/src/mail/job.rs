//! Queue payload for deferred delivery.

use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::error::MailError;

/// Job type tag written into every payload.
pub const JOB_TYPE: &str = "courier.send";

/// Payload format version written by this release.
///
/// Decoding accepts every version up to and including this one. New message
/// fields must be optional with a serde default so older payloads still decode.
pub const PAYLOAD_VERSION: u32 = 1;

/// A fully rendered message waiting in the queue.
///
/// Stored as a JSON envelope:
///
/// ```text
/// {"job":"courier.send","version":1,"message":{"from":...,"to":[...],"parts":[...]}}
/// ```
///
/// The message is stored after rendering, so draining never needs templates
/// or the data they were rendered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMailJob {
    pub job: String,
    pub version: u32,
    pub message: Message,
}

impl SendMailJob {
    pub fn new(message: Message) -> Self {
        Self {
            job: JOB_TYPE.to_string(),
            version: PAYLOAD_VERSION,
            message,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, MailError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, MailError> {
        let job: Self = serde_json::from_slice(payload)?;

        if job.job != JOB_TYPE {
            return Err(MailError::Serialization(format!(
                "unexpected job type '{}'",
                job.job
            )));
        }
        if job.version == 0 || job.version > PAYLOAD_VERSION {
            return Err(MailError::Serialization(format!(
                "unsupported payload version {}",
                job.version
            )));
        }

        Ok(job)
    }

    pub fn into_message(self) -> Message {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> Message {
        let mut message = Message::new();
        message
            .from(("a@x.com", "A"))
            .to("b@y.com")
            .subject("Hi")
            .html_body("<p>hi</p>")
            .plain_body("hi")
            .attach("note.txt", "text/plain", b"note".to_vec());
        message
    }

    #[test]
    fn round_trip_preserves_message() {
        let payload = SendMailJob::new(message()).encode().unwrap();
        let decoded = SendMailJob::decode(&payload).unwrap().into_message();

        assert_eq!(decoded, message());
        assert_eq!(decoded.html(), Some("<p>hi</p>"));
        assert_eq!(decoded.plain(), Some("hi"));
    }

    #[test]
    fn decodes_version_one_payload() {
        let payload = br#"{
            "job": "courier.send",
            "version": 1,
            "message": {
                "from": {"email": "a@x.com", "name": "A"},
                "to": [{"email": "b@y.com"}],
                "subject": "Hi",
                "parts": [
                    {"content": "<p>hi</p>", "mime": "text/html"},
                    {"content": "hi", "mime": "text/plain"}
                ]
            }
        }"#;

        let message = SendMailJob::decode(payload).unwrap().into_message();
        assert_eq!(message.from.as_ref().unwrap().name.as_deref(), Some("A"));
        assert_eq!(message.to[0].email, "b@y.com");
        assert_eq!(message.subject, "Hi");
        assert_eq!(message.html(), Some("<p>hi</p>"));
        assert_eq!(message.plain(), Some("hi"));
        assert!(message.cc.is_empty());
        assert!(message.attachments.is_empty());
    }

    #[test]
    fn rejects_future_versions() {
        let mut job = SendMailJob::new(message());
        job.version = PAYLOAD_VERSION + 1;
        let payload = serde_json::to_vec(&job).unwrap();

        assert!(matches!(
            SendMailJob::decode(&payload),
            Err(MailError::Serialization(m)) if m.contains("version")
        ));
    }

    #[test]
    fn rejects_foreign_jobs() {
        let payload = br#"{"job":"reports.build","version":1,"message":{}}"#;
        assert!(matches!(SendMailJob::decode(payload), Err(MailError::Serialization(_))));
    }

    #[test]
    fn rejects_corrupt_payload() {
        assert!(matches!(
            SendMailJob::decode(b"\x00not json"),
            Err(MailError::Serialization(_))
        ));
    }
}
