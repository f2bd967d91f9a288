//! Inbound event envelopes and outbound topic names.

use bytes::Bytes;
use serde::Deserialize;

/// Event type requesting creation of an answer.
pub const EVENT_TYPE_ANSWER_CREATE: &str = "request.answer.create";
/// Event type requesting deletion of an answer.
pub const EVENT_TYPE_ANSWER_DELETE: &str = "request.answer.delete";

/// Topic carrying the full answer after a successful create.
pub const TOPIC_ANSWER_CREATED: &str = "answer.created";
/// Topic carrying a [`DeletePayload`](crate::DeletePayload) after a successful delete.
pub const TOPIC_ANSWER_DELETED: &str = "answer.deleted";

/// Recognized event types. Anything else is [`EventKind::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    AnswerCreate,
    AnswerDelete,
    Unknown,
}

impl EventKind {
    #[must_use]
    pub fn parse(event_type: &str) -> Self {
        match event_type {
            EVENT_TYPE_ANSWER_CREATE => Self::AnswerCreate,
            EVENT_TYPE_ANSWER_DELETE => Self::AnswerDelete,
            _ => Self::Unknown,
        }
    }
}

/// A typed message with an opaque payload, as consumed from the queue.
///
/// On the wire the payload is any JSON value; it is re-encoded to bytes on
/// intake and only decoded again by the dispatcher. A JSON string payload is
/// taken verbatim, which lets producers send pre-encoded documents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "EventEnvelope")]
pub struct Event {
    pub id: String,
    pub event_type: String,
    pub payload: Bytes,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        event_type: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            payload: payload.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        EventKind::parse(&self.event_type)
    }
}

#[derive(Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    payload: serde_json::Value,
}

impl From<EventEnvelope> for Event {
    fn from(envelope: EventEnvelope) -> Self {
        let payload = match envelope.payload {
            serde_json::Value::String(raw) => Bytes::from(raw),
            other => Bytes::from(other.to_string()),
        };
        Self {
            id: envelope.id,
            event_type: envelope.event_type,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_recognizes_known_types() {
        assert_eq!(EventKind::parse("request.answer.create"), EventKind::AnswerCreate);
        assert_eq!(EventKind::parse("request.answer.delete"), EventKind::AnswerDelete);
        assert_eq!(EventKind::parse("request.form.create"), EventKind::Unknown);
        assert_eq!(EventKind::parse(""), EventKind::Unknown);
    }

    #[test]
    fn envelope_with_object_payload() {
        let json = r#"{"id":"e1","type":"request.answer.delete","payload":{"id":"abc"}}"#;
        let event: Event = serde_json::from_str(json).unwrap();

        assert_eq!(event.id, "e1");
        assert_eq!(event.kind(), EventKind::AnswerDelete);
        let payload: serde_json::Value = serde_json::from_slice(&event.payload).unwrap();
        assert_eq!(payload["id"], "abc");
    }

    #[test]
    fn envelope_with_string_payload_is_taken_verbatim() {
        let json = r#"{"id":"e2","type":"x","payload":"{\"id\":\"abc\"}"}"#;
        let event: Event = serde_json::from_str(json).unwrap();

        assert_eq!(&event.payload[..], br#"{"id":"abc"}"#);
    }

    #[test]
    fn envelope_without_payload_decodes_to_null() {
        let event: Event = serde_json::from_str(r#"{"id":"e3","type":"x"}"#).unwrap();
        assert_eq!(&event.payload[..], b"null");
    }

    #[test]
    fn envelope_requires_type() {
        let result = serde_json::from_str::<Event>(r#"{"id":"e4","payload":{}}"#);
        assert!(result.is_err());
    }
}
