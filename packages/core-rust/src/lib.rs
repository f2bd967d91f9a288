//! Answer service core: answer entities, event envelopes, and the contracts
//! the pipeline uses to reach storage, cache, and publishers.

pub mod entity;
pub mod event;
pub mod traits;

pub use entity::{Answer, DeletePayload, Element, ValidationError};
pub use event::{
    Event, EventKind, EVENT_TYPE_ANSWER_CREATE, EVENT_TYPE_ANSWER_DELETE, TOPIC_ANSWER_CREATED,
    TOPIC_ANSWER_DELETED,
};
pub use traits::{Casher, Closer, Healther, Publisher, Repository};

/// Prefix of every cache key holding an answer.
pub const ANSWER_KEY_PREFIX: &str = "answer:";

/// Cache key for the answer with the given string id.
#[must_use]
pub fn answer_key(id: &str) -> String {
    format!("{ANSWER_KEY_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_key_uses_prefix() {
        assert_eq!(answer_key("a1"), "answer:a1");
    }
}
