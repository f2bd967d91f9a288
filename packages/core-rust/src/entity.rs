//! Answer and element records carried through the write pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reasons an [`Answer`] or [`Element`] is rejected before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("answer id must not be nil")]
    NilAnswerId,
    #[error("invalid form id")]
    InvalidFormId,
    #[error("invalid user id")]
    InvalidUserId,
    #[error("element {index}: answer id must not be nil")]
    NilElementBackReference { index: usize },
    #[error("element {index}: belongs to answer {found}, expected {expected}")]
    ForeignElement {
        index: usize,
        expected: Uuid,
        found: Uuid,
    },
    #[error("element {index}: content cannot be empty")]
    EmptyContent { index: usize },
}

/// A single answered question within an [`Answer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Back-reference to the owning answer.
    #[serde(default)]
    pub answer_id: Uuid,
    /// Position of the question in its form. Used for lookup only.
    pub question_order_number: u32,
    pub content: String,
}

impl Element {
    /// Checks the element on its own, without knowing its owner.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NilElementBackReference`] for a nil
    /// back-reference and [`ValidationError::EmptyContent`] for empty content.
    /// `index` is zero because the position is unknown here; [`Answer::validate`]
    /// reports the real position.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_at(0)
    }

    fn validate_at(&self, index: usize) -> Result<(), ValidationError> {
        if self.answer_id.is_nil() {
            return Err(ValidationError::NilElementBackReference { index });
        }
        if self.content.is_empty() {
            return Err(ValidationError::EmptyContent { index });
        }
        Ok(())
    }
}

/// A user's submission against a form.
///
/// An answer without elements is valid but incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// Optional on input; [`Answer::assign_missing_id`] fills it in.
    #[serde(default)]
    pub id: Uuid,
    pub form_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Answer {
    /// Creates an empty, incomplete answer with a fresh id.
    #[must_use]
    pub fn new(form_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_id,
            user_id,
            is_complete: false,
            elements: Vec::new(),
        }
    }

    /// Assigns a v4 id when the id is nil, then points every element with a
    /// nil back-reference at this answer. Idempotent.
    pub fn assign_missing_id(&mut self) {
        if self.id.is_nil() {
            self.id = Uuid::new_v4();
        }
        for element in &mut self.elements {
            if element.answer_id.is_nil() {
                element.answer_id = self.id;
            }
        }
    }

    /// Full entity check: every identifier set, every element well formed.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, checking the answer's own
    /// identifiers before its elements in order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilAnswerId);
        }
        if self.form_id.is_nil() {
            return Err(ValidationError::InvalidFormId);
        }
        if self.user_id.is_nil() {
            return Err(ValidationError::InvalidUserId);
        }
        self.validate_elements()
    }

    /// The check applied to inbound submissions: the answer id is set and
    /// every element is well formed and owned by this answer. Form and user
    /// ids are not checked.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NilAnswerId`] or the first element error.
    pub fn validate_submission(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilAnswerId);
        }
        self.validate_elements()
    }

    fn validate_elements(&self) -> Result<(), ValidationError> {
        for (index, element) in self.elements.iter().enumerate() {
            element.validate_at(index)?;
            if element.answer_id != self.id {
                return Err(ValidationError::ForeignElement {
                    index,
                    expected: self.id,
                    found: element.answer_id,
                });
            }
        }
        Ok(())
    }

    /// Returns the first element answering the question at `order`.
    #[must_use]
    pub fn element_by_question_order(&self, order: u32) -> Option<&Element> {
        self.elements
            .iter()
            .find(|e| e.question_order_number == order)
    }

    pub fn add_element(&mut self, question_order_number: u32, content: impl Into<String>) {
        self.elements.push(Element {
            answer_id: self.id,
            question_order_number,
            content: content.into(),
        });
    }

    pub fn mark_complete(&mut self) {
        self.is_complete = true;
    }

    /// Complete means the flag is set and at least one question was answered.
    #[must_use]
    pub fn is_answer_complete(&self) -> bool {
        self.is_complete && !self.elements.is_empty()
    }

    #[must_use]
    pub fn elements_count(&self) -> usize {
        self.elements.len()
    }
}

/// Minimal projection published when an answer is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePayload {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer() -> Answer {
        Answer::new(Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn assign_missing_id_fills_answer_and_back_references() {
        let mut a = answer();
        a.id = Uuid::nil();
        a.elements.push(Element {
            answer_id: Uuid::nil(),
            question_order_number: 1,
            content: "yes".to_string(),
        });

        a.assign_missing_id();

        assert!(!a.id.is_nil());
        assert_eq!(a.elements[0].answer_id, a.id);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn assign_missing_id_keeps_existing_id() {
        let mut a = answer();
        let id = a.id;
        a.assign_missing_id();
        assert_eq!(a.id, id);
    }

    #[test]
    fn validate_rejects_nil_ids() {
        let mut a = answer();
        a.id = Uuid::nil();
        assert_eq!(a.validate(), Err(ValidationError::NilAnswerId));

        let mut a = answer();
        a.form_id = Uuid::nil();
        assert_eq!(a.validate(), Err(ValidationError::InvalidFormId));

        let mut a = answer();
        a.user_id = Uuid::nil();
        assert_eq!(a.validate(), Err(ValidationError::InvalidUserId));
    }

    #[test]
    fn submission_check_ignores_form_and_user_ids() {
        let mut a = Answer::new(Uuid::nil(), Uuid::nil());
        a.add_element(1, "yes");

        assert_eq!(a.validate(), Err(ValidationError::InvalidFormId));
        assert_eq!(a.validate_submission(), Ok(()));

        a.id = Uuid::nil();
        assert_eq!(a.validate_submission(), Err(ValidationError::NilAnswerId));
    }

    #[test]
    fn submission_check_still_rejects_bad_elements() {
        let mut a = answer();
        a.add_element(1, "");
        assert_eq!(
            a.validate_submission(),
            Err(ValidationError::EmptyContent { index: 0 })
        );

        let mut a = answer();
        let other = Uuid::new_v4();
        a.elements.push(Element {
            answer_id: other,
            question_order_number: 1,
            content: "x".to_string(),
        });
        assert!(matches!(
            a.validate_submission(),
            Err(ValidationError::ForeignElement { index: 0, .. })
        ));
    }

    #[test]
    fn validate_reports_element_position() {
        let mut a = answer();
        a.add_element(1, "first");
        a.add_element(2, "");

        assert_eq!(a.validate(), Err(ValidationError::EmptyContent { index: 1 }));
    }

    #[test]
    fn validate_rejects_foreign_elements() {
        let mut a = answer();
        let other = Uuid::new_v4();
        a.elements.push(Element {
            answer_id: other,
            question_order_number: 1,
            content: "x".to_string(),
        });

        assert_eq!(
            a.validate(),
            Err(ValidationError::ForeignElement {
                index: 0,
                expected: a.id,
                found: other,
            })
        );
    }

    #[test]
    fn element_validate_checks_back_reference_and_content() {
        let e = Element {
            answer_id: Uuid::nil(),
            question_order_number: 3,
            content: "x".to_string(),
        };
        assert!(matches!(
            e.validate(),
            Err(ValidationError::NilElementBackReference { .. })
        ));

        let e = Element {
            answer_id: Uuid::new_v4(),
            question_order_number: 3,
            content: String::new(),
        };
        assert!(matches!(e.validate(), Err(ValidationError::EmptyContent { .. })));
    }

    #[test]
    fn completeness_requires_flag_and_elements() {
        let mut a = answer();
        assert!(!a.is_answer_complete());

        a.mark_complete();
        assert!(!a.is_answer_complete(), "no elements yet");

        a.add_element(1, "done");
        assert!(a.is_answer_complete());
        assert_eq!(a.elements_count(), 1);
    }

    #[test]
    fn element_lookup_by_question_order() {
        let mut a = answer();
        a.add_element(2, "second");
        a.add_element(5, "fifth");

        assert_eq!(a.element_by_question_order(5).map(|e| e.content.as_str()), Some("fifth"));
        assert!(a.element_by_question_order(7).is_none());
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let form = Uuid::new_v4();
        let user = Uuid::new_v4();
        let json = format!(r#"{{"form_id":"{form}","user_id":"{user}"}}"#);

        let a: Answer = serde_json::from_str(&json).unwrap();

        assert!(a.id.is_nil());
        assert!(!a.is_complete);
        assert!(a.elements.is_empty());
    }
}
