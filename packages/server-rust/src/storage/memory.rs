//! In-memory [`Repository`] backed by [`DashMap`].
//!
//! Concurrent writers use `DashMap`'s sharded locking; no external lock is
//! needed. Suitable for development, tests, and single-node runs where losing
//! answers on restart is acceptable.

use answer_core::{Answer, Repository};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

/// Answers keyed by id.
pub struct MemoryRepository {
    answers: DashMap<Uuid, Answer>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            answers: DashMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<Answer> {
        self.answers.get(&id).map(|a| a.clone())
    }

    /// All answers submitted against `form_id`, in no particular order.
    #[must_use]
    pub fn by_form(&self, form_id: Uuid) -> Vec<Answer> {
        self.answers
            .iter()
            .filter(|entry| entry.form_id == form_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_answer(&self, answer: &Answer) -> anyhow::Result<()> {
        match self.answers.entry(answer.id) {
            Entry::Occupied(_) => Err(anyhow::anyhow!("answer {} already exists", answer.id)),
            Entry::Vacant(slot) => {
                slot.insert(answer.clone());
                Ok(())
            }
        }
    }

    async fn delete_answer(&self, id: Uuid) -> anyhow::Result<()> {
        self.answers.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer() -> Answer {
        let mut a = Answer::new(Uuid::new_v4(), Uuid::new_v4());
        a.add_element(1, "yes");
        a
    }

    #[tokio::test]
    async fn create_then_get() {
        let repo = MemoryRepository::new();
        let a = answer();

        repo.create_answer(&a).await.unwrap();

        assert_eq!(repo.get(a.id), Some(a));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let repo = MemoryRepository::new();
        let a = answer();
        repo.create_answer(&a).await.unwrap();

        let err = repo.create_answer(&a).await.unwrap_err();

        assert!(err.to_string().contains("already exists"));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = MemoryRepository::new();
        let a = answer();
        repo.create_answer(&a).await.unwrap();

        repo.delete_answer(a.id).await.unwrap();
        repo.delete_answer(a.id).await.unwrap();

        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn by_form_filters_on_form_id() {
        let repo = MemoryRepository::new();
        let a = answer();
        let mut b = answer();
        b.form_id = a.form_id;
        let c = answer();
        for x in [&a, &b, &c] {
            repo.create_answer(x).await.unwrap();
        }

        let found = repo.by_form(a.form_id);

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|x| x.form_id == a.form_id));
    }
}
