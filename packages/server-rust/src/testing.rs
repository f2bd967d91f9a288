//! Recording test doubles for the collaborator traits.
//!
//! All doubles append to one shared [`CallLog`] so tests can assert on the
//! relative order of repository, cache, and publisher calls.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use answer_core::{Answer, Casher, Publisher, Repository};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::Span;
use uuid::Uuid;

use crate::retry::RetryPolicy;
use crate::service::{AnswerService, ServiceConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateAnswer(Uuid),
    DeleteAnswer(Uuid),
    CacheWrite(String),
    CacheDelete(String),
    Publish { topic: String, payload: Bytes },
}

#[derive(Debug, Default, Clone)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|c| pred(c)).count()
    }
}

/// Fails the first `failures` calls, then succeeds. `u32::MAX` fails forever.
#[derive(Debug, Default)]
pub struct Failures(AtomicU32);

impl Failures {
    pub fn new(failures: u32) -> Self {
        Self(AtomicU32::new(failures))
    }

    fn check(&self, what: &str) -> anyhow::Result<()> {
        let remaining = self.0.load(Ordering::SeqCst);
        if remaining == 0 {
            return Ok(());
        }
        if remaining != u32::MAX {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
        Err(anyhow::anyhow!("{what} unavailable"))
    }
}

pub struct RecordingRepository {
    pub log: CallLog,
    pub failures: Failures,
}

#[async_trait]
impl Repository for RecordingRepository {
    async fn create_answer(&self, answer: &Answer) -> anyhow::Result<()> {
        self.log.push(Call::CreateAnswer(answer.id));
        self.failures.check("database")
    }

    async fn delete_answer(&self, id: Uuid) -> anyhow::Result<()> {
        self.log.push(Call::DeleteAnswer(id));
        self.failures.check("database")
    }
}

pub struct RecordingCasher {
    pub log: CallLog,
    pub failures: Failures,
}

#[async_trait]
impl Casher for RecordingCasher {
    async fn write(&self, key: &str, _payload: Bytes) -> anyhow::Result<()> {
        self.log.push(Call::CacheWrite(key.to_string()));
        self.failures.check("cache")
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.log.push(Call::CacheDelete(key.to_string()));
        self.failures.check("cache")
    }
}

pub struct RecordingPublisher {
    pub log: CallLog,
    pub failures: Failures,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, payload: Bytes, topic: &str) -> anyhow::Result<()> {
        self.log.push(Call::Publish {
            topic: topic.to_string(),
            payload,
        });
        self.failures.check("broker")
    }
}

/// How many leading calls each collaborator fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailurePlan {
    pub repository: u32,
    pub cache: u32,
    pub publisher: u32,
}

/// Builds an [`AnswerService`] over recording doubles with a fast retry policy
/// (3 attempts, 10ms apart).
pub fn recording_service(plan: FailurePlan) -> (Arc<AnswerService>, CallLog) {
    let log = CallLog::default();
    let config = ServiceConfig {
        write_timeout: Duration::from_secs(1),
        retry: RetryPolicy::new(3, Duration::from_millis(10)),
    };
    let service = AnswerService::new(
        Arc::new(RecordingRepository {
            log: log.clone(),
            failures: Failures::new(plan.repository),
        }),
        Arc::new(RecordingCasher {
            log: log.clone(),
            failures: Failures::new(plan.cache),
        }),
        Arc::new(RecordingPublisher {
            log: log.clone(),
            failures: Failures::new(plan.publisher),
        }),
        config,
        Span::none(),
    );
    (Arc::new(service), log)
}

pub fn valid_answer() -> Answer {
    let mut answer = Answer::new(Uuid::new_v4(), Uuid::new_v4());
    answer.add_element(1, "Blue");
    answer.add_element(2, "Forty-two");
    answer.mark_complete();
    answer
}
