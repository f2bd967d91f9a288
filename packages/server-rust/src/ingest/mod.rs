//! Event intake: the bounded queue, its consumption loop, and type-based
//! dispatch into the answer service.

pub mod dispatcher;
pub mod ingestor;

pub use dispatcher::{DispatchOutcome, Dispatcher, RejectReason};
pub use ingestor::{EventIngestor, IngestError, IngestHandle, IngestStats, DEFAULT_QUEUE_CAPACITY};
