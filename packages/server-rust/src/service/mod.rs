//! Answer write orchestration.
//!
//! 1. **Durable write** (`answer`): the repository call that commits a change
//! 2. **Fan-out** (`fanout`): concurrent cache and publish side effects, joined strictly
//! 3. **Retry** (`crate::retry`): fixed-interval budget around each side effect

pub mod answer;
pub mod config;
pub mod error;
pub mod fanout;

pub use answer::AnswerService;
pub use config::ServiceConfig;
pub use error::ServiceError;
pub use fanout::{fan_out, BoxedOperation, FanOutError};
