//! In-process cache and publisher collaborators.

pub mod cache;
pub mod publisher;

pub use cache::{MemoryCache, DEFAULT_CACHE_CAPACITY};
pub use publisher::{BroadcastPublisher, PublishedMessage, DEFAULT_PUBLISH_CAPACITY};
