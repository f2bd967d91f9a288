//! [`Repository`](answer_core::Repository) implementations.
//!
//! - [`MemoryRepository`]: `DashMap`-backed, the default when no database is configured
//! - [`PostgresRepository`]: `sqlx` over `PostgreSQL` (feature `postgres`)

mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::MemoryRepository;
#[cfg(feature = "postgres")]
pub use postgres::PostgresRepository;
