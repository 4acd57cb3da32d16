//! In-memory stores, used when no database is configured and in tests.
//!
//! Data is lost on process restart. Every conditional write runs under a
//! single write lock, so a read-check-write is atomic per store.

mod analytics;
mod posts;
mod users;

pub use analytics::InMemoryAnalyticsRepository;
pub use posts::InMemoryPostRepository;
pub use users::InMemoryUserRepository;
