//! # Pulse Infrastructure
//!
//! Concrete implementations of the ports defined in `pulse-core`:
//! storage, authentication, rate limiting, the publishing gateway and
//! the publish event sink.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory stores only
//! - `postgres` - PostgreSQL storage via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `rate-limit` - Per-key rate limiting via governor

pub mod events;
pub mod memory;
pub mod publisher;

#[cfg(feature = "postgres")]
pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

pub use events::{RecordingEventSink, TracingEventSink};
pub use memory::{InMemoryAnalyticsRepository, InMemoryPostRepository, InMemoryUserRepository};
pub use publisher::SimulatedPublisher;

#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConfig, PostgresAnalyticsRepository, PostgresPostRepository, PostgresUserRepository,
};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{KeyedRateLimiter, RateLimitConfig};
