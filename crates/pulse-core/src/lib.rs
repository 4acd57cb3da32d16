//! # Pulse Core
//!
//! Domain layer of Post Pulse: posts, their draft/scheduled/published
//! lifecycle, engagement analytics and the scheduler that publishes due posts.
//! Pure business logic; storage, auth and the publishing gateway are ports.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
