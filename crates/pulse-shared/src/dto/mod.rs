//! Data Transfer Objects - request/response types for the API.

pub mod analytics;
pub mod auth;
pub mod posts;
pub mod scheduler;

pub use analytics::*;
pub use auth::*;
pub use posts::*;
pub use scheduler::*;
