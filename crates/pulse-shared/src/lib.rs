//! # Pulse Shared
//!
//! Wire types of the Post Pulse HTTP API. Kept free of domain types so API
//! clients can depend on it without pulling in the backend.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, MessageResponse, ProblemType};
