//! Response bodies shared by every endpoint.
//!
//! Errors are RFC 7807 problem details. The `type` member names a problem
//! class under `/problems/` so clients can tell a duplicate apart from an
//! illegal status transition even though both are `409`.

use serde::{Deserialize, Serialize};

/// Body for operations that only acknowledge success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Problem classes exposed in the `type` member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemType {
    Validation,
    Authentication,
    Permission,
    NotFound,
    Duplicate,
    InvalidTransition,
    RateLimited,
    Unavailable,
    Internal,
}

impl ProblemType {
    pub fn uri(self) -> &'static str {
        match self {
            Self::Validation => "/problems/validation",
            Self::Authentication => "/problems/authentication",
            Self::Permission => "/problems/permission",
            Self::NotFound => "/problems/not-found",
            Self::Duplicate => "/problems/duplicate",
            Self::InvalidTransition => "/problems/invalid-transition",
            Self::RateLimited => "/problems/rate-limited",
            Self::Unavailable => "/problems/unavailable",
            Self::Internal => "/problems/internal",
        }
    }

    /// Status code a problem of this class is served with.
    pub fn status(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Authentication => 401,
            Self::Permission => 403,
            Self::NotFound => 404,
            Self::Duplicate | Self::InvalidTransition => 409,
            Self::RateLimited => 429,
            Self::Unavailable => 503,
            Self::Internal => 500,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Validation => "Bad Request",
            Self::Authentication => "Unauthorized",
            Self::Permission => "Forbidden",
            Self::NotFound => "Not Found",
            Self::Duplicate | Self::InvalidTransition => "Conflict",
            Self::RateLimited => "Too Many Requests",
            Self::Unavailable => "Service Unavailable",
            Self::Internal => "Internal Server Error",
        }
    }
}

/// RFC 7807 problem details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn new(problem: ProblemType) -> Self {
        Self {
            error_type: problem.uri().to_string(),
            title: problem.title().to_string(),
            status: problem.status(),
            detail: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn too_many_requests(retry_after_secs: u64) -> Self {
        Self::new(ProblemType::RateLimited)
            .with_detail(format!("Rate limit exceeded, retry in {retry_after_secs}s"))
    }
}
