//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod clock;
mod events;
mod publisher;
mod rate_limit;
mod repository;

pub use auth::{AuthError, IssuedToken, PasswordService, TokenClaims, TokenService};
pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{PublishEventSink, PublishOutcome, PublishRecord};
pub use publisher::{PostPublisher, PublishError};
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use repository::{
    AnalyticsRepository, AnalyticsScope, BaseRepository, PostQuery, PostRepository,
    StatusCounts, Transition, UserRepository,
};
