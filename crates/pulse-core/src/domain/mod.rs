//! Domain entities - the core business objects.

mod analytics;
mod post;
mod user;

pub use analytics::{
    AnalyticsSummary, Metrics, MetricsChanges, PostAnalytics, ReactionKind, TopPost, preview,
};
pub use post::{MAX_TITLE_LEN, Post, PostStatus};
pub use user::{Actor, User, UserRole};
