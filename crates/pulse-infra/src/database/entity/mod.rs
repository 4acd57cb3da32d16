//! SeaORM entities for the `users`, `posts` and `post_analytics` tables.

pub mod analytics;
pub mod post;
pub mod user;
