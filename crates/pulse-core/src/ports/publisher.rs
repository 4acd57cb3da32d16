//! Publishing gateway port - hands a due post to the social network.

use async_trait::async_trait;

use crate::domain::Post;

#[async_trait]
pub trait PostPublisher: Send + Sync {
    /// Publish the post externally and return the remote identifier.
    async fn publish(&self, post: &Post) -> Result<String, PublishError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Gateway rejected post: {0}")]
    Rejected(String),

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}
