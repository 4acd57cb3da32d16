//! Publishing gateway adapters.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use pulse_core::domain::Post;
use pulse_core::ports::{PostPublisher, PublishError};

/// Stands in for the LinkedIn API: waits `delay`, then returns an
/// external id of the form `linkedin_<post-id>_<unix-ts>`.
#[derive(Debug, Clone)]
pub struct SimulatedPublisher {
    delay: Duration,
}

impl SimulatedPublisher {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedPublisher {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

#[async_trait]
impl PostPublisher for SimulatedPublisher {
    async fn publish(&self, post: &Post) -> Result<String, PublishError> {
        tracing::debug!(post_id = %post.id, delay_ms = self.delay.as_millis() as u64, "Publishing post");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(format!("linkedin_{}_{}", post.id, Utc::now().timestamp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn external_id_embeds_post_id() {
        let post = Post::new(Uuid::new_v4(), "T".into(), "C".into(), Utc::now());
        let publisher = SimulatedPublisher::new(Duration::ZERO);

        let id = publisher.publish(&post).await.unwrap();
        assert!(id.starts_with(&format!("linkedin_{}_", post.id)));
    }
}
