use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use pulse_core::domain::{Metrics, Post, PostAnalytics, ReactionKind};
use pulse_core::error::RepoError;
use pulse_core::ports::{AnalyticsRepository, AnalyticsScope, BaseRepository};

use super::InMemoryPostRepository;

/// In-memory analytics store keyed by post id.
pub struct InMemoryAnalyticsRepository {
    rows: RwLock<HashMap<Uuid, PostAnalytics>>,
    posts: Arc<InMemoryPostRepository>,
}

impl InMemoryAnalyticsRepository {
    pub fn new(posts: Arc<InMemoryPostRepository>) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            posts,
        }
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryAnalyticsRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Option<PostAnalytics>, RepoError> {
        Ok(self.rows.read().await.get(&post_id).cloned())
    }

    async fn insert(&self, analytics: PostAnalytics) -> Result<PostAnalytics, RepoError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&analytics.post_id) {
            return Err(RepoError::Constraint(
                "Analytics already exist for this post".to_string(),
            ));
        }
        rows.insert(analytics.post_id, analytics.clone());
        Ok(analytics)
    }

    async fn update_metrics(
        &self,
        post_id: Uuid,
        metrics: Metrics,
        now: DateTime<Utc>,
    ) -> Result<Option<PostAnalytics>, RepoError> {
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(&post_id).map(|row| {
            row.metrics = metrics;
            row.updated_at = now;
            row.clone()
        }))
    }

    async fn increment_reaction(
        &self,
        post_id: Uuid,
        kind: ReactionKind,
        by: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<PostAnalytics>, RepoError> {
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(&post_id).map(|row| {
            row.metrics.add_reaction(kind, by);
            row.updated_at = now;
            row.clone()
        }))
    }

    async fn delete_by_post(&self, post_id: Uuid) -> Result<bool, RepoError> {
        Ok(self.rows.write().await.remove(&post_id).is_some())
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<PostAnalytics>, RepoError> {
        let mut all: Vec<PostAnalytics> = self.rows.read().await.values().cloned().collect();
        all.sort_by_key(|a| a.created_at);
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find_with_posts(
        &self,
        scope: &AnalyticsScope,
    ) -> Result<Vec<(PostAnalytics, Post)>, RepoError> {
        let rows: Vec<PostAnalytics> = self.rows.read().await.values().cloned().collect();

        let mut joined = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(post) = self.posts.find_by_id(row.post_id).await? else {
                continue;
            };
            if scope.author_id.is_some_and(|a| a != post.author_id) {
                continue;
            }
            if scope.posts_created_after.is_some_and(|t| post.created_at < t) {
                continue;
            }
            joined.push((row, post));
        }
        Ok(joined)
    }
}
