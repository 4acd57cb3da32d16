use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use pulse_core::domain::{Post, PostStatus};
use pulse_core::error::{DomainError, RepoError};
use pulse_core::ports::{BaseRepository, PostQuery, PostRepository, StatusCounts, Transition};

/// In-memory post store. Lifecycle writes reuse the domain transitions
/// under the store's write lock.
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored post, unordered.
    pub async fn all(&self) -> Vec<Post> {
        self.posts.read().await.values().cloned().collect()
    }

    async fn transition<F>(&self, id: Uuid, apply: F) -> Transition
    where
        F: FnOnce(&mut Post) -> Result<(), DomainError> + Send,
    {
        let mut posts = self.posts.write().await;
        let Some(stored) = posts.get_mut(&id) else {
            return Transition::NotFound;
        };

        let mut next = stored.clone();
        match apply(&mut next) {
            Ok(()) => {
                *stored = next.clone();
                Transition::Applied(next)
            }
            Err(_) => Transition::Conflict {
                current: stored.status,
            },
        }
    }

    async fn scheduled_where<F>(&self, keep: F) -> Vec<Post>
    where
        F: Fn(DateTime<Utc>) -> bool + Send,
    {
        let posts = self.posts.read().await;
        let mut found: Vec<Post> = posts
            .values()
            .filter(|p| p.status == PostStatus::Scheduled && p.scheduled_at.is_some_and(&keep))
            .cloned()
            .collect();
        found.sort_by_key(|p| p.scheduled_at);
        found
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("Post already exists".to_string()));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(&self, query: &PostQuery, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        let posts = self.posts.read().await;
        let mut found: Vec<Post> = posts
            .values()
            .filter(|p| query.matches(p, now))
            .cloned()
            .collect();

        if query.status == Some(PostStatus::Scheduled) {
            found.sort_by_key(|p| p.scheduled_at);
        } else {
            found.sort_by_key(|p| Reverse(p.created_at));
        }

        Ok(found
            .into_iter()
            .skip(query.skip as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn update_content(
        &self,
        id: Uuid,
        title: Option<String>,
        content: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = title {
            post.title = title;
        }
        if let Some(content) = content {
            post.content = content;
        }
        post.updated_at = now;
        Ok(Some(post.clone()))
    }

    async fn schedule(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Transition, RepoError> {
        Ok(self.transition(id, |p| p.schedule(at, now)).await)
    }

    async fn unschedule(&self, id: Uuid, now: DateTime<Utc>) -> Result<Transition, RepoError> {
        Ok(self.transition(id, |p| p.unschedule(now)).await)
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        Ok(self.scheduled_where(|at| at <= now).await)
    }

    async fn try_publish(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        external_id: Option<String>,
    ) -> Result<Transition, RepoError> {
        Ok(self.transition(id, |p| p.publish(now, external_id)).await)
    }

    async fn record_failure(
        &self,
        id: Uuid,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, RepoError> {
        Ok(self
            .transition(id, |p| p.record_failure(error, now).map(|_| ()))
            .await)
    }

    async fn count_by_status(&self) -> Result<StatusCounts, RepoError> {
        let mut counts = StatusCounts::default();
        for post in self.posts.read().await.values() {
            counts.add(post.status, 1);
        }
        Ok(counts)
    }

    async fn find_overdue(&self, cutoff: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        Ok(self.scheduled_where(|at| at < cutoff).await)
    }

    async fn count_scheduled_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RepoError> {
        Ok(self.scheduled_where(|at| at > from && at <= to).await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn draft(now: DateTime<Utc>) -> Post {
        Post::new(Uuid::new_v4(), "Title".into(), "Body".into(), now)
    }

    #[tokio::test]
    async fn publish_requires_due_scheduled_post() {
        let repo = InMemoryPostRepository::new();
        let now = Utc::now();
        let post = repo.insert(draft(now)).await.unwrap();

        let early = repo.try_publish(post.id, now, None).await.unwrap();
        assert_eq!(early, Transition::Conflict { current: PostStatus::Draft });

        let at = now + TimeDelta::minutes(5);
        repo.schedule(post.id, at, now).await.unwrap();
        let not_due = repo.try_publish(post.id, now, None).await.unwrap();
        assert_eq!(not_due, Transition::Conflict { current: PostStatus::Scheduled });

        let published = repo.try_publish(post.id, at, Some("ext".into())).await.unwrap();
        let Transition::Applied(stored) = published else {
            panic!("expected publish to apply");
        };
        assert_eq!(stored.status, PostStatus::Published);
        assert_eq!(stored.scheduled_at, None);
        assert_eq!(stored.external_id.as_deref(), Some("ext"));
    }

    #[tokio::test]
    async fn missing_post_reports_not_found() {
        let repo = InMemoryPostRepository::new();
        let result = repo.unschedule(Uuid::new_v4(), Utc::now()).await.unwrap();
        assert_eq!(result, Transition::NotFound);
    }

    #[tokio::test]
    async fn due_posts_are_ordered_oldest_first() {
        let repo = InMemoryPostRepository::new();
        let now = Utc::now();
        let mut ids = Vec::new();
        for minutes in [3, 1, 2] {
            let post = repo.insert(draft(now)).await.unwrap();
            repo.schedule(post.id, now + TimeDelta::minutes(minutes), now)
                .await
                .unwrap();
            ids.push((minutes, post.id));
        }
        ids.sort();

        let due = repo.find_due(now + TimeDelta::minutes(10)).await.unwrap();
        let due_ids: Vec<Uuid> = due.iter().map(|p| p.id).collect();
        assert_eq!(due_ids, ids.into_iter().map(|(_, id)| id).collect::<Vec<_>>());
    }
}
