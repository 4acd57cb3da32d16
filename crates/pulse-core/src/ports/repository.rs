use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Metrics, Post, PostAnalytics, PostStatus, ReactionKind, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Fails with `Constraint` if it already exists.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Find a user by their username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Find a user whose username or email equals `login`.
    async fn find_by_login(&self, login: &str) -> Result<Option<User>, RepoError>;

    async fn list(&self) -> Result<Vec<User>, RepoError>;

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepoError>;
}

/// Outcome of a conditional lifecycle write.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// The write was applied; carries the post as stored afterwards.
    Applied(Post),
    /// The post exists but was not in the expected state.
    Conflict { current: PostStatus },
    NotFound,
}

/// Filters for listing posts.
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub author_id: Option<Uuid>,
    pub status: Option<PostStatus>,
    /// With `status == Scheduled`: `Some(true)` keeps future posts only,
    /// `Some(false)` keeps due ones only.
    pub upcoming_only: Option<bool>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub skip: u64,
    pub limit: u64,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            author_id: None,
            status: None,
            upcoming_only: None,
            created_after: None,
            created_before: None,
            skip: 0,
            limit: 100,
        }
    }
}

impl PostQuery {
    /// Whether `post` passes every filter except paging.
    pub fn matches(&self, post: &Post, now: DateTime<Utc>) -> bool {
        if self.author_id.is_some_and(|a| a != post.author_id) {
            return false;
        }
        if self.status.is_some_and(|s| s != post.status) {
            return false;
        }
        if self.status == Some(PostStatus::Scheduled) {
            if let (Some(upcoming), Some(at)) = (self.upcoming_only, post.scheduled_at) {
                if upcoming != (at > now) {
                    return false;
                }
            }
        }
        if self.created_after.is_some_and(|t| post.created_at < t) {
            return false;
        }
        if self.created_before.is_some_and(|t| post.created_at > t) {
            return false;
        }
        true
    }
}

/// Number of posts in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub draft: u64,
    pub scheduled: u64,
    pub published: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: PostStatus, n: u64) {
        match status {
            PostStatus::Draft => self.draft += n,
            PostStatus::Scheduled => self.scheduled += n,
            PostStatus::Published => self.published += n,
        }
    }

    pub fn total(&self) -> u64 {
        self.draft + self.scheduled + self.published
    }
}

/// Post store. Every lifecycle write is an atomic conditional update keyed
/// on the expected prior status; losers of a race get `Transition::Conflict`.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn list(&self, query: &PostQuery, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError>;

    /// Replace title and/or content without touching lifecycle fields.
    async fn update_content(
        &self,
        id: Uuid,
        title: Option<String>,
        content: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError>;

    /// `Draft | Scheduled -> Scheduled` at `at`.
    async fn schedule(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Transition, RepoError>;

    /// `Scheduled -> Draft`, clearing `scheduled_at`.
    async fn unschedule(&self, id: Uuid, now: DateTime<Utc>) -> Result<Transition, RepoError>;

    /// Scheduled posts with `scheduled_at <= now`.
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError>;

    /// `Scheduled -> Published`, only if still scheduled and due at `now`.
    async fn try_publish(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        external_id: Option<String>,
    ) -> Result<Transition, RepoError>;

    /// Store a failed attempt on a still-scheduled post.
    async fn record_failure(
        &self,
        id: Uuid,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, RepoError>;

    async fn count_by_status(&self) -> Result<StatusCounts, RepoError>;

    /// Scheduled posts with `scheduled_at < cutoff`, oldest first.
    async fn find_overdue(&self, cutoff: DateTime<Utc>) -> Result<Vec<Post>, RepoError>;

    /// Scheduled posts with `from < scheduled_at <= to`.
    async fn count_scheduled_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RepoError>;
}

/// Which analytics rows to join with their posts.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsScope {
    pub author_id: Option<Uuid>,
    pub posts_created_after: Option<DateTime<Utc>>,
}

/// Analytics repository.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Option<PostAnalytics>, RepoError>;

    /// Insert; `Constraint` when the post already has analytics.
    async fn insert(&self, analytics: PostAnalytics) -> Result<PostAnalytics, RepoError>;

    async fn update_metrics(
        &self,
        post_id: Uuid,
        metrics: Metrics,
        now: DateTime<Utc>,
    ) -> Result<Option<PostAnalytics>, RepoError>;

    /// Atomically add `by` to one reaction counter.
    async fn increment_reaction(
        &self,
        post_id: Uuid,
        kind: ReactionKind,
        by: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<PostAnalytics>, RepoError>;

    /// Returns whether a row was removed.
    async fn delete_by_post(&self, post_id: Uuid) -> Result<bool, RepoError>;

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<PostAnalytics>, RepoError>;

    async fn find_with_posts(
        &self,
        scope: &AnalyticsScope,
    ) -> Result<Vec<(PostAnalytics, Post)>, RepoError>;
}
