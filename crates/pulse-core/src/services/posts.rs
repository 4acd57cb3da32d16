//! Post CRUD and lifecycle actions on behalf of an authenticated caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Actor, Post, PostStatus};
use crate::error::DomainError;
use crate::ports::{Clock, PostQuery, PostRepository, Transition};

/// Input for creating a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// What an update does to the publication schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleChange {
    /// Schedule or reschedule; must be in the future.
    At(DateTime<Utc>),
    /// Back to draft if currently scheduled, otherwise nothing.
    Clear,
}

/// Partial update; fields left `None` are untouched.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub schedule: Option<ScheduleChange>,
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { posts, clock }
    }

    pub async fn create(&self, actor: &Actor, input: NewPost) -> Result<Post, DomainError> {
        Post::validate_text(&input.title, &input.content)?;
        let now = self.clock.now();

        let mut post = Post::new(actor.user_id, input.title, input.content, now);
        if let Some(at) = input.scheduled_at {
            ensure_future(at, now)?;
            post.schedule(at, now)?;
        }

        Ok(self.posts.insert(post).await?)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Post, DomainError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))?;

        if !actor.can_access(post.author_id) {
            return Err(DomainError::Forbidden);
        }
        Ok(post)
    }

    /// Non-admins only ever see their own posts.
    pub async fn list(&self, actor: &Actor, mut query: PostQuery) -> Result<Vec<Post>, DomainError> {
        if !actor.is_admin() {
            match query.author_id {
                Some(author) if author != actor.user_id => return Err(DomainError::Forbidden),
                _ => query.author_id = Some(actor.user_id),
            }
        }
        let now = self.clock.now();
        Ok(self.posts.list(&query, now).await?)
    }

    /// Admin-only listing of another user's posts.
    pub async fn list_by_author(
        &self,
        actor: &Actor,
        author_id: Uuid,
        status: Option<PostStatus>,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Post>, DomainError> {
        if !actor.is_admin() {
            return Err(DomainError::Forbidden);
        }
        let query = PostQuery {
            author_id: Some(author_id),
            status,
            skip,
            limit,
            ..PostQuery::default()
        };
        Ok(self.posts.list(&query, self.clock.now()).await?)
    }

    /// Everything is validated before the first write, and the schedule
    /// transition runs before the text edit so a rejected transition leaves
    /// the post untouched.
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: PostChanges,
    ) -> Result<Post, DomainError> {
        let mut post = self.get(actor, id).await?;
        let now = self.clock.now();

        let edits_text = changes.title.is_some() || changes.content.is_some();
        if edits_text {
            Post::validate_text(
                changes.title.as_deref().unwrap_or(&post.title),
                changes.content.as_deref().unwrap_or(&post.content),
            )?;
        }
        if let Some(ScheduleChange::At(at)) = changes.schedule {
            ensure_future(at, now)?;
        }

        match changes.schedule {
            Some(ScheduleChange::At(at)) => {
                let transition = self.posts.schedule(id, at, now).await?;
                post = resolve(transition, "schedule", id)?;
            }
            Some(ScheduleChange::Clear) if post.status == PostStatus::Scheduled => {
                let transition = self.posts.unschedule(id, now).await?;
                post = resolve(transition, "unschedule", id)?;
            }
            Some(ScheduleChange::Clear) | None => {}
        }

        if edits_text {
            post = self
                .posts
                .update_content(id, changes.title, changes.content, now)
                .await?
                .ok_or_else(|| DomainError::post_not_found(id))?;
        }
        Ok(post)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        self.get(actor, id).await?;
        self.posts.delete(id).await.map_err(|e| match e {
            crate::error::RepoError::NotFound => DomainError::post_not_found(id),
            other => other.into(),
        })
    }

    /// `Draft | Scheduled -> Scheduled`; the time must be in the future.
    pub async fn schedule(
        &self,
        actor: &Actor,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Post, DomainError> {
        self.get(actor, id).await?;
        self.apply_schedule(id, at).await
    }

    /// `Scheduled -> Draft`.
    pub async fn unschedule(&self, actor: &Actor, id: Uuid) -> Result<Post, DomainError> {
        self.get(actor, id).await?;
        let transition = self.posts.unschedule(id, self.clock.now()).await?;
        resolve(transition, "unschedule", id)
    }

    async fn apply_schedule(&self, id: Uuid, at: DateTime<Utc>) -> Result<Post, DomainError> {
        let now = self.clock.now();
        ensure_future(at, now)?;
        let transition = self.posts.schedule(id, at, now).await?;
        resolve(transition, "schedule", id)
    }
}

fn ensure_future(at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), DomainError> {
    if at <= now {
        return Err(DomainError::Validation(
            "Cannot schedule post in the past".to_string(),
        ));
    }
    Ok(())
}

fn resolve(transition: Transition, action: &'static str, id: Uuid) -> Result<Post, DomainError> {
    match transition {
        Transition::Applied(post) => Ok(post),
        Transition::Conflict { current } => Err(DomainError::InvalidTransition { action, current }),
        Transition::NotFound => Err(DomainError::post_not_found(id)),
    }
}
