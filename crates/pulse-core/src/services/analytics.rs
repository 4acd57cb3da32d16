//! Engagement metrics per post plus role-filtered aggregates.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::TimeDelta;
use uuid::Uuid;

use crate::domain::{
    Actor, AnalyticsSummary, Metrics, MetricsChanges, Post, PostAnalytics, ReactionKind, TopPost,
    User, preview,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{AnalyticsRepository, AnalyticsScope, Clock, PostRepository, UserRepository};

pub const DEFAULT_TOP_LIMIT: u32 = 5;
pub const MAX_TOP_LIMIT: u32 = 50;
pub const DEFAULT_SUMMARY_DAYS: u32 = 30;
pub const MAX_DAYS: u32 = 365;
pub const MAX_LIST_LIMIT: u64 = 1000;

pub struct AnalyticsService {
    analytics: Arc<dyn AnalyticsRepository>,
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl AnalyticsService {
    pub fn new(
        analytics: Arc<dyn AnalyticsRepository>,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            analytics,
            posts,
            users,
            clock,
        }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        post_id: Uuid,
        metrics: Metrics,
    ) -> Result<PostAnalytics, DomainError> {
        metrics.validate()?;
        self.accessible_post(actor, post_id).await?;

        let record = PostAnalytics::new(post_id, metrics, self.clock.now());
        self.analytics.insert(record).await.map_err(|e| match e {
            RepoError::Constraint(_) => {
                DomainError::Duplicate("Analytics already exist for this post".to_string())
            }
            other => other.into(),
        })
    }

    pub async fn get(&self, actor: &Actor, post_id: Uuid) -> Result<PostAnalytics, DomainError> {
        self.accessible_post(actor, post_id).await?;
        self.analytics
            .find_by_post(post_id)
            .await?
            .ok_or_else(|| DomainError::analytics_not_found(post_id))
    }

    pub async fn update(
        &self,
        actor: &Actor,
        post_id: Uuid,
        changes: MetricsChanges,
    ) -> Result<PostAnalytics, DomainError> {
        let existing = self.get(actor, post_id).await?;
        let mut metrics = existing.metrics;
        changes.apply(&mut metrics);
        metrics.validate()?;

        self.analytics
            .update_metrics(post_id, metrics, self.clock.now())
            .await?
            .ok_or_else(|| DomainError::analytics_not_found(post_id))
    }

    pub async fn delete(&self, actor: &Actor, post_id: Uuid) -> Result<(), DomainError> {
        self.accessible_post(actor, post_id).await?;
        self.remove(post_id).await
    }

    pub async fn increment_reaction(
        &self,
        actor: &Actor,
        post_id: Uuid,
        kind: ReactionKind,
        by: i64,
    ) -> Result<PostAnalytics, DomainError> {
        if by < 1 {
            return Err(DomainError::Validation(
                "increment must be at least 1".to_string(),
            ));
        }
        self.accessible_post(actor, post_id).await?;
        self.analytics
            .increment_reaction(post_id, kind, by, self.clock.now())
            .await?
            .ok_or_else(|| DomainError::analytics_not_found(post_id))
    }

    /// Posts ranked by total engagement, highest first.
    pub async fn top_posts(
        &self,
        actor: &Actor,
        limit: Option<u32>,
        days_back: Option<u32>,
    ) -> Result<Vec<TopPost>, DomainError> {
        let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT);
        if !(1..=MAX_TOP_LIMIT).contains(&limit) {
            return Err(DomainError::Validation(format!(
                "limit must be between 1 and {MAX_TOP_LIMIT}"
            )));
        }
        if let Some(days) = days_back {
            check_days(days)?;
        }

        let mut rows = self.analytics.find_with_posts(&self.scope(actor, days_back)).await?;
        rows.sort_by(|(a, _), (b, _)| b.metrics.total_engagement().cmp(&a.metrics.total_engagement()));
        rows.truncate(limit as usize);

        let mut authors: HashMap<Uuid, Option<User>> = HashMap::new();
        let mut top = Vec::with_capacity(rows.len());
        for (analytics, post) in rows {
            if !authors.contains_key(&post.author_id) {
                let author = self.users.find_by_id(post.author_id).await?;
                authors.insert(post.author_id, author);
            }
            let author = authors.get(&post.author_id).and_then(Option::as_ref);
            top.push(to_top_post(analytics, post, author));
        }
        Ok(top)
    }

    pub async fn summary(
        &self,
        actor: &Actor,
        days: Option<u32>,
    ) -> Result<AnalyticsSummary, DomainError> {
        let days = days.unwrap_or(DEFAULT_SUMMARY_DAYS);
        check_days(days)?;

        let rows = self.analytics.find_with_posts(&self.scope(actor, Some(days))).await?;
        Ok(AnalyticsSummary::from_metrics(
            days,
            rows.iter().map(|(a, _)| &a.metrics),
        ))
    }

    pub async fn list_all(
        &self,
        actor: &Actor,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostAnalytics>, DomainError> {
        require_admin(actor)?;
        if !(1..=MAX_LIST_LIMIT).contains(&limit) {
            return Err(DomainError::Validation(format!(
                "limit must be between 1 and {MAX_LIST_LIMIT}"
            )));
        }
        Ok(self.analytics.list(offset, limit).await?)
    }

    pub async fn admin_delete(&self, actor: &Actor, post_id: Uuid) -> Result<(), DomainError> {
        require_admin(actor)?;
        self.remove(post_id).await
    }

    async fn remove(&self, post_id: Uuid) -> Result<(), DomainError> {
        if self.analytics.delete_by_post(post_id).await? {
            Ok(())
        } else {
            Err(DomainError::analytics_not_found(post_id))
        }
    }

    async fn accessible_post(&self, actor: &Actor, post_id: Uuid) -> Result<Post, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(post_id))?;
        if !actor.can_access(post.author_id) {
            return Err(DomainError::Forbidden);
        }
        Ok(post)
    }

    fn scope(&self, actor: &Actor, days: Option<u32>) -> AnalyticsScope {
        AnalyticsScope {
            author_id: (!actor.is_admin()).then_some(actor.user_id),
            posts_created_after: days.map(|d| self.clock.now() - TimeDelta::days(i64::from(d))),
        }
    }
}

fn check_days(days: u32) -> Result<(), DomainError> {
    if !(1..=MAX_DAYS).contains(&days) {
        return Err(DomainError::Validation(format!(
            "days must be between 1 and {MAX_DAYS}"
        )));
    }
    Ok(())
}

fn require_admin(actor: &Actor) -> Result<(), DomainError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

fn to_top_post(analytics: PostAnalytics, post: Post, author: Option<&User>) -> TopPost {
    TopPost {
        post_id: post.id,
        content_preview: preview(&post.content),
        title: post.title,
        author_username: author.map(|u| u.username.clone()).unwrap_or_default(),
        author_full_name: author.and_then(|u| u.full_name.clone()),
        metrics: analytics.metrics,
    }
}
