use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Maximum length of a post title.
pub const MAX_TITLE_LEN: usize = 500;

/// Publication lifecycle of a post.
///
/// `Draft -> Scheduled -> Published`, with `Scheduled -> Draft` on unschedule.
/// Nothing leaves `Published`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
}

impl PostStatus {
    pub const ALL: [PostStatus; 3] = [Self::Draft, Self::Scheduled, Self::Published];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
        }
    }

    /// Whether `schedule` is a legal transition from this status.
    pub fn can_schedule(&self) -> bool {
        matches!(self, Self::Draft | Self::Scheduled)
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "published" => Ok(Self::Published),
            other => Err(DomainError::Validation(format!(
                "Unknown post status: {other}"
            ))),
        }
    }
}

/// Post entity - a unit of content with a publication lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    /// Present iff `status == Scheduled`.
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Present iff `status == Published`.
    pub published_at: Option<DateTime<Utc>>,
    /// Identifier assigned by the publishing gateway.
    pub external_id: Option<String>,
    pub last_error: Option<String>,
    pub publish_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft post.
    pub fn new(author_id: Uuid, title: String, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            title,
            content,
            status: PostStatus::Draft,
            scheduled_at: None,
            published_at: None,
            external_id: None,
            last_error: None,
            publish_attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check title and content constraints.
    pub fn validate_text(title: &str, content: &str) -> Result<(), DomainError> {
        let title_len = title.trim().chars().count();
        if title_len == 0 || title.chars().count() > MAX_TITLE_LEN {
            return Err(DomainError::Validation(format!(
                "Title must be between 1 and {MAX_TITLE_LEN} characters"
            )));
        }
        if content.trim().is_empty() {
            return Err(DomainError::Validation(
                "Content must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// `Draft | Scheduled -> Scheduled`. Clears the failure bookkeeping.
    pub fn schedule(&mut self, at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.status.can_schedule() {
            return Err(DomainError::InvalidTransition {
                action: "schedule",
                current: self.status,
            });
        }
        self.status = PostStatus::Scheduled;
        self.scheduled_at = Some(at);
        self.last_error = None;
        self.publish_attempts = 0;
        self.updated_at = now;
        Ok(())
    }

    /// `Scheduled -> Draft`. Always clears `scheduled_at`.
    pub fn unschedule(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != PostStatus::Scheduled {
            return Err(DomainError::InvalidTransition {
                action: "unschedule",
                current: self.status,
            });
        }
        self.status = PostStatus::Draft;
        self.scheduled_at = None;
        self.updated_at = now;
        Ok(())
    }

    /// `Scheduled -> Published`, only once the post is due.
    pub fn publish(
        &mut self,
        now: DateTime<Utc>,
        external_id: Option<String>,
    ) -> Result<(), DomainError> {
        if !self.is_due(now) {
            return Err(DomainError::InvalidTransition {
                action: "publish",
                current: self.status,
            });
        }
        self.status = PostStatus::Published;
        self.scheduled_at = None;
        self.published_at = Some(now);
        self.external_id = external_id;
        self.last_error = None;
        self.updated_at = now;
        Ok(())
    }

    /// Record a failed publish attempt. The post stays scheduled.
    pub fn record_failure(&mut self, error: &str, now: DateTime<Utc>) -> Result<u32, DomainError> {
        if self.status != PostStatus::Scheduled {
            return Err(DomainError::InvalidTransition {
                action: "record a publish failure for",
                current: self.status,
            });
        }
        self.publish_attempts += 1;
        self.last_error = Some(error.to_string());
        self.updated_at = now;
        Ok(self.publish_attempts)
    }

    /// Scheduled with `scheduled_at <= now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Scheduled && self.scheduled_at.is_some_and(|at| at <= now)
    }

    /// Whether the timestamp fields agree with the status.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            PostStatus::Draft => self.scheduled_at.is_none() && self.published_at.is_none(),
            PostStatus::Scheduled => self.scheduled_at.is_some() && self.published_at.is_none(),
            PostStatus::Published => self.scheduled_at.is_none() && self.published_at.is_some(),
        }
    }
}
