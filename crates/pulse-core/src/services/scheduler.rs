//! Post lifecycle scheduler.
//!
//! A tick reads every due post (scheduled, `scheduled_at <= now`), hands each
//! one to the publishing gateway and then moves it to `Published` through the
//! store's conditional update. Posts are processed independently and
//! concurrently; one post failing never stops the others. Only a failed read
//! of the due set aborts a tick.
//!
//! Ticks never overlap: the periodic runner uses [`PublishScheduler::try_tick`],
//! which skips while a tick is in flight, and manual triggers use
//! [`PublishScheduler::tick`], which waits for it.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use tokio::sync::{Mutex, Semaphore};

use crate::domain::Post;
use crate::error::{ConfigError, RepoError, SchedulerError};
use crate::ports::{
    Clock, PostPublisher, PostRepository, PublishEventSink, PublishOutcome, PublishRecord,
    StatusCounts, Transition,
};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Tuning knobs for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    interval: Duration,
    /// Maximum publish attempts processed at once within a tick.
    pub max_concurrency: usize,
    /// Failed attempts after which a post goes back to draft. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl SchedulerSettings {
    pub fn new(interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::NonPositiveInterval);
        }
        Ok(Self {
            interval,
            max_concurrency: 4,
            max_attempts: None,
        })
    }

    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    pub fn with_max_attempts(mut self, max: Option<u32>) -> Self {
        self.max_attempts = max.filter(|m| *m > 0);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_TICK_INTERVAL,
            max_concurrency: 4,
            max_attempts: None,
        }
    }
}

/// Everything that happened in one tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub started_at: DateTime<Utc>,
    pub records: Vec<PublishRecord>,
}

impl TickReport {
    pub fn processed(&self) -> usize {
        self.records.len()
    }

    pub fn published(&self) -> usize {
        self.count(|o| matches!(o, PublishOutcome::Published { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, PublishOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, PublishOutcome::Failed { .. }))
    }

    fn count(&self, outcome: impl Fn(&PublishOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| outcome(&r.outcome)).count()
    }
}

/// Health snapshot for admins.
#[derive(Debug, Clone)]
pub struct SchedulerStats {
    pub counts: StatusCounts,
    /// Scheduled posts that missed at least one tick interval.
    pub overdue: u64,
    pub upcoming_24h: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub interval: Duration,
}

pub struct PublishScheduler {
    posts: Arc<dyn PostRepository>,
    publisher: Arc<dyn PostPublisher>,
    events: Arc<dyn PublishEventSink>,
    clock: Arc<dyn Clock>,
    settings: SchedulerSettings,
    tick_lock: Mutex<()>,
    last_tick_at: RwLock<Option<DateTime<Utc>>>,
}

impl PublishScheduler {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        publisher: Arc<dyn PostPublisher>,
        events: Arc<dyn PublishEventSink>,
        clock: Arc<dyn Clock>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            posts,
            publisher,
            events,
            clock,
            settings,
            tick_lock: Mutex::new(()),
            last_tick_at: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Run a tick, waiting for any in-flight tick to finish first.
    pub async fn tick(&self) -> Result<TickReport, SchedulerError> {
        let _guard = self.tick_lock.lock().await;
        self.run_tick().await
    }

    /// Run a tick unless one is already in flight.
    pub async fn try_tick(&self) -> Option<Result<TickReport, SchedulerError>> {
        let _guard = self.tick_lock.try_lock().ok()?;
        Some(self.run_tick().await)
    }

    /// Wait until no tick is running.
    pub async fn wait_idle(&self) {
        drop(self.tick_lock.lock().await);
    }

    /// Timestamp of the last tick that completed.
    pub fn last_tick_at(&self) -> Option<DateTime<Utc>> {
        *self.last_tick_at.read().unwrap_or_else(|e| e.into_inner())
    }

    pub async fn stats(&self) -> Result<SchedulerStats, RepoError> {
        let now = self.clock.now();
        let counts = self.posts.count_by_status().await?;
        let overdue = self
            .posts
            .find_overdue(cutoff(now, self.settings.interval))
            .await?
            .len() as u64;
        let upcoming_24h = self
            .posts
            .count_scheduled_between(now, now + TimeDelta::hours(24))
            .await?;

        Ok(SchedulerStats {
            counts,
            overdue,
            upcoming_24h,
            last_tick_at: self.last_tick_at(),
            interval: self.settings.interval,
        })
    }

    /// Scheduled posts whose time passed more than `threshold` ago
    /// (default: one tick interval).
    pub async fn overdue_posts(&self, threshold: Option<Duration>) -> Result<Vec<Post>, RepoError> {
        let threshold = threshold.unwrap_or(self.settings.interval);
        self.posts
            .find_overdue(cutoff(self.clock.now(), threshold))
            .await
    }

    async fn run_tick(&self) -> Result<TickReport, SchedulerError> {
        let now = self.clock.now();
        let due = self
            .posts
            .find_due(now)
            .await
            .map_err(SchedulerError::StoreRead)?;

        let permits = Semaphore::new(self.settings.max_concurrency.max(1));
        let attempts: Vec<_> = due
            .into_iter()
            .map(|post| self.process(post, now, &permits))
            .collect();
        let records = join_all(attempts).await;

        *self.last_tick_at.write().unwrap_or_else(|e| e.into_inner()) = Some(now);
        Ok(TickReport {
            started_at: now,
            records,
        })
    }

    async fn process(&self, post: Post, now: DateTime<Utc>, permits: &Semaphore) -> PublishRecord {
        let _permit = permits.acquire().await.ok();

        let outcome = match self.publisher.publish(&post).await {
            Ok(external_id) => {
                match self
                    .posts
                    .try_publish(post.id, now, Some(external_id.clone()))
                    .await
                {
                    Ok(Transition::Applied(_)) => PublishOutcome::Published {
                        external_id: Some(external_id),
                    },
                    Ok(Transition::Conflict { current }) => PublishOutcome::Skipped {
                        reason: format!("post is {current} and no longer due"),
                    },
                    Ok(Transition::NotFound) => PublishOutcome::Skipped {
                        reason: "post no longer exists".to_string(),
                    },
                    Err(e) => self.fail(&post, e.to_string(), now).await,
                }
            }
            Err(e) => self.fail(&post, e.to_string(), now).await,
        };

        let record = PublishRecord {
            post_id: post.id,
            outcome,
            at: now,
        };
        self.events.record(&record);
        record
    }

    async fn fail(&self, post: &Post, error: String, now: DateTime<Utc>) -> PublishOutcome {
        let attempts = match self.posts.record_failure(post.id, &error, now).await {
            Ok(Transition::Applied(stored)) => Some(stored.publish_attempts),
            Ok(Transition::Conflict { current }) => {
                tracing::warn!(post_id = %post.id, %current, "Failure not recorded, post changed");
                None
            }
            Ok(Transition::NotFound) => {
                tracing::warn!(post_id = %post.id, "Failure not recorded, post is gone");
                None
            }
            Err(e) => {
                tracing::warn!(post_id = %post.id, error = %e, "Failed to record publish failure");
                None
            }
        };

        let exhausted = matches!(
            (attempts, self.settings.max_attempts),
            (Some(n), Some(max)) if n >= max
        );
        let reverted_to_draft = exhausted
            && matches!(
                self.posts.unschedule(post.id, now).await,
                Ok(Transition::Applied(_))
            );

        PublishOutcome::Failed {
            error,
            attempts,
            reverted_to_draft,
        }
    }
}

fn cutoff(now: DateTime<Utc>, threshold: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(threshold)
        .ok()
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
