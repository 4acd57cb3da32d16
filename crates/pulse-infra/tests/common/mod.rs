#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Notify;

use pulse_core::domain::{Actor, Post, User, UserRole};
use pulse_core::ports::{BaseRepository, ManualClock, PostPublisher, PublishError};
use pulse_infra::InMemoryUserRepository;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(start_time()))
}

pub async fn register(users: &InMemoryUserRepository, username: &str, role: UserRole) -> Actor {
    let user = User::new(
        format!("{username}@example.com"),
        username.to_string(),
        Some(format!("{username} tester")),
        "hash".to_string(),
        role,
    );
    let stored = users.insert(user).await.unwrap();
    Actor::new(stored.id, stored.role)
}

/// Publisher that succeeds immediately and counts calls.
#[derive(Default)]
pub struct CountingPublisher {
    pub calls: AtomicUsize,
}

#[async_trait]
impl PostPublisher for CountingPublisher {
    async fn publish(&self, post: &Post) -> Result<String, PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("linkedin_{}", post.id))
    }
}

/// Publisher whose gateway is always down.
#[derive(Default)]
pub struct FailingPublisher;

#[async_trait]
impl PostPublisher for FailingPublisher {
    async fn publish(&self, _post: &Post) -> Result<String, PublishError> {
        Err(PublishError::Unavailable("connection refused".to_string()))
    }
}

/// Publisher that signals `started` and then blocks until `release`.
#[derive(Default)]
pub struct GatedPublisher {
    pub started: Notify,
    pub release: Notify,
}

#[async_trait]
impl PostPublisher for GatedPublisher {
    async fn publish(&self, post: &Post) -> Result<String, PublishError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(format!("linkedin_{}", post.id))
    }
}
