mod common;

use std::sync::Arc;

use chrono::TimeDelta;

use common::{clock, register};
use pulse_core::DomainError;
use pulse_core::domain::{Actor, Metrics, MetricsChanges, Post, ReactionKind, UserRole};
use pulse_core::ports::{BaseRepository, Clock, ManualClock};
use pulse_core::services::AnalyticsService;
use pulse_infra::{InMemoryAnalyticsRepository, InMemoryPostRepository, InMemoryUserRepository};

struct Fixture {
    service: AnalyticsService,
    posts: Arc<InMemoryPostRepository>,
    clock: Arc<ManualClock>,
    alice: Actor,
    bob: Actor,
    admin: Actor,
}

async fn fixture() -> Fixture {
    let users = Arc::new(InMemoryUserRepository::new());
    let posts = Arc::new(InMemoryPostRepository::new());
    let clock = clock();
    let alice = register(&users, "alice", UserRole::User).await;
    let bob = register(&users, "bob", UserRole::User).await;
    let admin = register(&users, "root", UserRole::Admin).await;
    let service = AnalyticsService::new(
        Arc::new(InMemoryAnalyticsRepository::new(posts.clone())),
        posts.clone(),
        users,
        clock.clone(),
    );
    Fixture {
        service,
        posts,
        clock,
        alice,
        bob,
        admin,
    }
}

impl Fixture {
    async fn post(&self, owner: &Actor, content: &str) -> Post {
        let post = Post::new(
            owner.user_id,
            "Title".into(),
            content.into(),
            self.clock.now(),
        );
        self.posts.insert(post).await.unwrap()
    }
}

fn metrics(likes: i64, impressions: i64, shares: i64) -> Metrics {
    Metrics {
        reactions_like: likes,
        total_impressions: impressions,
        total_shares: shares,
        ..Metrics::default()
    }
}

#[tokio::test]
async fn one_record_per_post() {
    let f = fixture().await;
    let post = f.post(&f.alice, "hello").await;

    f.service
        .create(&f.alice, post.id, metrics(1, 10, 0))
        .await
        .unwrap();
    let again = f.service.create(&f.alice, post.id, metrics(1, 10, 0)).await;

    assert!(matches!(again, Err(DomainError::Duplicate(_))));
}

#[tokio::test]
async fn negative_counts_are_rejected() {
    let f = fixture().await;
    let post = f.post(&f.alice, "hello").await;

    let result = f.service.create(&f.alice, post.id, metrics(-1, 0, 0)).await;

    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn partial_update_and_increment() {
    let f = fixture().await;
    let post = f.post(&f.alice, "hello").await;
    f.service
        .create(&f.alice, post.id, metrics(3, 100, 1))
        .await
        .unwrap();

    let updated = f
        .service
        .update(
            &f.alice,
            post.id,
            MetricsChanges {
                total_impressions: Some(200),
                ..MetricsChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.metrics.total_impressions, 200);
    assert_eq!(updated.metrics.reactions_like, 3);

    let bumped = f
        .service
        .increment_reaction(&f.alice, post.id, ReactionKind::Praise, 4)
        .await
        .unwrap();
    assert_eq!(bumped.metrics.reactions_praise, 4);
    assert_eq!(bumped.metrics.total_reactions(), 7);

    let zero = f
        .service
        .increment_reaction(&f.alice, post.id, ReactionKind::Like, 0)
        .await;
    assert!(matches!(zero, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn other_users_are_forbidden() {
    let f = fixture().await;
    let post = f.post(&f.alice, "hello").await;
    f.service
        .create(&f.alice, post.id, metrics(1, 1, 1))
        .await
        .unwrap();

    assert!(matches!(
        f.service.get(&f.bob, post.id).await,
        Err(DomainError::Forbidden)
    ));
    assert!(f.service.get(&f.admin, post.id).await.is_ok());
}

#[tokio::test]
async fn top_posts_rank_by_engagement_and_respect_roles() {
    let f = fixture().await;
    let low = f.post(&f.alice, "low").await;
    let high = f.post(&f.alice, &"long ".repeat(60)).await;
    let bobs = f.post(&f.bob, "bob's").await;
    f.service.create(&f.alice, low.id, metrics(1, 10, 0)).await.unwrap();
    f.service.create(&f.alice, high.id, metrics(50, 10, 5)).await.unwrap();
    f.service.create(&f.bob, bobs.id, metrics(100, 10, 0)).await.unwrap();

    let alice_top = f.service.top_posts(&f.alice, None, None).await.unwrap();
    let admin_top = f.service.top_posts(&f.admin, Some(1), None).await.unwrap();

    let ids: Vec<_> = alice_top.iter().map(|t| t.post_id).collect();
    assert_eq!(ids, vec![high.id, low.id]);
    assert!(alice_top[0].content_preview.ends_with("..."));
    assert_eq!(alice_top[0].author_username, "alice");
    assert_eq!(admin_top.len(), 1);
    assert_eq!(admin_top[0].post_id, bobs.id);

    let bad_limit = f.service.top_posts(&f.alice, Some(51), None).await;
    assert!(matches!(bad_limit, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn summary_covers_recent_posts_only() {
    let f = fixture().await;
    let old = f.post(&f.alice, "old").await;
    f.service.create(&f.alice, old.id, metrics(10, 100, 0)).await.unwrap();
    f.clock.advance(TimeDelta::days(40));
    let recent = f.post(&f.alice, "recent").await;
    f.service.create(&f.alice, recent.id, metrics(5, 50, 5)).await.unwrap();

    let summary = f.service.summary(&f.alice, None).await.unwrap();

    assert_eq!(summary.period_days, 30);
    assert_eq!(summary.total_posts, 1);
    assert_eq!(summary.total_engagement, 10);
    assert!((summary.average_engagement_rate - 20.0).abs() < f64::EPSILON);

    let wide = f.service.summary(&f.alice, Some(365)).await.unwrap();
    assert_eq!(wide.total_posts, 2);
    assert!(f.service.summary(&f.alice, Some(0)).await.is_err());
}

#[tokio::test]
async fn admin_listing_and_deletion() {
    let f = fixture().await;
    let post = f.post(&f.alice, "hello").await;
    f.service.create(&f.alice, post.id, metrics(1, 1, 1)).await.unwrap();

    assert!(matches!(
        f.service.list_all(&f.alice, 0, 50).await,
        Err(DomainError::Forbidden)
    ));
    assert_eq!(f.service.list_all(&f.admin, 0, 50).await.unwrap().len(), 1);

    f.service.admin_delete(&f.admin, post.id).await.unwrap();
    assert!(matches!(
        f.service.admin_delete(&f.admin, post.id).await,
        Err(DomainError::NotFound { .. })
    ));
}
