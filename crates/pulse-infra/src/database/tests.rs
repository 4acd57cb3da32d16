use chrono::{DateTime, TimeDelta, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use pulse_core::domain::{Metrics, Post, PostAnalytics, PostStatus, ReactionKind};
use pulse_core::ports::{AnalyticsRepository, BaseRepository, PostRepository, Transition};

use super::entity::{analytics, post};
use super::postgres_repo::{PostgresAnalyticsRepository, PostgresPostRepository};

fn post_model(id: Uuid, status: post::Status, now: DateTime<Utc>) -> post::Model {
    post::Model {
        id,
        author_id: Uuid::new_v4(),
        title: "Launch day".to_owned(),
        content: "We shipped.".to_owned(),
        status,
        scheduled_at: (status == post::Status::Scheduled).then(|| now.fixed_offset()),
        published_at: (status == post::Status::Published).then(|| now.fixed_offset()),
        external_id: None,
        last_error: None,
        publish_attempts: 0,
        created_at: now.fixed_offset(),
        updated_at: now.fixed_offset(),
    }
}

fn exec(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let now = Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(post_id, post::Status::Draft, now)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.id, post_id);
    assert_eq!(post.status, PostStatus::Draft);
    assert!(post.is_consistent());
}

#[tokio::test]
async fn test_try_publish_applied() {
    let post_id = Uuid::new_v4();
    let now = Utc::now();
    let mut published = post_model(post_id, post::Status::Published, now);
    published.external_id = Some("linkedin_x_1".to_owned());

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([exec(1)])
        .append_query_results([vec![published]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = repo
        .try_publish(post_id, now, Some("linkedin_x_1".to_owned()))
        .await
        .unwrap();

    let Transition::Applied(post) = result else {
        panic!("expected Applied, got {result:?}");
    };
    assert_eq!(post.status, PostStatus::Published);
    assert_eq!(post.external_id.as_deref(), Some("linkedin_x_1"));
}

#[tokio::test]
async fn test_try_publish_lost_race_is_conflict() {
    let post_id = Uuid::new_v4();
    let now = Utc::now();

    // No row matched the conditional update; the post was unscheduled meanwhile.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([exec(0)])
        .append_query_results([vec![post_model(post_id, post::Status::Draft, now)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = repo.try_publish(post_id, now, None).await.unwrap();

    assert_eq!(
        result,
        Transition::Conflict {
            current: PostStatus::Draft
        }
    );
}

#[tokio::test]
async fn test_schedule_missing_post_is_not_found() {
    let now = Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([exec(0)])
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = repo
        .schedule(Uuid::new_v4(), now + TimeDelta::hours(1), now)
        .await
        .unwrap();

    assert_eq!(result, Transition::NotFound);
}

#[tokio::test]
async fn test_record_failure_returns_attempt_count() {
    let post_id = Uuid::new_v4();
    let now = Utc::now();
    let mut failed = post_model(post_id, post::Status::Scheduled, now);
    failed.publish_attempts = 2;
    failed.last_error = Some("gateway down".to_owned());

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([exec(1)])
        .append_query_results([vec![failed]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result = repo.record_failure(post_id, "gateway down", now).await.unwrap();

    let Transition::Applied(post) = result else {
        panic!("expected Applied, got {result:?}");
    };
    assert_eq!(post.publish_attempts, 2);
    assert_eq!(post.status, PostStatus::Scheduled);
}

#[tokio::test]
async fn test_increment_reaction_on_missing_row() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([exec(0)])
        .into_connection();

    let repo = PostgresAnalyticsRepository::new(db);
    let result = repo
        .increment_reaction(Uuid::new_v4(), ReactionKind::Like, 1, Utc::now())
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_find_analytics_by_post() {
    let post_id = Uuid::new_v4();
    let now = Utc::now();
    let record = PostAnalytics::new(
        post_id,
        Metrics {
            reactions_like: 4,
            total_impressions: 100,
            ..Metrics::default()
        },
        now,
    );
    let model = analytics::Model {
        id: record.id,
        post_id,
        reactions_like: 4,
        reactions_praise: 0,
        reactions_empathy: 0,
        reactions_interest: 0,
        reactions_appreciation: 0,
        total_impressions: 100,
        total_shares: 0,
        total_comments: 0,
        created_at: now.fixed_offset(),
        updated_at: now.fixed_offset(),
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection();

    let repo = PostgresAnalyticsRepository::new(db);
    let found = repo.find_by_post(post_id).await.unwrap().unwrap();

    assert_eq!(found.metrics, record.metrics);
    assert!((found.metrics.engagement_rate() - 4.0).abs() < f64::EPSILON);
}
