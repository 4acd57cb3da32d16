mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use common::{CountingPublisher, FailingPublisher, GatedPublisher, clock};
use pulse_core::domain::{Post, PostStatus};
use pulse_core::error::{RepoError, SchedulerError};
use pulse_core::ports::{
    BaseRepository, Clock, ManualClock, PostPublisher, PostQuery, PostRepository, PublishOutcome,
    StatusCounts, Transition,
};
use pulse_core::services::{PublishScheduler, SchedulerSettings};
use pulse_infra::{InMemoryPostRepository, RecordingEventSink};

struct Harness {
    posts: Arc<InMemoryPostRepository>,
    events: Arc<RecordingEventSink>,
    clock: Arc<ManualClock>,
    scheduler: Arc<PublishScheduler>,
}

fn harness_with(publisher: Arc<dyn PostPublisher>, settings: SchedulerSettings) -> Harness {
    let posts = Arc::new(InMemoryPostRepository::new());
    let events = Arc::new(RecordingEventSink::new());
    let clock = clock();
    let scheduler = Arc::new(PublishScheduler::new(
        posts.clone(),
        publisher,
        events.clone(),
        clock.clone(),
        settings,
    ));
    Harness {
        posts,
        events,
        clock,
        scheduler,
    }
}

fn harness(publisher: Arc<dyn PostPublisher>) -> Harness {
    harness_with(publisher, SchedulerSettings::default())
}

impl Harness {
    async fn draft(&self) -> Post {
        let post = Post::new(
            Uuid::new_v4(),
            "Quarterly update".into(),
            "Numbers are up.".into(),
            self.clock.now(),
        );
        self.posts.insert(post).await.unwrap()
    }

    /// Schedule relative to the harness clock, past offsets included.
    async fn scheduled(&self, offset: TimeDelta) -> Post {
        let post = self.draft().await;
        let now = self.clock.now();
        match self.posts.schedule(post.id, now + offset, now).await.unwrap() {
            Transition::Applied(post) => post,
            other => panic!("schedule failed: {other:?}"),
        }
    }

    async fn get(&self, id: Uuid) -> Post {
        self.posts.find_by_id(id).await.unwrap().unwrap()
    }
}

#[tokio::test]
async fn due_post_is_published_with_timestamp_and_cleared_schedule() {
    let h = harness(Arc::new(CountingPublisher::default()));
    let p = h.scheduled(TimeDelta::seconds(-1)).await;

    let report = h.scheduler.tick().await.unwrap();

    assert_eq!(report.published(), 1);
    let stored = h.get(p.id).await;
    assert_eq!(stored.status, PostStatus::Published);
    assert_eq!(stored.published_at, Some(h.clock.now()));
    assert_eq!(stored.scheduled_at, None);
    assert_eq!(
        stored.external_id.as_deref(),
        Some(format!("linkedin_{}", p.id).as_str())
    );
    assert!(stored.is_consistent());
}

#[tokio::test]
async fn post_due_exactly_now_is_published() {
    let h = harness(Arc::new(CountingPublisher::default()));
    let p = h.scheduled(TimeDelta::zero()).await;

    h.scheduler.tick().await.unwrap();

    assert_eq!(h.get(p.id).await.status, PostStatus::Published);
}

#[tokio::test]
async fn future_post_is_left_untouched() {
    let publisher = Arc::new(CountingPublisher::default());
    let h = harness(publisher.clone());
    let q = h.scheduled(TimeDelta::hours(1)).await;

    let report = h.scheduler.tick().await.unwrap();

    assert_eq!(report.processed(), 0);
    assert_eq!(h.get(q.id).await, q);
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn drafts_and_published_posts_are_ignored() {
    let h = harness(Arc::new(CountingPublisher::default()));
    let draft = h.draft().await;
    let done = h.scheduled(TimeDelta::seconds(-5)).await;
    h.scheduler.tick().await.unwrap();
    let published = h.get(done.id).await;

    let report = h.scheduler.tick().await.unwrap();

    assert_eq!(report.processed(), 0);
    assert_eq!(h.get(draft.id).await, draft);
    assert_eq!(h.get(done.id).await, published);
}

#[tokio::test]
async fn second_tick_is_a_no_op() {
    let publisher = Arc::new(CountingPublisher::default());
    let h = harness(publisher.clone());
    for secs in [1, 2, 3] {
        h.scheduled(TimeDelta::seconds(-secs)).await;
    }

    let first = h.scheduler.tick().await.unwrap();
    let snapshot = h.posts.all().await;
    let second = h.scheduler.tick().await.unwrap();

    assert_eq!(first.published(), 3);
    assert_eq!(second.processed(), 0);
    assert_eq!(publisher.calls.load(Ordering::SeqCst), 3);

    let mut before = snapshot;
    let mut after = h.posts.all().await;
    before.sort_by_key(|p| p.id);
    after.sort_by_key(|p| p.id);
    assert_eq!(before, after);
}

#[tokio::test]
async fn unschedule_always_returns_to_draft_without_schedule() {
    let h = harness(Arc::new(CountingPublisher::default()));
    for offset in [TimeDelta::hours(-2), TimeDelta::zero(), TimeDelta::days(3)] {
        let p = h.scheduled(offset).await;

        let result = h.posts.unschedule(p.id, h.clock.now()).await.unwrap();

        let Transition::Applied(post) = result else {
            panic!("unschedule should apply, got {result:?}");
        };
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.scheduled_at, None);
        assert!(post.is_consistent());
    }
}

#[tokio::test]
async fn unschedule_during_publish_wins_and_tick_skips() {
    let gate = Arc::new(GatedPublisher::default());
    let h = harness(gate.clone());
    let p = h.scheduled(TimeDelta::seconds(-1)).await;

    let tick = tokio::spawn({
        let scheduler = h.scheduler.clone();
        async move { scheduler.tick().await }
    });
    gate.started.notified().await;

    let unscheduled = h.posts.unschedule(p.id, h.clock.now()).await.unwrap();
    assert!(matches!(unscheduled, Transition::Applied(_)));
    gate.release.notify_one();

    let report = tick.await.unwrap().unwrap();
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.published(), 0);

    let stored = h.get(p.id).await;
    assert_eq!(stored.status, PostStatus::Draft);
    assert!(stored.is_consistent());
}

#[tokio::test]
async fn unschedule_after_publish_is_a_conflict() {
    let h = harness(Arc::new(CountingPublisher::default()));
    let p = h.scheduled(TimeDelta::seconds(-1)).await;
    h.scheduler.tick().await.unwrap();

    let result = h.posts.unschedule(p.id, h.clock.now()).await.unwrap();

    assert_eq!(
        result,
        Transition::Conflict {
            current: PostStatus::Published
        }
    );
    assert!(h.get(p.id).await.is_consistent());
}

#[tokio::test]
async fn concurrent_unschedule_and_tick_have_exactly_one_winner() {
    for _ in 0..25 {
        let h = harness(Arc::new(CountingPublisher::default()));
        let p = h.scheduled(TimeDelta::seconds(-1)).await;

        let (report, unscheduled) = tokio::join!(
            h.scheduler.tick(),
            h.posts.unschedule(p.id, h.clock.now())
        );
        let report = report.unwrap();
        let unscheduled = unscheduled.unwrap();

        let stored = h.get(p.id).await;
        assert!(stored.is_consistent());
        match stored.status {
            PostStatus::Published => {
                assert_eq!(report.published(), 1);
                assert!(matches!(unscheduled, Transition::Conflict { .. }));
            }
            PostStatus::Draft => {
                assert_eq!(report.published(), 0);
                assert!(matches!(unscheduled, Transition::Applied(_)));
            }
            PostStatus::Scheduled => panic!("post left scheduled"),
        }
    }
}

#[tokio::test]
async fn rescheduled_into_future_during_publish_is_skipped() {
    let gate = Arc::new(GatedPublisher::default());
    let h = harness(gate.clone());
    let p = h.scheduled(TimeDelta::seconds(-1)).await;

    let tick = tokio::spawn({
        let scheduler = h.scheduler.clone();
        async move { scheduler.tick().await }
    });
    gate.started.notified().await;
    let later = h.clock.now() + TimeDelta::hours(2);
    h.posts.schedule(p.id, later, h.clock.now()).await.unwrap();
    gate.release.notify_one();

    let report = tick.await.unwrap().unwrap();
    assert_eq!(report.skipped(), 1);
    let stored = h.get(p.id).await;
    assert_eq!(stored.status, PostStatus::Scheduled);
    assert_eq!(stored.scheduled_at, Some(later));
}

#[tokio::test]
async fn failed_publish_keeps_post_scheduled_and_retries() {
    let h = harness(Arc::new(FailingPublisher));
    let p = h.scheduled(TimeDelta::seconds(-1)).await;

    let first = h.scheduler.tick().await.unwrap();
    let second = h.scheduler.tick().await.unwrap();

    assert_eq!(first.failed(), 1);
    assert_eq!(second.failed(), 1);
    let stored = h.get(p.id).await;
    assert_eq!(stored.status, PostStatus::Scheduled);
    assert_eq!(stored.publish_attempts, 2);
    assert!(stored.last_error.as_deref().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn exhausted_attempts_revert_to_draft() {
    let settings = SchedulerSettings::default().with_max_attempts(Some(2));
    let h = harness_with(Arc::new(FailingPublisher), settings);
    let p = h.scheduled(TimeDelta::seconds(-1)).await;

    h.scheduler.tick().await.unwrap();
    assert_eq!(h.get(p.id).await.status, PostStatus::Scheduled);
    let report = h.scheduler.tick().await.unwrap();

    match &report.records[0].outcome {
        PublishOutcome::Failed {
            attempts,
            reverted_to_draft,
            ..
        } => {
            assert_eq!(*attempts, Some(2));
            assert!(*reverted_to_draft);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    let stored = h.get(p.id).await;
    assert_eq!(stored.status, PostStatus::Draft);
    assert!(stored.last_error.is_some());
    assert!(stored.is_consistent());
}

#[tokio::test]
async fn overdue_scenario_lists_post_after_failed_ticks() {
    let h = harness(Arc::new(FailingPublisher));
    let late = h.scheduled(TimeDelta::seconds(-60)).await;
    let fresh = h.scheduled(TimeDelta::seconds(-10)).await;

    h.scheduler.tick().await.unwrap();
    h.scheduler.tick().await.unwrap();

    let overdue = h
        .scheduler
        .overdue_posts(Some(Duration::from_secs(30)))
        .await
        .unwrap();
    let ids: Vec<Uuid> = overdue.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![late.id]);
    assert!(!ids.contains(&fresh.id));
}

#[tokio::test]
async fn overdue_defaults_to_tick_interval_and_orders_oldest_first() {
    let settings = SchedulerSettings::new(Duration::from_secs(30)).unwrap();
    let h = harness_with(Arc::new(FailingPublisher), settings);
    let newer = h.scheduled(TimeDelta::seconds(-45)).await;
    let older = h.scheduled(TimeDelta::minutes(-10)).await;
    h.scheduled(TimeDelta::seconds(-20)).await;

    let overdue = h.scheduler.overdue_posts(None).await.unwrap();

    let ids: Vec<Uuid> = overdue.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![older.id, newer.id]);
}

#[tokio::test]
async fn stats_report_counts_and_last_tick() {
    let h = harness(Arc::new(CountingPublisher::default()));
    h.draft().await;
    h.scheduled(TimeDelta::seconds(-1)).await;
    h.scheduled(TimeDelta::hours(3)).await;
    h.scheduled(TimeDelta::days(2)).await;

    let before = h.scheduler.stats().await.unwrap();
    assert_eq!(before.last_tick_at, None);
    assert_eq!(before.upcoming_24h, 1);

    h.scheduler.tick().await.unwrap();
    let after = h.scheduler.stats().await.unwrap();

    assert_eq!(
        after.counts,
        StatusCounts {
            draft: 1,
            scheduled: 2,
            published: 1
        }
    );
    assert_eq!(after.last_tick_at, Some(h.clock.now()));
    assert_eq!(after.overdue, 0);
    assert_eq!(after.interval, Duration::from_secs(30));
}

#[tokio::test]
async fn every_attempt_reaches_the_event_sink() {
    let h = harness(Arc::new(CountingPublisher::default()));
    let a = h.scheduled(TimeDelta::seconds(-1)).await;
    let b = h.scheduled(TimeDelta::seconds(-2)).await;

    h.scheduler.tick().await.unwrap();

    let records = h.events.records();
    assert_eq!(records.len(), 2);
    let mut ids: Vec<Uuid> = records.iter().map(|r| r.post_id).collect();
    ids.sort();
    let mut expected = vec![a.id, b.id];
    expected.sort();
    assert_eq!(ids, expected);
    assert!(records.iter().all(|r| r.outcome.label() == "published"));
}

#[tokio::test]
async fn timer_tick_is_skipped_while_one_is_in_flight() {
    let gate = Arc::new(GatedPublisher::default());
    let h = harness(gate.clone());
    h.scheduled(TimeDelta::seconds(-1)).await;

    let running = tokio::spawn({
        let scheduler = h.scheduler.clone();
        async move { scheduler.tick().await }
    });
    gate.started.notified().await;

    assert!(h.scheduler.try_tick().await.is_none());

    gate.release.notify_one();
    running.await.unwrap().unwrap();
    assert!(h.scheduler.try_tick().await.is_some());
}

#[tokio::test]
async fn manual_tick_waits_for_in_flight_tick() {
    let gate = Arc::new(GatedPublisher::default());
    let h = harness(gate.clone());
    h.scheduled(TimeDelta::seconds(-1)).await;

    let first = tokio::spawn({
        let scheduler = h.scheduler.clone();
        async move { scheduler.tick().await }
    });
    gate.started.notified().await;
    let second = tokio::spawn({
        let scheduler = h.scheduler.clone();
        async move { scheduler.tick().await }
    });
    gate.release.notify_one();

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first.published(), 1);
    assert_eq!(second.processed(), 0);
}

#[tokio::test]
async fn concurrency_bound_still_publishes_everything() {
    let settings = SchedulerSettings::default().with_max_concurrency(2);
    let h = harness_with(Arc::new(CountingPublisher::default()), settings);
    for secs in 1..=7 {
        h.scheduled(TimeDelta::seconds(-secs)).await;
    }

    let report = h.scheduler.tick().await.unwrap();

    assert_eq!(report.published(), 7);
    let remaining = h
        .posts
        .list(
            &PostQuery {
                status: Some(PostStatus::Scheduled),
                ..PostQuery::default()
            },
            h.clock.now(),
        )
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

/// In-memory store with injectable faults.
#[derive(Default)]
struct FaultyStore {
    inner: InMemoryPostRepository,
    unreadable: bool,
    /// `try_publish` errors for this post while set.
    unwritable: std::sync::Mutex<Option<Uuid>>,
    /// `record_failure` always errors.
    lose_failures: bool,
}

impl FaultyStore {
    fn unreadable() -> Self {
        Self {
            unreadable: true,
            ..Self::default()
        }
    }

    fn reject_publish_of(&self, id: Option<Uuid>) {
        *self.unwritable.lock().unwrap() = id;
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for FaultyStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        self.inner.find_by_id(id).await
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        self.inner.insert(post).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.inner.delete(id).await
    }
}

#[async_trait]
impl PostRepository for FaultyStore {
    async fn list(&self, query: &PostQuery, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        self.inner.list(query, now).await
    }

    async fn update_content(
        &self,
        id: Uuid,
        title: Option<String>,
        content: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<Post>, RepoError> {
        self.inner.update_content(id, title, content, now).await
    }

    async fn schedule(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Transition, RepoError> {
        self.inner.schedule(id, at, now).await
    }

    async fn unschedule(&self, id: Uuid, now: DateTime<Utc>) -> Result<Transition, RepoError> {
        self.inner.unschedule(id, now).await
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        if self.unreadable {
            return Err(RepoError::Connection("database is down".to_string()));
        }
        self.inner.find_due(now).await
    }

    async fn try_publish(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        external_id: Option<String>,
    ) -> Result<Transition, RepoError> {
        if *self.unwritable.lock().unwrap() == Some(id) {
            return Err(RepoError::Query("write timed out".to_string()));
        }
        self.inner.try_publish(id, now, external_id).await
    }

    async fn record_failure(
        &self,
        id: Uuid,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, RepoError> {
        if self.lose_failures {
            return Err(RepoError::Connection("connection reset".to_string()));
        }
        self.inner.record_failure(id, error, now).await
    }

    async fn count_by_status(&self) -> Result<StatusCounts, RepoError> {
        self.inner.count_by_status().await
    }

    async fn find_overdue(&self, cutoff: DateTime<Utc>) -> Result<Vec<Post>, RepoError> {
        self.inner.find_overdue(cutoff).await
    }

    async fn count_scheduled_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, RepoError> {
        self.inner.count_scheduled_between(from, to).await
    }
}

#[tokio::test]
async fn store_read_failure_aborts_tick_without_recording_it() {
    let events = Arc::new(RecordingEventSink::new());
    let scheduler = PublishScheduler::new(
        Arc::new(FaultyStore::unreadable()),
        Arc::new(CountingPublisher::default()),
        events.clone(),
        clock(),
        SchedulerSettings::default(),
    );

    let result = scheduler.tick().await;

    assert!(matches!(result, Err(SchedulerError::StoreRead(_))));
    assert_eq!(scheduler.last_tick_at(), None);
    assert!(events.records().is_empty());
}

#[tokio::test]
async fn store_write_failure_fails_one_post_and_spares_the_rest() {
    let store = Arc::new(FaultyStore::default());
    let events = Arc::new(RecordingEventSink::new());
    let clock = clock();
    let scheduler = PublishScheduler::new(
        store.clone(),
        Arc::new(CountingPublisher::default()),
        events.clone(),
        clock.clone(),
        SchedulerSettings::default(),
    );

    let now = clock.now();
    let mut ids = Vec::new();
    for n in 0..3 {
        let post = Post::new(Uuid::new_v4(), format!("Post {n}"), "Body".into(), now);
        let post = store.insert(post).await.unwrap();
        store
            .schedule(post.id, now - TimeDelta::seconds(5), now)
            .await
            .unwrap();
        ids.push(post.id);
    }
    let stuck = ids[1];
    store.reject_publish_of(Some(stuck));

    let first = scheduler.tick().await.unwrap();

    assert_eq!(first.published(), 2);
    assert_eq!(first.failed(), 1);
    let failed = first.records.iter().find(|r| r.post_id == stuck).unwrap();
    match &failed.outcome {
        PublishOutcome::Failed {
            error,
            attempts,
            reverted_to_draft,
        } => {
            assert!(error.contains("write timed out"));
            assert_eq!(*attempts, Some(1));
            assert!(!reverted_to_draft);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    let stored = store.find_by_id(stuck).await.unwrap().unwrap();
    assert_eq!(stored.status, PostStatus::Scheduled);
    assert_eq!(stored.publish_attempts, 1);
    for id in [ids[0], ids[2]] {
        let sibling = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(sibling.status, PostStatus::Published);
    }
    assert_eq!(events.records().len(), 3);

    // Still failing: retried, not dropped.
    let second = scheduler.tick().await.unwrap();
    assert_eq!(second.processed(), 1);
    assert_eq!(second.failed(), 1);
    assert_eq!(store.find_by_id(stuck).await.unwrap().unwrap().publish_attempts, 2);

    store.reject_publish_of(None);
    let third = scheduler.tick().await.unwrap();
    assert_eq!(third.published(), 1);
    let stored = store.find_by_id(stuck).await.unwrap().unwrap();
    assert_eq!(stored.status, PostStatus::Published);
    assert!(stored.is_consistent());
}

#[tokio::test]
async fn lost_failure_bookkeeping_still_reports_the_failure() {
    let store = Arc::new(FaultyStore {
        lose_failures: true,
        ..FaultyStore::default()
    });
    let clock = clock();
    let scheduler = PublishScheduler::new(
        store.clone(),
        Arc::new(FailingPublisher),
        Arc::new(RecordingEventSink::new()),
        clock.clone(),
        SchedulerSettings::default().with_max_attempts(Some(1)),
    );
    let now = clock.now();
    let post = Post::new(Uuid::new_v4(), "Due".into(), "Body".into(), now);
    let post = store.insert(post).await.unwrap();
    store
        .schedule(post.id, now - TimeDelta::seconds(1), now)
        .await
        .unwrap();

    let report = scheduler.tick().await.unwrap();

    match &report.records[0].outcome {
        PublishOutcome::Failed {
            attempts,
            reverted_to_draft,
            ..
        } => {
            assert_eq!(*attempts, None);
            assert!(!reverted_to_draft);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    let stored = store.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PostStatus::Scheduled);
    assert_eq!(stored.publish_attempts, 0);
}
