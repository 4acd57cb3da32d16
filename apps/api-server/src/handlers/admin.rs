//! Admin-only handlers: per-user post listings and scheduler control.

use std::time::Duration;

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use pulse_core::ports::{Clock, PublishOutcome, PublishRecord};
use pulse_shared::dto::{
    OverduePostsResponse, OverdueQuery, PostResponse, ProcessNowResponse,
    PublishAttemptResponse, SchedulerStatsResponse, StatusCountsResponse, UserPostsQuery,
};

use super::posts::{page_limit, parse_status, post_response};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn attempt_response(record: &PublishRecord) -> PublishAttemptResponse {
    let detail = match &record.outcome {
        PublishOutcome::Published { external_id } => external_id.clone(),
        PublishOutcome::Skipped { reason } => Some(reason.clone()),
        PublishOutcome::Failed { error, .. } => Some(error.clone()),
    };
    PublishAttemptResponse {
        post_id: record.post_id,
        outcome: record.outcome.label().to_string(),
        detail,
    }
}

/// GET /api/admin/posts/user/{user_id}
pub async fn user_posts(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    query: web::Query<UserPostsQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let posts = state
        .posts
        .list_by_author(
            &identity.actor(),
            path.into_inner(),
            parse_status(q.status.as_deref())?,
            q.skip.unwrap_or(0),
            page_limit(q.limit)?,
        )
        .await?;

    let body: Vec<PostResponse> = posts.into_iter().map(post_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/admin/scheduler/stats
pub async fn scheduler_stats(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    identity.admin()?;
    let stats = state.scheduler.stats().await?;

    Ok(HttpResponse::Ok().json(SchedulerStatsResponse {
        timestamp: state.clock.now(),
        counts: StatusCountsResponse {
            draft: stats.counts.draft,
            scheduled: stats.counts.scheduled,
            published: stats.counts.published,
            total: stats.counts.total(),
        },
        overdue: stats.overdue,
        upcoming_24h: stats.upcoming_24h,
        last_tick_at: stats.last_tick_at,
        interval_secs: stats.interval.as_secs(),
    }))
}

/// GET /api/admin/scheduler/overdue?threshold_secs=
pub async fn overdue_posts(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<OverdueQuery>,
) -> AppResult<HttpResponse> {
    identity.admin()?;
    let threshold = query
        .threshold_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| state.scheduler.settings().interval());

    let posts = state.scheduler.overdue_posts(Some(threshold)).await?;
    Ok(HttpResponse::Ok().json(OverduePostsResponse {
        count: posts.len(),
        threshold_secs: threshold.as_secs(),
        posts: posts.into_iter().map(post_response).collect(),
    }))
}

/// POST /api/admin/scheduler/process-now
///
/// Runs a tick right away, after any tick already in flight.
pub async fn process_now(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let actor = identity.admin()?;
    tracing::info!(admin_id = %actor.user_id, "Manual scheduler tick requested");

    let report = state.scheduler.tick().await?;
    Ok(HttpResponse::Ok().json(ProcessNowResponse {
        message: format!("Processed {} due posts", report.processed()),
        processed_count: report.processed(),
        published: report.published(),
        skipped: report.skipped(),
        failed: report.failed(),
        attempts: report.records.iter().map(attempt_response).collect(),
    }))
}
