//! Engagement analytics handlers.

use std::collections::BTreeMap;

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use pulse_core::domain::{
    AnalyticsSummary, Metrics, MetricsChanges, PostAnalytics, ReactionKind, TopPost,
};
use pulse_shared::MessageResponse;
use pulse_shared::dto::{
    AdminAnalyticsQuery, AnalyticsCreateRequest, AnalyticsGraphResponse, AnalyticsResponse,
    AnalyticsSummaryResponse, AnalyticsUpdateRequest, ReactionIncrementRequest, SummaryQuery,
    TopPostResponse, TopPostsQuery,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

const DEFAULT_ADMIN_LIMIT: u64 = 50;

fn analytics_response(record: PostAnalytics) -> AnalyticsResponse {
    let m = record.metrics;
    AnalyticsResponse {
        id: record.id,
        post_id: record.post_id,
        reactions_like: m.reactions_like,
        reactions_praise: m.reactions_praise,
        reactions_empathy: m.reactions_empathy,
        reactions_interest: m.reactions_interest,
        reactions_appreciation: m.reactions_appreciation,
        total_impressions: m.total_impressions,
        total_shares: m.total_shares,
        total_comments: m.total_comments,
        total_reactions: m.total_reactions(),
        total_engagement: m.total_engagement(),
        engagement_rate: m.engagement_rate(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn graph_response(record: PostAnalytics) -> AnalyticsGraphResponse {
    let m = record.metrics;
    let reactions_breakdown = ReactionKind::ALL
        .iter()
        .map(|kind| (kind.to_string(), m.reaction(*kind)))
        .collect();
    let engagement_metrics = BTreeMap::from([
        ("impressions".to_string(), m.total_impressions),
        ("reactions".to_string(), m.total_reactions()),
        ("shares".to_string(), m.total_shares),
        ("comments".to_string(), m.total_comments),
    ]);

    AnalyticsGraphResponse {
        post_id: record.post_id,
        reactions_breakdown,
        engagement_metrics,
        total_engagement: m.total_engagement(),
        engagement_rate: m.engagement_rate(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn top_post_response(top: TopPost) -> TopPostResponse {
    TopPostResponse {
        post_id: top.post_id,
        title: top.title,
        content: top.content_preview,
        author_username: top.author_username,
        author_full_name: top.author_full_name,
        total_engagement: top.metrics.total_engagement(),
        total_reactions: top.metrics.total_reactions(),
        total_impressions: top.metrics.total_impressions,
        engagement_rate: top.metrics.engagement_rate(),
    }
}

fn summary_response(summary: AnalyticsSummary) -> AnalyticsSummaryResponse {
    AnalyticsSummaryResponse {
        period_days: summary.period_days,
        total_posts: summary.total_posts,
        total_impressions: summary.total_impressions,
        total_reactions: summary.total_reactions,
        total_shares: summary.total_shares,
        total_comments: summary.total_comments,
        total_engagement: summary.total_engagement,
        average_engagement_rate: summary.average_engagement_rate,
    }
}

/// POST /api/analytics/{post_id}
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<AnalyticsCreateRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let metrics = Metrics {
        reactions_like: req.reactions_like,
        reactions_praise: req.reactions_praise,
        reactions_empathy: req.reactions_empathy,
        reactions_interest: req.reactions_interest,
        reactions_appreciation: req.reactions_appreciation,
        total_impressions: req.total_impressions,
        total_shares: req.total_shares,
        total_comments: req.total_comments,
    };
    let record = state
        .analytics
        .create(&identity.actor(), path.into_inner(), metrics)
        .await?;
    Ok(HttpResponse::Created().json(analytics_response(record)))
}

/// GET /api/analytics/{post_id}
pub async fn get(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let record = state
        .analytics
        .get(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(analytics_response(record)))
}

/// PUT /api/analytics/{post_id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<AnalyticsUpdateRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let changes = MetricsChanges {
        reactions_like: req.reactions_like,
        reactions_praise: req.reactions_praise,
        reactions_empathy: req.reactions_empathy,
        reactions_interest: req.reactions_interest,
        reactions_appreciation: req.reactions_appreciation,
        total_impressions: req.total_impressions,
        total_shares: req.total_shares,
        total_comments: req.total_comments,
    };
    let record = state
        .analytics
        .update(&identity.actor(), path.into_inner(), changes)
        .await?;
    Ok(HttpResponse::Ok().json(analytics_response(record)))
}

/// DELETE /api/analytics/{post_id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .analytics
        .delete(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Analytics deleted successfully")))
}

/// POST /api/analytics/{post_id}/reactions
pub async fn increment_reaction(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<ReactionIncrementRequest>,
) -> AppResult<HttpResponse> {
    let kind: ReactionKind = body.reaction_type.trim().to_ascii_lowercase().parse()?;
    let record = state
        .analytics
        .increment_reaction(&identity.actor(), path.into_inner(), kind, body.increment)
        .await?;
    Ok(HttpResponse::Ok().json(analytics_response(record)))
}

/// GET /api/analytics/{post_id}/graph
pub async fn graph(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let record = state
        .analytics
        .get(&identity.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(graph_response(record)))
}

/// GET /api/analytics/top
pub async fn top_posts(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<TopPostsQuery>,
) -> AppResult<HttpResponse> {
    let top = state
        .analytics
        .top_posts(&identity.actor(), query.limit, query.days_back)
        .await?;
    let body: Vec<TopPostResponse> = top.into_iter().map(top_post_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/analytics/summary
pub async fn summary(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<SummaryQuery>,
) -> AppResult<HttpResponse> {
    let summary = state
        .analytics
        .summary(&identity.actor(), query.days)
        .await?;
    Ok(HttpResponse::Ok().json(summary_response(summary)))
}

/// GET /api/admin/analytics
pub async fn admin_list(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<AdminAnalyticsQuery>,
) -> AppResult<HttpResponse> {
    let records = state
        .analytics
        .list_all(
            &identity.actor(),
            query.offset.unwrap_or(0),
            query.limit.unwrap_or(DEFAULT_ADMIN_LIMIT),
        )
        .await?;
    let body: Vec<AnalyticsResponse> = records.into_iter().map(analytics_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// DELETE /api/admin/analytics/{post_id}
pub async fn admin_delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    state
        .analytics
        .admin_delete(&identity.actor(), post_id)
        .await?;

    tracing::info!(post_id = %post_id, "Analytics deleted by admin");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Analytics deleted successfully")))
}
