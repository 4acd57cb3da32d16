//! Post CRUD and scheduling handlers.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use pulse_core::domain::{Post, PostStatus};
use pulse_core::ports::PostQuery;
use pulse_core::services::{NewPost, PostChanges, ScheduleChange};
use pulse_shared::MessageResponse;
use pulse_shared::dto::{
    CreatePostRequest, ListPostsQuery, PostResponse, ScheduleRequest, ScheduleResponse,
    UpdatePostRequest,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub(super) const DEFAULT_PAGE_LIMIT: u64 = 100;
pub(super) const MAX_PAGE_LIMIT: u64 = 1000;

pub(super) fn post_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        author_id: post.author_id,
        title: post.title,
        content: post.content,
        status: post.status.to_string(),
        scheduled_for: post.scheduled_at,
        published_at: post.published_at,
        linkedin_post_id: post.external_id,
        error_message: post.last_error,
        publish_attempts: post.publish_attempts,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub(super) fn page_limit(limit: Option<u64>) -> AppResult<u64> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if (1..=MAX_PAGE_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_PAGE_LIMIT}"
        )))
    }
}

pub(super) fn parse_status(raw: Option<&str>) -> AppResult<Option<PostStatus>> {
    Ok(raw.map(str::parse::<PostStatus>).transpose()?)
}

/// `{date, hour, minute}` in UTC to an instant.
fn schedule_time(req: &ScheduleRequest) -> AppResult<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(&req.date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date format. Use YYYY-MM-DD".to_string()))?;
    if req.hour > 23 {
        return Err(AppError::BadRequest("hour must be between 0 and 23".to_string()));
    }
    if req.minute > 59 {
        return Err(AppError::BadRequest("minute must be between 0 and 59".to_string()));
    }
    date.and_hms_opt(req.hour, req.minute, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::BadRequest("Invalid time".to_string()))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let post = state
        .posts
        .create(
            &identity.actor(),
            NewPost {
                title: req.title,
                content: req.content,
                scheduled_at: req.scheduled_for,
            },
        )
        .await?;

    tracing::info!(post_id = %post.id, status = %post.status, "Post created");
    Ok(HttpResponse::Created().json(post_response(post)))
}

/// GET /api/posts
pub async fn list(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let filter = PostQuery {
        author_id: q.user_id,
        status: parse_status(q.status.as_deref())?,
        upcoming_only: q.upcoming_only,
        created_after: q.start_date,
        created_before: q.end_date,
        skip: q.skip.unwrap_or(0),
        limit: page_limit(q.limit)?,
    };

    let posts = state.posts.list(&identity.actor(), filter).await?;
    let body: Vec<PostResponse> = posts.into_iter().map(post_response).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/posts/{id}
pub async fn get(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.posts.get(&identity.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// PUT /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let changes = PostChanges {
        title: req.title,
        content: req.content,
        schedule: req.scheduled_for.map(|at| match at {
            Some(at) => ScheduleChange::At(at),
            None => ScheduleChange::Clear,
        }),
    };
    let post = state
        .posts
        .update(&identity.actor(), path.into_inner(), changes)
        .await?;
    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    state.posts.delete(&identity.actor(), id).await?;

    tracing::info!(post_id = %id, "Post deleted");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}

/// POST /api/posts/{id}/schedule
pub async fn schedule(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<ScheduleRequest>,
) -> AppResult<HttpResponse> {
    let at = schedule_time(&body)?;
    let post = state
        .posts
        .schedule(&identity.actor(), path.into_inner(), at)
        .await?;

    tracing::info!(post_id = %post.id, scheduled_at = %at, "Post scheduled");
    Ok(HttpResponse::Ok().json(ScheduleResponse {
        success: true,
        message: format!("Post scheduled for {}", at.format("%Y-%m-%d %H:%M UTC")),
        post: post_response(post),
    }))
}

/// POST /api/posts/{id}/unschedule
pub async fn unschedule(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .unschedule(&identity.actor(), path.into_inner())
        .await?;

    tracing::info!(post_id = %post.id, "Post unscheduled");
    Ok(HttpResponse::Ok().json(ScheduleResponse {
        success: true,
        message: "Post unscheduled".to_string(),
        post: post_response(post),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn request(date: &str, hour: u32, minute: u32) -> ScheduleRequest {
        ScheduleRequest {
            date: date.to_string(),
            hour,
            minute,
        }
    }

    #[test]
    fn schedule_time_is_utc() {
        let at = schedule_time(&request("2030-01-20", 14, 30)).unwrap();
        assert_eq!((at.year(), at.month(), at.day()), (2030, 1, 20));
        assert_eq!((at.hour(), at.minute()), (14, 30));
    }

    #[test]
    fn schedule_time_rejects_bad_parts() {
        assert!(schedule_time(&request("20-01-2030", 1, 0)).is_err());
        assert!(schedule_time(&request("2030-01-20", 24, 0)).is_err());
        assert!(schedule_time(&request("2030-01-20", 1, 60)).is_err());
    }

    #[test]
    fn page_limit_bounds() {
        assert_eq!(page_limit(None).unwrap(), DEFAULT_PAGE_LIMIT);
        assert!(page_limit(Some(0)).is_err());
        assert!(page_limit(Some(MAX_PAGE_LIMIT + 1)).is_err());
    }
}
