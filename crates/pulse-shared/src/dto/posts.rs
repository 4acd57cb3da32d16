use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    /// Schedule right away; must be in the future.
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Absent leaves the schedule alone, a time reschedules (must be in the
    /// future) and an explicit `null` unschedules.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_for: Option<Option<DateTime<Utc>>>,
}

/// Only called when the field is present, so `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Query string for `GET /posts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPostsQuery {
    pub user_id: Option<Uuid>,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub upcoming_only: Option<bool>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// Query string for the admin listing of a user's posts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPostsQuery {
    pub status: Option<String>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// Publication time in UTC, e.g. `{"date": "2025-01-20", "hour": 14, "minute": 30}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub date: String,
    pub hour: u32,
    pub minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub success: bool,
    pub message: String,
    pub post: PostResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: String,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub linkedin_post_id: Option<String>,
    pub error_message: Option<String>,
    pub publish_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: serde_json::Value) -> UpdatePostRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn update_tells_missing_schedule_from_explicit_null() {
        assert_eq!(parse(serde_json::json!({"title": "x"})).scheduled_for, None);
        assert_eq!(
            parse(serde_json::json!({"scheduled_for": null})).scheduled_for,
            Some(None)
        );
        let at = parse(serde_json::json!({"scheduled_for": "2030-01-20T14:30:00Z"}));
        assert!(matches!(at.scheduled_for, Some(Some(_))));
    }
}
