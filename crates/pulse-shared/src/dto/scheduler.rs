use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PostResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCountsResponse {
    pub draft: u64,
    pub scheduled: u64,
    pub published: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatsResponse {
    pub timestamp: DateTime<Utc>,
    pub counts: StatusCountsResponse,
    pub overdue: u64,
    pub upcoming_24h: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverdueQuery {
    /// Defaults to the tick interval.
    pub threshold_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverduePostsResponse {
    pub count: usize,
    pub threshold_secs: u64,
    pub posts: Vec<PostResponse>,
}

/// One publish attempt in a manual tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishAttemptResponse {
    pub post_id: Uuid,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessNowResponse {
    pub message: String,
    pub processed_count: usize,
    pub published: usize,
    pub skipped: usize,
    pub failed: usize,
    pub attempts: Vec<PublishAttemptResponse>,
}
