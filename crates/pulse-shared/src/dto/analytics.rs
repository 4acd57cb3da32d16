use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counters for create; omitted fields default to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsCreateRequest {
    pub reactions_like: i64,
    pub reactions_praise: i64,
    pub reactions_empathy: i64,
    pub reactions_interest: i64,
    pub reactions_appreciation: i64,
    pub total_impressions: i64,
    pub total_shares: i64,
    pub total_comments: i64,
}

/// Partial update; omitted fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsUpdateRequest {
    pub reactions_like: Option<i64>,
    pub reactions_praise: Option<i64>,
    pub reactions_empathy: Option<i64>,
    pub reactions_interest: Option<i64>,
    pub reactions_appreciation: Option<i64>,
    pub total_impressions: Option<i64>,
    pub total_shares: Option<i64>,
    pub total_comments: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionIncrementRequest {
    pub reaction_type: String,
    #[serde(default = "default_increment")]
    pub increment: i64,
}

fn default_increment() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub reactions_like: i64,
    pub reactions_praise: i64,
    pub reactions_empathy: i64,
    pub reactions_interest: i64,
    pub reactions_appreciation: i64,
    pub total_impressions: i64,
    pub total_shares: i64,
    pub total_comments: i64,
    pub total_reactions: i64,
    pub total_engagement: i64,
    pub engagement_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Chart-friendly view of one post's analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsGraphResponse {
    pub post_id: Uuid,
    pub reactions_breakdown: BTreeMap<String, i64>,
    pub engagement_metrics: BTreeMap<String, i64>,
    pub total_engagement: i64,
    pub engagement_rate: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopPostsQuery {
    pub limit: Option<u32>,
    pub days_back: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopPostResponse {
    pub post_id: Uuid,
    pub title: String,
    /// Truncated to 200 characters.
    pub content: String,
    pub author_username: String,
    pub author_full_name: Option<String>,
    pub total_engagement: i64,
    pub total_reactions: i64,
    pub total_impressions: i64,
    pub engagement_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsSummaryResponse {
    pub period_days: u32,
    pub total_posts: u64,
    pub total_impressions: i64,
    pub total_reactions: i64,
    pub total_shares: i64,
    pub total_comments: i64,
    pub total_engagement: i64,
    pub average_engagement_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminAnalyticsQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}
