use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// LinkedIn reaction types tracked per post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Praise,
    Empathy,
    Interest,
    Appreciation,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 5] = [
        Self::Like,
        Self::Praise,
        Self::Empathy,
        Self::Interest,
        Self::Appreciation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Praise => "praise",
            Self::Empathy => "empathy",
            Self::Interest => "interest",
            Self::Appreciation => "appreciation",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("Unknown reaction type: {s}")))
    }
}

/// Raw engagement counters for a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub reactions_like: i64,
    pub reactions_praise: i64,
    pub reactions_empathy: i64,
    pub reactions_interest: i64,
    pub reactions_appreciation: i64,
    pub total_impressions: i64,
    pub total_shares: i64,
    pub total_comments: i64,
}

impl Metrics {
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("reactions_like", self.reactions_like),
            ("reactions_praise", self.reactions_praise),
            ("reactions_empathy", self.reactions_empathy),
            ("reactions_interest", self.reactions_interest),
            ("reactions_appreciation", self.reactions_appreciation),
            ("total_impressions", self.total_impressions),
            ("total_shares", self.total_shares),
            ("total_comments", self.total_comments),
        ];
        match fields.iter().find(|(_, value)| *value < 0) {
            Some((name, _)) => Err(DomainError::Validation(format!(
                "{name} must not be negative"
            ))),
            None => Ok(()),
        }
    }

    pub fn reaction(&self, kind: ReactionKind) -> i64 {
        match kind {
            ReactionKind::Like => self.reactions_like,
            ReactionKind::Praise => self.reactions_praise,
            ReactionKind::Empathy => self.reactions_empathy,
            ReactionKind::Interest => self.reactions_interest,
            ReactionKind::Appreciation => self.reactions_appreciation,
        }
    }

    pub fn add_reaction(&mut self, kind: ReactionKind, by: i64) {
        let slot = match kind {
            ReactionKind::Like => &mut self.reactions_like,
            ReactionKind::Praise => &mut self.reactions_praise,
            ReactionKind::Empathy => &mut self.reactions_empathy,
            ReactionKind::Interest => &mut self.reactions_interest,
            ReactionKind::Appreciation => &mut self.reactions_appreciation,
        };
        *slot = slot.saturating_add(by);
    }

    pub fn total_reactions(&self) -> i64 {
        ReactionKind::ALL.iter().map(|k| self.reaction(*k)).sum()
    }

    /// Reactions + shares + comments.
    pub fn total_engagement(&self) -> i64 {
        self.total_reactions() + self.total_shares + self.total_comments
    }

    /// Engagement as a percentage of impressions; 0.0 without impressions.
    pub fn engagement_rate(&self) -> f64 {
        if self.total_impressions == 0 {
            return 0.0;
        }
        self.total_engagement() as f64 / self.total_impressions as f64 * 100.0
    }
}

/// Partial update of metrics; `None` leaves a counter untouched.
#[derive(Debug, Clone, Default)]
pub struct MetricsChanges {
    pub reactions_like: Option<i64>,
    pub reactions_praise: Option<i64>,
    pub reactions_empathy: Option<i64>,
    pub reactions_interest: Option<i64>,
    pub reactions_appreciation: Option<i64>,
    pub total_impressions: Option<i64>,
    pub total_shares: Option<i64>,
    pub total_comments: Option<i64>,
}

impl MetricsChanges {
    pub fn apply(&self, metrics: &mut Metrics) {
        let pairs = [
            (&mut metrics.reactions_like, self.reactions_like),
            (&mut metrics.reactions_praise, self.reactions_praise),
            (&mut metrics.reactions_empathy, self.reactions_empathy),
            (&mut metrics.reactions_interest, self.reactions_interest),
            (&mut metrics.reactions_appreciation, self.reactions_appreciation),
            (&mut metrics.total_impressions, self.total_impressions),
            (&mut metrics.total_shares, self.total_shares),
            (&mut metrics.total_comments, self.total_comments),
        ];
        for (slot, value) in pairs {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// Engagement record for a single post (at most one per post).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAnalytics {
    pub id: Uuid,
    pub post_id: Uuid,
    pub metrics: Metrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostAnalytics {
    pub fn new(post_id: Uuid, metrics: Metrics, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            metrics,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A post ranked by engagement.
#[derive(Debug, Clone, PartialEq)]
pub struct TopPost {
    pub post_id: Uuid,
    pub title: String,
    pub content_preview: String,
    pub author_username: String,
    pub author_full_name: Option<String>,
    pub metrics: Metrics,
}

/// Aggregate over the posts visible to a caller in a period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsSummary {
    pub period_days: u32,
    pub total_posts: u64,
    pub total_impressions: i64,
    pub total_reactions: i64,
    pub total_shares: i64,
    pub total_comments: i64,
    pub total_engagement: i64,
    pub average_engagement_rate: f64,
}

impl AnalyticsSummary {
    pub fn from_metrics<'a>(period_days: u32, metrics: impl IntoIterator<Item = &'a Metrics>) -> Self {
        let mut summary = Self {
            period_days,
            ..Self::default()
        };
        let mut rate_sum = 0.0;
        for m in metrics {
            summary.total_posts += 1;
            summary.total_impressions += m.total_impressions;
            summary.total_reactions += m.total_reactions();
            summary.total_shares += m.total_shares;
            summary.total_comments += m.total_comments;
            summary.total_engagement += m.total_engagement();
            rate_sum += m.engagement_rate();
        }
        if summary.total_posts > 0 {
            summary.average_engagement_rate = rate_sum / summary.total_posts as f64;
        }
        summary
    }
}

/// Content truncated for listings: 200 characters followed by "...".
pub fn preview(content: &str) -> String {
    const LIMIT: usize = 200;
    if content.chars().count() > LIMIT {
        let cut: String = content.chars().take(LIMIT).collect();
        format!("{cut}...")
    } else {
        content.to_string()
    }
}
