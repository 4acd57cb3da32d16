//! Event sink port - receives one record per publish attempt.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Result of one publish attempt within a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum PublishOutcome {
    Published {
        external_id: Option<String>,
    },
    /// The post was no longer eligible (unscheduled, rescheduled or deleted).
    Skipped {
        reason: String,
    },
    /// The post stays scheduled unless `reverted_to_draft`.
    Failed {
        error: String,
        attempts: Option<u32>,
        reverted_to_draft: bool,
    },
}

impl PublishOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Published { .. } => "published",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishRecord {
    pub post_id: Uuid,
    #[serde(flatten)]
    pub outcome: PublishOutcome,
    pub at: DateTime<Utc>,
}

pub trait PublishEventSink: Send + Sync {
    fn record(&self, record: &PublishRecord);
}
