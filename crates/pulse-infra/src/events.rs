//! Publish event sinks.

use std::sync::Mutex;

use pulse_core::ports::{PublishEventSink, PublishOutcome, PublishRecord};

/// Writes one structured log event per publish attempt.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl PublishEventSink for TracingEventSink {
    fn record(&self, record: &PublishRecord) {
        match &record.outcome {
            PublishOutcome::Published { external_id } => tracing::info!(
                post_id = %record.post_id,
                outcome = "published",
                external_id = external_id.as_deref().unwrap_or(""),
                at = %record.at,
                "Post published"
            ),
            PublishOutcome::Skipped { reason } => tracing::info!(
                post_id = %record.post_id,
                outcome = "skipped",
                reason = %reason,
                at = %record.at,
                "Post skipped"
            ),
            PublishOutcome::Failed {
                error,
                attempts,
                reverted_to_draft,
            } => tracing::warn!(
                post_id = %record.post_id,
                outcome = "failed",
                error = %error,
                attempts = attempts.unwrap_or_default(),
                reverted_to_draft,
                at = %record.at,
                "Post publish failed"
            ),
        }
    }
}

/// Keeps every record in memory; handy for tests and admin inspection.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    records: Mutex<Vec<PublishRecord>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PublishRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

impl PublishEventSink for RecordingEventSink {
    fn record(&self, record: &PublishRecord) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.push(record.clone());
    }
}
