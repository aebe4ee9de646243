use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::Message;
use super::filter::KeywordFilter;
use super::fingerprint::fingerprint;
use crate::error::AppError;
use crate::jobs::JobService;
use crate::models::job::RawJobInput;

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Empty,
    Filtered,
    Duplicate,
    Submitted(Uuid),
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectStats {
    pub submitted: u64,
    pub filtered: u64,
    pub duplicate: u64,
    pub empty: u64,
    pub failed: u64,
}

impl CollectStats {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Empty => self.empty += 1,
            Outcome::Filtered => self.filtered += 1,
            Outcome::Duplicate => self.duplicate += 1,
            Outcome::Submitted(_) => self.submitted += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.submitted + self.filtered + self.duplicate + self.empty + self.failed
    }
}

/// Turns inbound messages into `raw` jobs. Never fails: every problem is
/// logged and reported as an `Outcome`.
pub struct CollectorService {
    jobs: Arc<JobService>,
    filter: KeywordFilter,
}

impl CollectorService {
    pub fn new(jobs: Arc<JobService>, filter: KeywordFilter) -> Self {
        Self { jobs, filter }
    }

    pub async fn handle(&self, msg: Message) -> Outcome {
        if msg.text.is_empty() {
            return Outcome::Empty;
        }
        if !self.filter.should_process(&msg.text) {
            tracing::debug!(
                channel_id = msg.channel_id,
                message_id = msg.message_id,
                "Filtered out"
            );
            return Outcome::Filtered;
        }

        let hash = fingerprint(&msg.text);
        match self
            .jobs
            .check_duplicate(msg.channel_id, msg.message_id, &hash)
            .await
        {
            Ok(true) => {
                tracing::debug!(%hash, "Duplicate message skipped");
                return Outcome::Duplicate;
            }
            Ok(false) => {}
            // Fail open: a broken lookup must not stall ingestion.
            Err(e) => tracing::warn!(%hash, error = %e, "Duplicate check failed"),
        }

        let input = RawJobInput {
            original_text: msg.text,
            source_channel_id: msg.channel_id,
            source_message_id: msg.message_id,
            hash,
            raw: msg.raw,
        };
        let (channel_id, message_id) = (input.source_channel_id, input.source_message_id);

        match self.jobs.submit_raw(input).await {
            Ok(job_id) => Outcome::Submitted(job_id),
            Err(AppError::Duplicate(_)) => {
                tracing::debug!(channel_id, message_id, "Duplicate lost the insert race");
                Outcome::Duplicate
            }
            Err(e) => {
                tracing::error!(channel_id, message_id, error = %e, "Failed to submit job");
                Outcome::Failed
            }
        }
    }

    pub async fn handle_batch(&self, messages: Vec<Message>) -> CollectStats {
        let mut stats = CollectStats::default();
        for msg in messages {
            stats.record(&self.handle(msg).await);
        }
        stats
    }
}
