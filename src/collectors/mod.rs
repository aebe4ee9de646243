//! Ingestion side: transports hand messages to the collector service, which
//! filters, deduplicates and submits raw jobs.

pub mod feed;
pub mod filter;
pub mod fingerprint;
pub mod runner;
pub mod service;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use feed::JsonLinesFeed;
pub use filter::KeywordFilter;
pub use fingerprint::fingerprint;
pub use service::{CollectStats, CollectorService, Outcome};

/// One inbound chat message. `raw` is the transport's own payload, stored for
/// audit and never inspected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub text: String,
    pub channel_id: i64,
    pub message_id: i32,
    #[serde(default)]
    pub raw: Option<serde_json::Value>,
}

/// A source of inbound messages.
#[async_trait]
pub trait MessageFeed: Send {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Next message, or `None` once the feed is exhausted.
    async fn next_message(&mut self) -> Result<Option<Message>, AppError>;
}
