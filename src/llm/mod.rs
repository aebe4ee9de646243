//! Model-backed capabilities. The pipeline only sees the two traits; the
//! OpenAI-compatible implementations live in `openai`.

pub mod openai;
pub mod prompts;
pub mod schema;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::job::ParsedData;

pub use openai::{OpenAiClient, OpenAiExtractor, OpenAiOfferGenerator};

/// Turns free-form posting text into structured fields.
#[async_trait]
pub trait JobExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<ParsedData>;
}

/// Writes a personalized first-touch message from a CV and a job description.
#[async_trait]
pub trait OfferGenerator: Send + Sync {
    async fn generate(&self, cv: &str, job_description: &str) -> Result<String>;
}
