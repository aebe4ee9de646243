use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::prompts::{EXTRACTION_SYSTEM_PROMPT, OFFER_SYSTEM_PROMPT, offer_user_prompt};
use super::schema::strict_schema;
use super::{JobExtractor, OfferGenerator};
use crate::models::job::ParsedData;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const SCHEMA_NAME: &str = "job_parser";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Minimal chat-completions client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Send a system + user exchange and return the first choice's content,
    /// `None` when the model returned no choices.
    pub async fn chat(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
        response_format: Option<Value>,
    ) -> Result<Option<String>> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            response_format,
        };

        tracing::debug!(model, structured = request.response_format.is_some(), "Chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Chat API error ({status}): {error_text}"));
        }

        let body: ChatResponse = response.json().await?;
        Ok(body.choices.into_iter().next().and_then(|c| c.message.content))
    }
}

/// Extraction through strict structured output.
#[derive(Debug, Clone)]
pub struct OpenAiExtractor {
    client: OpenAiClient,
    model: String,
}

impl OpenAiExtractor {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

fn response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": SCHEMA_NAME,
            "schema": strict_schema::<ParsedData>(),
            "strict": true,
        }
    })
}

#[async_trait]
impl JobExtractor for OpenAiExtractor {
    async fn extract(&self, text: &str) -> Result<ParsedData> {
        let content = self
            .client
            .chat(
                &self.model,
                EXTRACTION_SYSTEM_PROMPT,
                text,
                Some(response_format()),
            )
            .await?
            .ok_or_else(|| anyhow!("No response from model"))?;
        let parsed = serde_json::from_str(&content)?;
        Ok(parsed)
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiOfferGenerator {
    client: OpenAiClient,
    model: String,
}

impl OpenAiOfferGenerator {
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl OfferGenerator for OpenAiOfferGenerator {
    async fn generate(&self, cv: &str, job_description: &str) -> Result<String> {
        let content = self
            .client
            .chat(
                &self.model,
                OFFER_SYSTEM_PROMPT,
                &offer_user_prompt(cv, job_description),
                None,
            )
            .await?;
        Ok(content.unwrap_or_default())
    }
}
