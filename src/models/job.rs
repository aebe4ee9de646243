use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Display title used until extraction supplies a real one.
pub const PLACEHOLDER_TITLE: &str = "Pending Analysis";
const MAX_TITLE_RUNES: usize = 100;
const ELLIPSIS: &str = "...";

/// Lifecycle of a job: `raw -> processing -> {processed, rejected}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Raw,
    Processing,
    Processed,
    Rejected,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Raw => "raw",
            JobStatus::Processing => "processing",
            JobStatus::Processed => "processed",
            JobStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Processed | JobStatus::Rejected)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to create a job in `raw` state.
#[derive(Debug, Clone)]
pub struct RawJobInput {
    pub original_text: String,
    pub source_channel_id: i64,
    pub source_message_id: i32,
    pub hash: String,
    pub raw: Option<serde_json::Value>,
}

/// Structured extraction result. Field names are the wire contract with the
/// model's strict JSON schema and must not change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedData {
    /// False for spam, advertisements and anything that is not a job posting.
    pub is_vacancy: bool,
    pub title: String,
    pub company: String,
    /// Minimum salary, 0 when not stated.
    pub salary_min: i32,
    /// Maximum salary, 0 when not stated.
    pub salary_max: i32,
    /// Currency code such as USD, EUR or RUB.
    pub currency: String,
    pub skills: Vec<String>,
    pub is_remote: bool,
    /// Junior, Middle, Senior, Lead and so on.
    pub grade: String,
    pub location: String,
    /// Short description of the role.
    pub description: String,
}

/// Aggregate root for one candidate posting.
///
/// Identity fields are fixed at creation and `status` only moves through the
/// transition methods below, so fields are private and exposed read-only.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Job {
    id: Uuid,
    status: JobStatus,
    title: String,
    original_text: String,
    source_channel_id: i64,
    source_message_id: i32,
    hash: String,
    url: String,
    #[serde(skip_serializing)]
    raw: Option<serde_json::Value>,
    company: String,
    salary_min: i32,
    salary_max: i32,
    currency: String,
    grade: String,
    location: String,
    is_remote: bool,
    description: String,
    skills: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Job {
    /// Build a new job in `raw` state.
    pub fn create(input: RawJobInput) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            status: JobStatus::Raw,
            title: display_title(&input.original_text),
            url: source_url(input.source_channel_id, input.source_message_id),
            original_text: input.original_text,
            source_channel_id: input.source_channel_id,
            source_message_id: input.source_message_id,
            hash: input.hash,
            raw: input.raw,
            company: String::new(),
            salary_min: 0,
            salary_max: 0,
            currency: String::new(),
            grade: String::new(),
            location: String::new(),
            is_remote: false,
            description: String::new(),
            skills: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_processing(&mut self) -> Result<(), AppError> {
        self.transition(JobStatus::Raw, JobStatus::Processing)
    }

    /// Copy the extracted fields in and finish as `processed`.
    pub fn complete(&mut self, parsed: ParsedData) -> Result<(), AppError> {
        self.transition(JobStatus::Processing, JobStatus::Processed)?;
        self.title = parsed.title;
        self.company = parsed.company;
        self.salary_min = parsed.salary_min;
        self.salary_max = parsed.salary_max;
        self.currency = parsed.currency;
        self.grade = parsed.grade;
        self.location = parsed.location;
        self.is_remote = parsed.is_remote;
        self.description = parsed.description;
        self.skills = parsed.skills;
        Ok(())
    }

    /// Finish as `rejected`. The reason is only logged.
    pub fn reject(&mut self, reason: &str) -> Result<(), AppError> {
        self.transition(JobStatus::Processing, JobStatus::Rejected)?;
        tracing::debug!(job_id = %self.id, reason, "Job rejected");
        Ok(())
    }

    fn transition(&mut self, from: JobStatus, to: JobStatus) -> Result<(), AppError> {
        if self.status != from {
            return Err(AppError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn source_channel_id(&self) -> i64 {
        self.source_channel_id
    }

    pub fn source_message_id(&self) -> i32 {
        self.source_message_id
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn raw(&self) -> Option<&serde_json::Value> {
        self.raw.as_ref()
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn salary_min(&self) -> i32 {
        self.salary_min
    }

    pub fn salary_max(&self) -> i32 {
        self.salary_max
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn grade(&self) -> &str {
        &self.grade
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn is_remote(&self) -> bool {
        self.is_remote
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// First line of the posting, verbatim, capped at 100 runes including the
/// ellipsis.
pub fn display_title(text: &str) -> String {
    let first_line = text.split('\n').next().unwrap_or("");
    if first_line.is_empty() {
        return PLACEHOLDER_TITLE.to_string();
    }
    if first_line.chars().count() > MAX_TITLE_RUNES {
        let keep = MAX_TITLE_RUNES - ELLIPSIS.chars().count();
        let mut title: String = first_line.chars().take(keep).collect();
        title.push_str(ELLIPSIS);
        title
    } else {
        first_line.to_string()
    }
}

/// Deep link into the origin channel.
pub fn source_url(channel_id: i64, message_id: i32) -> String {
    format!("https://t.me/c/{channel_id}/{message_id}")
}

/// Query filters for job listings.
#[derive(Debug, Default, Deserialize)]
pub struct JobFilters {
    pub status: Option<JobStatus>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl JobFilters {
    pub fn with_status(status: JobStatus) -> Self {
        JobFilters {
            status: Some(status),
            per_page: Some(MAX_PAGE_SIZE),
            ..Default::default()
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page.unwrap_or(50).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page.unwrap_or(1) - 1).max(0) * self.limit()
    }
}

const MAX_PAGE_SIZE: i64 = 100;
