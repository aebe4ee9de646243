//! Narrow persistence seams used by the pipeline.
//!
//! The services only depend on these traits; `PgStore` backs them with
//! Postgres and `MemoryStore` keeps everything in-process.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::job::{Job, JobFilters};
use crate::models::offer::UserJobOffer;
use crate::models::user::{CreateUser, UserProfile};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Deduplication key: a job matches if either the source identity pair or the
/// content hash is already stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupKey {
    pub channel_id: i64,
    pub message_id: i32,
    pub hash: String,
}

impl DedupKey {
    pub fn of(job: &Job) -> Self {
        DedupKey {
            channel_id: job.source_channel_id(),
            message_id: job.source_message_id(),
            hash: job.hash().to_string(),
        }
    }

    pub fn matches(&self, job: &Job) -> bool {
        (job.source_channel_id() == self.channel_id && job.source_message_id() == self.message_id)
            || job.hash() == self.hash
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, AppError>;

    /// Id of any stored job sharing the dedup key.
    async fn find_duplicate(&self, key: &DedupKey) -> Result<Option<Uuid>, AppError>;

    /// Insert if no job shares the dedup key. Returns false when one does.
    async fn insert_job(&self, job: &Job) -> Result<bool, AppError>;

    /// Persist status and enrichment fields of an existing job.
    async fn save_job(&self, job: &Job) -> Result<(), AppError>;

    async fn list_jobs(&self, filters: &JobFilters) -> Result<Vec<Job>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserProfile>, AppError>;

    async fn find_user_by_token(&self, token_hash: &str) -> Result<Option<UserProfile>, AppError>;

    async fn create_user(&self, input: CreateUser) -> Result<UserProfile, AppError>;
}

#[async_trait]
pub trait OfferStore: Send + Sync {
    /// Create or replace the offer for `(user_id, job_id)`; last write wins.
    async fn upsert_offer(&self, offer: &UserJobOffer) -> Result<UserJobOffer, AppError>;

    async fn find_offer(&self, user_id: Uuid, job_id: Uuid)
    -> Result<Option<UserJobOffer>, AppError>;
}

/// Everything the service needs, implemented by both backends.
pub trait Store: JobStore + UserStore + OfferStore {}

impl<T: JobStore + UserStore + OfferStore> Store for T {}
