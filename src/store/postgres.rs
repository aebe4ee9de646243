use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DedupKey, JobStore, OfferStore, UserStore};
use crate::error::AppError;
use crate::models::job::{Job, JobFilters};
use crate::models::offer::UserJobOffer;
use crate::models::user::{CreateUser, UserProfile};

/// Postgres-backed store. Dedup and offer uniqueness are enforced by unique
/// indexes, see `migrations/`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE metacharacters so the search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl JobStore for PgStore {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn find_duplicate(&self, key: &DedupKey) -> Result<Option<Uuid>, AppError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM jobs WHERE (source_channel_id = $1 AND source_message_id = $2) OR hash = $3 LIMIT 1",
        )
        .bind(key.channel_id)
        .bind(key.message_id)
        .bind(&key.hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DuplicateCheckFailed(e.to_string()))?;
        Ok(row.map(|r| r.0))
    }

    async fn insert_job(&self, job: &Job) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO jobs (id, status, title, original_text, source_channel_id, source_message_id, hash, url, raw, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) ON CONFLICT DO NOTHING",
        )
        .bind(job.id())
        .bind(job.status())
        .bind(job.title())
        .bind(job.original_text())
        .bind(job.source_channel_id())
        .bind(job.source_message_id())
        .bind(job.hash())
        .bind(job.url())
        .bind(job.raw())
        .bind(job.created_at())
        .bind(job.updated_at())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn save_job(&self, job: &Job) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE jobs SET status = $2, title = $3, company = $4, salary_min = $5, salary_max = $6, currency = $7, grade = $8, location = $9, is_remote = $10, description = $11, skills = $12, updated_at = NOW() WHERE id = $1",
        )
        .bind(job.id())
        .bind(job.status())
        .bind(job.title())
        .bind(job.company())
        .bind(job.salary_min())
        .bind(job.salary_max())
        .bind(job.currency())
        .bind(job.grade())
        .bind(job.location())
        .bind(job.is_remote())
        .bind(job.description())
        .bind(job.skills())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::PersistenceFailed(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Job {} not found", job.id())));
        }
        Ok(())
    }

    async fn list_jobs(&self, filters: &JobFilters) -> Result<Vec<Job>, AppError> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE ($1::job_status IS NULL OR status = $1) AND ($2::text IS NULL OR title ILIKE '%' || $2 || '%' ESCAPE '\\') ORDER BY created_at DESC, id LIMIT $3 OFFSET $4",
        )
        .bind(filters.status)
        .bind(filters.search.as_deref().map(escape_like))
        .bind(filters.limit())
        .bind(filters.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    async fn ping(&self) -> Result<(), AppError> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let user = sqlx::query_as::<_, UserProfile>(
            "SELECT id, name, cv, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_token(&self, token_hash: &str) -> Result<Option<UserProfile>, AppError> {
        let user = sqlx::query_as::<_, UserProfile>(
            "SELECT id, name, cv, created_at FROM users WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, input: CreateUser) -> Result<UserProfile, AppError> {
        let user = sqlx::query_as::<_, UserProfile>(
            "INSERT INTO users (id, name, cv, token_hash) VALUES ($1, $2, $3, $4) RETURNING id, name, cv, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.cv)
        .bind(&input.token_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl OfferStore for PgStore {
    async fn upsert_offer(&self, offer: &UserJobOffer) -> Result<UserJobOffer, AppError> {
        let stored = sqlx::query_as::<_, UserJobOffer>(
            "INSERT INTO user_job_offers (id, user_id, job_id, offer_text) VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, job_id)
             DO UPDATE SET offer_text = EXCLUDED.offer_text, updated_at = NOW()
             RETURNING *",
        )
        .bind(offer.id)
        .bind(offer.user_id)
        .bind(offer.job_id)
        .bind(&offer.offer_text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::PersistenceFailed(e.to_string()))?;
        Ok(stored)
    }

    async fn find_offer(
        &self,
        user_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<UserJobOffer>, AppError> {
        let offer = sqlx::query_as::<_, UserJobOffer>(
            "SELECT * FROM user_job_offers WHERE user_id = $1 AND job_id = $2",
        )
        .bind(user_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(offer)
    }
}
