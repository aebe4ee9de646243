use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{DedupKey, JobStore, OfferStore, UserStore};
use crate::error::AppError;
use crate::models::job::{Job, JobFilters};
use crate::models::offer::UserJobOffer;
use crate::models::user::{CreateUser, UserProfile};

/// In-process store. Every operation runs under one lock, so dedup
/// check-and-insert is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<Uuid, Job>,
    users: HashMap<Uuid, (UserProfile, String)>,
    offers: HashMap<(Uuid, Uuid), UserJobOffer>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    pub fn job_count(&self) -> usize {
        self.lock().map(|inner| inner.jobs.len()).unwrap_or(0)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        Ok(self.lock()?.jobs.get(&id).cloned())
    }

    async fn find_duplicate(&self, key: &DedupKey) -> Result<Option<Uuid>, AppError> {
        Ok(self
            .lock()?
            .jobs
            .values()
            .find(|job| key.matches(job))
            .map(Job::id))
    }

    async fn insert_job(&self, job: &Job) -> Result<bool, AppError> {
        let mut inner = self.lock()?;
        let key = DedupKey::of(job);
        if inner.jobs.values().any(|existing| key.matches(existing)) {
            return Ok(false);
        }
        inner.jobs.insert(job.id(), job.clone());
        Ok(true)
    }

    async fn save_job(&self, job: &Job) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        match inner.jobs.get_mut(&job.id()) {
            Some(existing) => {
                *existing = job.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Job {} not found", job.id()))),
        }
    }

    async fn list_jobs(&self, filters: &JobFilters) -> Result<Vec<Job>, AppError> {
        let inner = self.lock()?;
        let search = filters.search.as_deref().map(str::to_lowercase);
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|job| filters.status.is_none_or(|s| job.status() == s))
            .filter(|job| {
                search
                    .as_deref()
                    .is_none_or(|q| job.title().to_lowercase().contains(q))
            })
            .cloned()
            .collect();
        jobs.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(jobs
            .into_iter()
            .skip(filters.offset() as usize)
            .take(filters.limit() as usize)
            .collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(self.lock()?.users.get(&id).map(|(user, _)| user.clone()))
    }

    async fn find_user_by_token(&self, token_hash: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|(_, hash)| hash == token_hash)
            .map(|(user, _)| user.clone()))
    }

    async fn create_user(&self, input: CreateUser) -> Result<UserProfile, AppError> {
        let user = UserProfile {
            id: Uuid::new_v4(),
            name: input.name,
            cv: input.cv,
            created_at: Utc::now(),
        };
        self.lock()?
            .users
            .insert(user.id, (user.clone(), input.token_hash));
        Ok(user)
    }
}

#[async_trait]
impl OfferStore for MemoryStore {
    async fn upsert_offer(&self, offer: &UserJobOffer) -> Result<UserJobOffer, AppError> {
        let mut inner = self.lock()?;
        let stored = inner
            .offers
            .entry((offer.user_id, offer.job_id))
            .and_modify(|existing| {
                existing.offer_text = offer.offer_text.clone();
                existing.updated_at = Utc::now();
            })
            .or_insert_with(|| offer.clone());
        Ok(stored.clone())
    }

    async fn find_offer(
        &self,
        user_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<UserJobOffer>, AppError> {
        Ok(self.lock()?.offers.get(&(user_id, job_id)).cloned())
    }
}
