//! Hand-written doubles for the model capabilities and the store.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use uuid::Uuid;

use jobfeed::error::AppError;
use jobfeed::llm::{JobExtractor, OfferGenerator};
use jobfeed::models::job::{Job, JobFilters, JobStatus, ParsedData};
use jobfeed::models::offer::UserJobOffer;
use jobfeed::models::user::{CreateUser, UserProfile};
use jobfeed::store::{DedupKey, JobStore, MemoryStore, OfferStore, UserStore};

/// Returns a fixed result and records every text it was asked to extract.
pub struct StubExtractor {
    result: Option<ParsedData>,
    delay: Duration,
    pub calls: Mutex<Vec<String>>,
}

impl StubExtractor {
    pub fn returning(parsed: ParsedData) -> Self {
        StubExtractor {
            result: Some(parsed),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        StubExtractor {
            result: None,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl JobExtractor for StubExtractor {
    async fn extract(&self, text: &str) -> anyhow::Result<ParsedData> {
        self.calls.lock().unwrap().push(text.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone().ok_or_else(|| anyhow!("model unavailable"))
    }
}

/// Hands out queued texts in order; fails once the queue is empty.
#[derive(Default)]
pub struct StubGenerator {
    responses: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl StubGenerator {
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StubGenerator {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl OfferGenerator for StubGenerator {
    async fn generate(&self, cv: &str, job_description: &str) -> anyhow::Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((cv.to_string(), job_description.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("generator exhausted"))
    }
}

/// Memory store with switchable failures.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    dedup_fails: AtomicBool,
    offers_fail: AtomicBool,
    /// Remaining `save_job` failures per status being written.
    save_failures: Mutex<HashMap<JobStatus, usize>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_dedup(self) -> Self {
        self.dedup_fails.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_offers(self) -> Self {
        self.offers_fail.store(true, Ordering::SeqCst);
        self
    }

    /// Fail the next `times` saves of a job in `status`.
    pub fn failing_saves(self, status: JobStatus, times: usize) -> Self {
        self.save_failures.lock().unwrap().insert(status, times);
        self
    }

    pub fn heal_saves(&self) {
        self.save_failures.lock().unwrap().clear();
    }
}

#[async_trait]
impl JobStore for FaultyStore {
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>, AppError> {
        self.inner.find_job(id).await
    }

    async fn find_duplicate(&self, key: &DedupKey) -> Result<Option<Uuid>, AppError> {
        if self.dedup_fails.load(Ordering::SeqCst) {
            return Err(AppError::DuplicateCheckFailed("connection reset".into()));
        }
        self.inner.find_duplicate(key).await
    }

    async fn insert_job(&self, job: &Job) -> Result<bool, AppError> {
        self.inner.insert_job(job).await
    }

    async fn save_job(&self, job: &Job) -> Result<(), AppError> {
        {
            let mut failures = self.save_failures.lock().unwrap();
            if let Some(left) = failures.get_mut(&job.status())
                && *left > 0
            {
                *left -= 1;
                return Err(AppError::PersistenceFailed("disk full".into()));
            }
        }
        self.inner.save_job(job).await
    }

    async fn list_jobs(&self, filters: &JobFilters) -> Result<Vec<Job>, AppError> {
        self.inner.list_jobs(filters).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.inner.ping().await
    }
}

#[async_trait]
impl UserStore for FaultyStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserProfile>, AppError> {
        self.inner.find_user(id).await
    }

    async fn find_user_by_token(&self, token_hash: &str) -> Result<Option<UserProfile>, AppError> {
        self.inner.find_user_by_token(token_hash).await
    }

    async fn create_user(&self, input: CreateUser) -> Result<UserProfile, AppError> {
        self.inner.create_user(input).await
    }
}

#[async_trait]
impl OfferStore for FaultyStore {
    async fn upsert_offer(&self, offer: &UserJobOffer) -> Result<UserJobOffer, AppError> {
        if self.offers_fail.load(Ordering::SeqCst) {
            return Err(AppError::PersistenceFailed("disk full".into()));
        }
        self.inner.upsert_offer(offer).await
    }

    async fn find_offer(
        &self,
        user_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<UserJobOffer>, AppError> {
        self.inner.find_offer(user_id, job_id).await
    }
}
