//! Job-level operations: submission, enrichment and offer generation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::locks::JobLocks;
use super::queue::WorkQueue;
use crate::error::AppError;
use crate::llm::{JobExtractor, OfferGenerator};
use crate::models::job::{Job, JobFilters, JobStatus, RawJobInput};
use crate::models::offer::UserJobOffer;
use crate::store::{DedupKey, Store};

pub struct JobService {
    store: Arc<dyn Store>,
    extractor: Arc<dyn JobExtractor>,
    generator: Arc<dyn OfferGenerator>,
    queue: Option<WorkQueue>,
    locks: JobLocks,
}

impl JobService {
    pub fn new(
        store: Arc<dyn Store>,
        extractor: Arc<dyn JobExtractor>,
        generator: Arc<dyn OfferGenerator>,
    ) -> Self {
        JobService {
            store,
            extractor,
            generator,
            queue: None,
            locks: JobLocks::new(),
        }
    }

    /// Enqueue every newly submitted job for enrichment.
    pub fn with_queue(mut self, queue: WorkQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Create a `raw` job. Fails with `Duplicate` when a job with the same
    /// source identity or content hash already exists.
    pub async fn submit_raw(&self, input: RawJobInput) -> Result<Uuid, AppError> {
        let job = Job::create(input);
        if !self.store.insert_job(&job).await? {
            return Err(AppError::Duplicate(format!(
                "Job from {}/{} already stored",
                job.source_channel_id(),
                job.source_message_id()
            )));
        }

        let job_id = job.id();
        tracing::info!(
            %job_id,
            channel_id = job.source_channel_id(),
            message_id = job.source_message_id(),
            "Job submitted"
        );
        self.enqueue(job_id);
        Ok(job_id)
    }

    /// True if a job matches either the `(channel_id, message_id)` pair or the hash.
    pub async fn check_duplicate(
        &self,
        channel_id: i64,
        message_id: i32,
        hash: &str,
    ) -> Result<bool, AppError> {
        let key = DedupKey {
            channel_id,
            message_id,
            hash: hash.to_string(),
        };
        match self.store.find_duplicate(&key).await {
            Ok(found) => Ok(found.is_some()),
            Err(AppError::DuplicateCheckFailed(msg)) => Err(AppError::DuplicateCheckFailed(msg)),
            Err(e) => Err(AppError::DuplicateCheckFailed(e.to_string())),
        }
    }

    /// Hand a job to the worker pool. Returns false when there is no queue or
    /// it is full.
    pub fn enqueue(&self, job_id: Uuid) -> bool {
        match &self.queue {
            Some(queue) => queue.enqueue(job_id),
            None => false,
        }
    }

    /// Run extraction for one job and record the outcome.
    ///
    /// Holds the job's lock throughout, so a concurrent call for the same id
    /// waits and then fails the `raw` guard instead of extracting twice.
    pub async fn process(&self, job_id: Uuid, cancel: &CancellationToken) -> Result<(), AppError> {
        let _guard = self.locks.lock(job_id).await;

        let mut job = self.find_job(job_id).await?;
        job.mark_processing()?;

        if let Err(e) = self.store.save_job(&job).await {
            tracing::warn!(%job_id, error = %e, "Failed to persist processing state");
        }

        let extracted = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.extractor.extract(job.original_text()) => Some(result),
        };

        match extracted {
            None => {
                self.reject(&mut job, "extraction cancelled").await;
                Err(AppError::Cancelled)
            }
            Some(Err(e)) => {
                tracing::error!(%job_id, error = %e, "Extraction failed");
                self.reject(&mut job, "extraction failed").await;
                Err(AppError::ExtractionFailed(e.to_string()))
            }
            Some(Ok(parsed)) if !parsed.is_vacancy => {
                tracing::info!(%job_id, "Not a vacancy");
                self.reject(&mut job, "not a vacancy").await;
                Ok(())
            }
            Some(Ok(parsed)) => {
                job.complete(parsed)?;
                self.save_terminal(&job).await?;
                tracing::info!(%job_id, title = job.title(), "Job processed");
                Ok(())
            }
        }
    }

    /// Persist a terminal state, retrying once. A job whose write still fails
    /// stays `processing` in storage until the sweep reaps it.
    async fn save_terminal(&self, job: &Job) -> Result<(), AppError> {
        if let Err(e) = self.store.save_job(job).await {
            tracing::warn!(
                job_id = %job.id(),
                status = %job.status(),
                error = %e,
                "Terminal write failed, retrying"
            );
            return self.store.save_job(job).await;
        }
        Ok(())
    }

    async fn reject(&self, job: &mut Job, reason: &str) {
        if let Err(e) = job.reject(reason) {
            tracing::error!(job_id = %job.id(), error = %e, "Cannot reject job");
            return;
        }
        if let Err(e) = self.save_terminal(job).await {
            tracing::error!(job_id = %job.id(), error = %e, "Failed to persist rejection");
        }
    }

    /// Generate an outreach message for `user_id` and remember it. The text is
    /// returned even if storing it fails.
    pub async fn generate_offer(
        &self,
        job_id: Uuid,
        user_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<String, AppError> {
        let job = self.find_job(job_id).await?;
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

        if job.status() != JobStatus::Processed {
            return Err(AppError::NotProcessed(job_id.to_string()));
        }

        let body = format!("{}\n{}", job.description(), job.original_text());
        let cv = user.cv_json();
        let generated = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            result = self.generator.generate(&cv, &body) => result,
        };
        let text = generated.map_err(|e| AppError::GenerationFailed(e.to_string()))?;

        let offer = UserJobOffer::new(user_id, job_id, text.clone());
        if let Err(e) = self.store.upsert_offer(&offer).await {
            tracing::error!(%job_id, %user_id, error = %e, "Failed to store offer");
        }

        Ok(text)
    }

    pub async fn find_job(&self, job_id: Uuid) -> Result<Job, AppError> {
        self.store
            .find_job(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
    }

    pub async fn list_jobs(&self, filters: &JobFilters) -> Result<Vec<Job>, AppError> {
        self.store.list_jobs(filters).await
    }

    pub async fn find_offer(&self, job_id: Uuid, user_id: Uuid) -> Result<UserJobOffer, AppError> {
        self.store
            .find_offer(user_id, job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No offer for job {job_id}")))
    }

    async fn all_with_status(&self, status: JobStatus) -> Result<Vec<Job>, AppError> {
        let mut filters = JobFilters::with_status(status);
        let mut jobs = Vec::new();
        for page in 1.. {
            filters.page = Some(page);
            let batch = self.store.list_jobs(&filters).await?;
            let done = (batch.len() as i64) < filters.limit();
            jobs.extend(batch);
            if done {
                break;
            }
        }
        Ok(jobs)
    }

    /// Reject jobs stuck in `processing` by a previous run. Only safe before
    /// any worker of this instance has started.
    pub async fn recover_interrupted(&self) -> Result<usize, AppError> {
        let stuck = self.all_with_status(JobStatus::Processing).await?;
        let count = stuck.len();
        for mut job in stuck {
            tracing::warn!(job_id = %job.id(), "Rejecting interrupted job");
            self.reject(&mut job, "interrupted").await;
        }
        Ok(count)
    }

    /// Reject `processing` jobs that no task of this instance is working on,
    /// such as those whose terminal write failed. Returns how many were reaped.
    pub async fn reap_orphaned(&self) -> Result<usize, AppError> {
        let mut count = 0;
        for job in self.all_with_status(JobStatus::Processing).await? {
            let job_id = job.id();
            if self.locks.is_held(job_id) {
                continue;
            }
            let _guard = self.locks.lock(job_id).await;
            let mut job = self.find_job(job_id).await?;
            if job.status() != JobStatus::Processing {
                continue;
            }
            tracing::warn!(%job_id, "Rejecting orphaned job");
            self.reject(&mut job, "orphaned").await;
            count += 1;
        }
        Ok(count)
    }

    /// True while a job is `raw`, or `processing` under a live task.
    /// Orphaned `processing` jobs do not count.
    pub async fn has_pending_work(&self) -> Result<bool, AppError> {
        let mut filters = JobFilters::with_status(JobStatus::Raw);
        filters.per_page = Some(1);
        if !self.store.list_jobs(&filters).await?.is_empty() {
            return Ok(true);
        }
        Ok(self
            .all_with_status(JobStatus::Processing)
            .await?
            .iter()
            .any(|job| self.locks.is_held(job.id())))
    }

    /// Put `raw` jobs back on the queue. Stops early once the queue is full.
    pub async fn requeue_raw(&self) -> Result<usize, AppError> {
        if self.queue.is_none() {
            return Ok(0);
        }
        let mut count = 0;
        for job in self.all_with_status(JobStatus::Raw).await? {
            if !self.enqueue(job.id()) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }
}
