#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use jobfeed::auth::{generate_token, hash_token};
use jobfeed::collectors::{CollectorService, KeywordFilter, Message};
use jobfeed::jobs::{JobService, WorkQueue};
use jobfeed::models::job::ParsedData;
use jobfeed::models::user::{CreateUser, UserProfile};
use jobfeed::routes::{self, AppState};
use jobfeed::store::{MemoryStore, Store, UserStore};

use super::stubs::{StubExtractor, StubGenerator};

pub const SCENARIO_TEXT: &str = "We are hiring a Senior Golang Developer, remote, $4000-$6000";

pub fn golang_vacancy() -> ParsedData {
    ParsedData {
        is_vacancy: true,
        title: "Senior Golang Developer".into(),
        salary_min: 4000,
        salary_max: 6000,
        currency: "USD".into(),
        is_remote: true,
        description: "Backend services in Go.".into(),
        ..Default::default()
    }
}

pub fn message(channel_id: i64, message_id: i32, text: &str) -> Message {
    Message {
        text: text.to_string(),
        channel_id,
        message_id,
        raw: Some(json!({"channel": channel_id, "id": message_id})),
    }
}

/// Wired-up pipeline over an in-memory store with stubbed model calls.
/// The scenario message is shorter than the default length gate, so the
/// harness filter uses a lower threshold.
pub struct TestHarness {
    pub store: Arc<dyn Store>,
    pub extractor: Arc<StubExtractor>,
    pub generator: Arc<StubGenerator>,
    pub jobs: Arc<JobService>,
    pub collector: Arc<CollectorService>,
    pub shutdown: CancellationToken,
}

impl TestHarness {
    pub fn new(extractor: StubExtractor, generator: StubGenerator) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), extractor, generator, None)
    }

    pub fn with_store(
        store: Arc<dyn Store>,
        extractor: StubExtractor,
        generator: StubGenerator,
        queue: Option<WorkQueue>,
    ) -> Self {
        let extractor = Arc::new(extractor);
        let generator = Arc::new(generator);
        let mut jobs = JobService::new(store.clone(), extractor.clone(), generator.clone());
        if let Some(queue) = queue {
            jobs = jobs.with_queue(queue);
        }
        let jobs = Arc::new(jobs);
        let filter = KeywordFilter::new().with_min_length(40);
        let collector = Arc::new(CollectorService::new(jobs.clone(), filter));

        TestHarness {
            store,
            extractor,
            generator,
            jobs,
            collector,
            shutdown: CancellationToken::new(),
        }
    }

    /// Register a user and return it with its bearer token.
    pub async fn user(&self, name: &str) -> (UserProfile, String) {
        let token = generate_token();
        let user = self
            .store
            .create_user(CreateUser {
                name: name.to_string(),
                cv: json!({"name": name, "skills": ["go", "postgres"]}),
                token_hash: hash_token(&token),
            })
            .await
            .unwrap();
        (user, token)
    }

    pub fn router(&self) -> Router {
        routes::router(AppState {
            jobs: self.jobs.clone(),
            collector: self.collector.clone(),
            shutdown: self.shutdown.clone(),
        })
    }
}
