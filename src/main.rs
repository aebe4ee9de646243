use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use jobfeed::auth::{generate_token, hash_token};
use jobfeed::collectors::{self, CollectorService, JsonLinesFeed, MessageFeed};
use jobfeed::config::{Command, Config};
use jobfeed::db;
use jobfeed::jobs::{JobService, WorkQueue, WorkerPool, spawn_sweeper, spawn_workers};
use jobfeed::llm::{OpenAiClient, OpenAiExtractor, OpenAiOfferGenerator};
use jobfeed::models::user::CreateUser;
use jobfeed::routes::{self, AppState};
use jobfeed::store::{MemoryStore, PgStore, Store};

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobfeed=info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    if config.uses_memory_store() {
        tracing::warn!("Using in-memory store, nothing will be persisted");
        return Ok(Arc::new(MemoryStore::new()));
    }

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    if config.run_migrations {
        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;
        tracing::info!("Migrations complete");
    }

    Ok(Arc::new(PgStore::new(pool)))
}

/// Job service with its worker pool and sweeper running.
struct Pipeline {
    jobs: Arc<JobService>,
    workers: WorkerPool,
    sweeper: JoinHandle<()>,
}

impl Pipeline {
    async fn start(
        config: &Config,
        store: Arc<dyn Store>,
        shutdown: &CancellationToken,
    ) -> anyhow::Result<Pipeline> {
        if config.openai_api_key.is_empty() {
            tracing::warn!("OPENAI_API_KEY is not set, model calls will fail");
        }
        let client =
            OpenAiClient::new(&config.openai_api_key).with_base_url(&config.openai_base_url);
        let extractor = OpenAiExtractor::new(client.clone(), &config.extract_model);
        let generator = OpenAiOfferGenerator::new(client, &config.offer_model);

        let (queue, rx) = WorkQueue::new(config.queue_capacity);
        let jobs = Arc::new(
            JobService::new(store, Arc::new(extractor), Arc::new(generator)).with_queue(queue),
        );

        let interrupted = jobs.recover_interrupted().await?;
        if interrupted > 0 {
            tracing::warn!("Rejected {interrupted} jobs interrupted by a previous run");
        }

        let workers = spawn_workers(jobs.clone(), rx, config.workers, shutdown.clone());
        let sweeper = spawn_sweeper(
            jobs.clone(),
            Duration::from_secs(config.sweep_interval.max(1)),
            shutdown.clone(),
        );
        tracing::info!(workers = config.workers, "Enrichment pipeline started");

        Ok(Pipeline {
            jobs,
            workers,
            sweeper,
        })
    }

    async fn stop(self, shutdown: &CancellationToken) {
        shutdown.cancel();
        self.workers.join().await;
        if let Err(e) = self.sweeper.await {
            tracing::error!(error = %e, "Sweeper task panicked");
        }
    }
}

fn cancel_on_ctrl_c(shutdown: &CancellationToken) {
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, exiting gracefully");
        }
        shutdown.cancel();
    });
}

async fn serve(config: &Config, store: Arc<dyn Store>, listen_addr: &str) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    let pipeline = Pipeline::start(config, store, &shutdown).await?;
    let collector = Arc::new(CollectorService::new(
        pipeline.jobs.clone(),
        config.keyword_filter(),
    ));

    let app = routes::router(AppState {
        jobs: pipeline.jobs.clone(),
        collector,
        shutdown: shutdown.clone(),
    });

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!("Listening on {listen_addr}");
    cancel_on_ctrl_c(&shutdown);
    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { signal.cancelled().await })
        .await?;

    pipeline.stop(&shutdown).await;
    Ok(())
}

async fn collect(config: &Config, store: Arc<dyn Store>, input: Option<PathBuf>) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(&shutdown);
    let pipeline = Pipeline::start(config, store, &shutdown).await?;
    let collector = Arc::new(CollectorService::new(
        pipeline.jobs.clone(),
        config.keyword_filter(),
    ));

    let mut feed: Box<dyn MessageFeed> = match input {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(JsonLinesFeed::new(path.display().to_string(), BufReader::new(file)))
        }
        None => Box::new(JsonLinesFeed::new("stdin", BufReader::new(tokio::io::stdin()))),
    };

    let stats = collectors::runner::run(feed.as_mut(), collector, shutdown.clone()).await?;
    println!("{}", serde_json::to_string(&stats)?);

    // Let the workers finish what was submitted.
    while !shutdown.is_cancelled() && pipeline.jobs.has_pending_work().await? {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = tokio::time::sleep(Duration::from_millis(500)) => {}
        }
    }

    pipeline.stop(&shutdown).await;
    Ok(())
}

async fn create_user(store: Arc<dyn Store>, name: String, cv_path: PathBuf) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&cv_path)
        .await
        .with_context(|| format!("Failed to read {}", cv_path.display()))?;
    let cv: serde_json::Value = serde_json::from_str(&raw).context("CV is not valid JSON")?;

    let token = generate_token();
    let user = store
        .create_user(CreateUser {
            name,
            cv,
            token_hash: hash_token(&token),
        })
        .await?;

    tracing::info!(user_id = %user.id, "User created");
    println!("id:    {}", user.id);
    println!("token: {token}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);

    let store = open_store(&config).await?;

    match config.resolved_command() {
        Command::Serve { listen_addr } => serve(&config, store, &listen_addr).await,
        Command::Collect { input } => collect(&config, store, input).await,
        Command::CreateUser { name, cv } => create_user(store, name, cv).await,
    }
}
