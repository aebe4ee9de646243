use std::path::PathBuf;

use clap::Parser;

use crate::collectors::KeywordFilter;
use crate::llm::openai::DEFAULT_BASE_URL;

/// `--database-url` value that selects the in-process store.
pub const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Parser, Debug, Clone)]
#[command(name = "jobfeed", about = "Job posting intake and enrichment service")]
pub struct Config {
    /// Database connection URL, or `memory://` for the in-process store
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Run database migrations on startup
    #[arg(long, env = "RUN_MIGRATIONS", default_value = "true")]
    pub run_migrations: bool,

    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    pub openai_api_key: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    /// Model used for structured extraction
    #[arg(long, env = "EXTRACT_MODEL", default_value = "gpt-5-nano")]
    pub extract_model: String,

    /// Model used for offer generation
    #[arg(long, env = "OFFER_MODEL", default_value = "gpt-5.2")]
    pub offer_model: String,

    /// Number of enrichment workers
    #[arg(long, env = "WORKERS", default_value = "4")]
    pub workers: usize,

    #[arg(long, env = "QUEUE_CAPACITY", default_value = "256")]
    pub queue_capacity: usize,

    /// Seconds between re-enqueue sweeps of `raw` jobs
    #[arg(long, env = "SWEEP_INTERVAL", default_value = "60")]
    pub sweep_interval: u64,

    /// Minimum message length in characters
    #[arg(long, env = "FILTER_MIN_LENGTH", default_value = "100")]
    pub min_length: usize,

    /// Drop messages that match no whitelist term
    #[arg(long, env = "FILTER_STRICT_WHITELIST", default_value = "false")]
    pub strict_whitelist: bool,

    /// Extra blacklist terms, comma separated
    #[arg(long, env = "FILTER_EXTRA_BLACKLIST", value_delimiter = ',')]
    pub extra_blacklist: Vec<String>,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP API and worker pool (default when no subcommand given)
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
        listen_addr: String,
    },
    /// Read messages as JSON lines and ingest them
    Collect {
        /// Input file; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Register a user profile and print its API token
    CreateUser {
        #[arg(long)]
        name: String,

        /// Path to the CV as a JSON document
        #[arg(long)]
        cv: PathBuf,
    },
}

impl Config {
    /// Resolve the command, defaulting to Serve if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            listen_addr: std::env::var("LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        })
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }

    pub fn keyword_filter(&self) -> KeywordFilter {
        KeywordFilter::new()
            .with_min_length(self.min_length)
            .with_strict_whitelist(self.strict_whitelist)
            .with_extra_blacklist(&self.extra_blacklist)
    }
}
