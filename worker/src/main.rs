//! Worker process entry point
//!
//! Normally spawned by the coordinator with its settings in `MODEL_ROUTER_*`
//! variables; every setting can also be passed as a flag.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use coordinator::config::default_home_dir;
use shared::{env, logging, process_info, ProcessId};
use worker::{WorkerConfig, WorkerError, WorkerResult, WorkerServer};

/// Model router worker serving one session
#[derive(Parser, Debug)]
#[command(name = "worker")]
#[command(about = "Worker process serving one model router session")]
struct Args {
    /// Model preference, e.g. "openrouter,gpt-4" or "anthropic/claude"
    #[arg(long, env = env::PREFERENCE, default_value = "")]
    preference: String,

    /// Port to bind; probed from the base port when absent
    #[arg(long, env = env::PORT)]
    port: Option<u16>,

    /// State directory (defaults to ~/.model-router)
    #[arg(long, env = env::HOME)]
    home: Option<PathBuf>,

    /// Base URL requests under /v1 are forwarded to
    #[arg(long, env = env::UPSTREAM_URL)]
    upstream_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = env::LOG_LEVEL, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> WorkerResult<WorkerConfig> {
        let home = match self.home {
            Some(home) => home,
            None => default_home_dir()?,
        };
        let mut config = WorkerConfig::new(home, self.preference)
            .with_env_overrides()
            .with_port(self.port)
            .with_upstream(self.upstream_url);
        config.log_level = self.log_level;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize process ID singleton for this worker
    ProcessId::init_worker(config.session_id.clone());

    // Guard keeps the background log writer alive
    let _log_guard = match logging::init_worker_tracing(&config.session_paths().log_dir, Some(&config.log_level)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            logging::init_tracing_with_level(Some(&config.log_level));
            logging::log_error(ProcessId::current(), "File logging setup", &e);
            None
        }
    };

    process_info!(
        ProcessId::current(),
        "🚀 Worker for preference {:?} (provider: {:?}, model: {:?})",
        config.preference,
        config.provider,
        config.model
    );

    match WorkerServer::new(config).run().await {
        Ok(()) => {
            logging::log_success(ProcessId::current(), "Worker stopped gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            logging::log_error(ProcessId::current(), "Worker", &e);
            if let WorkerError::Coordinator(inner) = &e {
                eprintln!("hint: {}", inner.remediation());
            }
            ExitCode::FAILURE
        }
    }
}
