//! Main entry point for the coordinator binary
//!
//! Wires the filesystem registry and the real process manager into a
//! `Coordinator` and exposes its operations as subcommands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use coordinator::{
    derive_session_id, Coordinator, CoordinatorConfig, CoordinatorResult, FileSessionRegistry, RealProcessManager,
    SessionRegistry, SessionStatus, StartOutcome,
};
use shared::{env, logging, process_debug, ProcessId, SessionId};

type RealCoordinator = Coordinator<FileSessionRegistry, RealProcessManager<FileSessionRegistry>>;

/// Coordinator for per-preference model router workers
#[derive(Parser)]
#[command(name = "coordinator")]
#[command(about = "Starts, stops and tracks model router worker sessions")]
pub struct Args {
    /// State directory (defaults to ~/.model-router)
    #[arg(long, env = env::HOME, global = true)]
    pub home: Option<PathBuf>,

    /// First port probed for new sessions
    #[arg(long, env = env::BASE_PORT, global = true)]
    pub base_port: Option<u16>,

    /// Worker executable to spawn
    #[arg(long, env = env::WORKER_BIN, global = true)]
    pub worker_bin: Option<PathBuf>,

    /// Seconds to wait for a worker to become ready
    #[arg(long, global = true)]
    pub ready_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = env::LOG_LEVEL, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the worker for a preference unless it is already running
    Start { preference: String },

    /// Stop a session by id or preference
    Stop { session: String },

    /// Stop then start a session by id or preference
    Restart { session: String },

    /// Show one session
    Status { preference: String },

    /// Show every known session
    List {
        /// Only sessions whose worker is alive
        #[arg(long)]
        active: bool,
    },

    /// Ensure a session runs and take a reference on it
    Acquire { preference: String },

    /// Drop a reference on a session
    Release {
        preference: String,

        /// Stop the worker once no references remain
        #[arg(long)]
        stop_when_idle: bool,
    },
}

impl Args {
    fn into_config(self) -> CoordinatorResult<(CoordinatorConfig, Command)> {
        let mut config = CoordinatorConfig::from_env()?;
        if let Some(home) = self.home {
            config.home_dir = home;
        }
        if let Some(port) = self.base_port {
            config.base_port = port;
        }
        if let Some(program) = self.worker_bin {
            config.worker_program = program;
        }
        if let Some(secs) = self.ready_timeout {
            config.ready_timeout = Duration::from_secs(secs);
        }
        config.log_level = self.log_level;
        Ok((config, self.command))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    ProcessId::init_coordinator();
    logging::init_tracing_with_level(Some(&args.log_level));

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::log_error(ProcessId::current(), "Command", &e);
            eprintln!("error: {e}");
            eprintln!("hint: {}", e.remediation());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> CoordinatorResult<()> {
    let (config, command) = args.into_config()?;
    process_debug!(ProcessId::current(), "Using home directory {}", config.home_dir.display());

    let registry = Arc::new(FileSessionRegistry::new(&config.home_dir).with_fallback_port(config.base_port));
    let lifecycle = Arc::new(RealProcessManager::new(Arc::clone(&registry), &config));
    let coordinator = Coordinator::new(registry, lifecycle, &config);

    match command {
        Command::Start { preference } => {
            let outcome = coordinator.start_session(&preference).await?;
            print_start(&outcome);
        }
        Command::Stop { session } => {
            let session_id = lookup(&coordinator, &session).await;
            let outcome = coordinator.stop_session(&session_id).await?;
            println!("{session_id}: {}", outcome.message());
        }
        Command::Restart { session } => {
            let session_id = lookup(&coordinator, &session).await;
            let outcome = coordinator.restart_session(&session_id).await?;
            print_start(&outcome);
        }
        Command::Status { preference } => {
            let descriptor = coordinator.resolve(&preference).await?;
            let status = coordinator.status(descriptor).await;
            print_status(&status);
        }
        Command::List { active } => {
            let sessions = coordinator.list_sessions().await;
            let shown: Vec<_> = sessions.iter().filter(|s| !active || s.alive).collect();
            if shown.is_empty() {
                println!("No sessions");
            }
            for status in shown {
                print_status(status);
            }
        }
        Command::Acquire { preference } => {
            let status = coordinator.acquire(&preference).await?;
            print_status(&status);
        }
        Command::Release { preference, stop_when_idle } => {
            let outcome = coordinator.release(&preference, stop_when_idle).await?;
            match outcome.stopped {
                Some(stopped) => println!("references: {} ({})", outcome.remaining, stopped.message()),
                None => println!("references: {}", outcome.remaining),
            }
        }
    }

    Ok(())
}

/// Accept either a session id already on disk or a preference
async fn lookup(coordinator: &RealCoordinator, target: &str) -> SessionId {
    let as_id = SessionId::new(target.trim());
    if coordinator.registry().find(&as_id).await.is_some() {
        as_id
    } else {
        derive_session_id(target)
    }
}

fn print_start(outcome: &StartOutcome) {
    match outcome {
        StartOutcome::Started { session_id, port, pid } => {
            println!("✅ {session_id} started on port {port} (PID: {pid})");
        }
        StartOutcome::AlreadyRunning { session_id, port } => {
            println!("{session_id} already running on port {port}");
        }
    }
}

fn print_status(status: &SessionStatus) {
    let descriptor = &status.descriptor;
    let port = descriptor.port.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
    let pid = status.pid.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
    println!(
        "{:<10} {:<12} port={:<6} pid={:<8} refs={:<3} {}",
        descriptor.session_id,
        status.state(),
        port,
        pid,
        status.reference_count,
        descriptor.preference
    );
}
