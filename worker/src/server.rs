//! Worker process runtime
//!
//! Binds the session port, records this process in the session registry,
//! serves the HTTP API and removes the pid file again on shutdown.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;

use coordinator::services::find_available_port;
use coordinator::{Coordinator, CoordinatorConfig, FileSessionRegistry, RealProcessManager, SessionRegistry};
use shared::{env, logging, process_info, process_warn, ProcessId, SessionDescriptor};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::services::{FileMonitorStore, HttpForwarder, MonitoringService};
use crate::state::{AppState, WorkerIdentity};
use crate::web::build_router;

pub struct WorkerServer {
    config: WorkerConfig,
    registry: Arc<FileSessionRegistry>,
}

impl WorkerServer {
    pub fn new(config: WorkerConfig) -> Self {
        let registry = Arc::new(FileSessionRegistry::new(&config.home_dir));
        Self { config, registry }
    }

    /// Serve until SIGTERM or Ctrl+C
    pub async fn run(self) -> WorkerResult<()> {
        let port = match self.config.port {
            Some(port) => port,
            None => find_available_port(env::DEFAULT_BASE_PORT).await?,
        };
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| WorkerError::ServerStartupFailed { port, message: e.to_string() })?;

        // Only a bound worker counts as ready
        let descriptor = self.register(port).await?;
        let state = self.build_state(port).await?;

        logging::log_startup(ProcessId::current(), &format!("worker for session {} on http://{}", descriptor.session_id, addr));
        if self.config.upstream_url.is_none() {
            process_warn!(ProcessId::current(), "No upstream configured; /v1 requests will answer 502");
        }

        let served = axum::serve(listener, build_router(state))
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Err(e) = self.registry.clear_pid(&descriptor).await {
            process_warn!(ProcessId::current(), "Failed to clear pid file: {}", e);
        }
        logging::log_shutdown(ProcessId::current(), "worker stopped");

        served.map_err(WorkerError::from)
    }

    /// Persist the bound port and record this process as the session's worker
    async fn register(&self, port: u16) -> WorkerResult<SessionDescriptor> {
        let mut descriptor = self.registry.get_or_create(&self.config.preference).await?;
        if descriptor.port != Some(port) {
            descriptor.port = Some(port);
            self.registry.persist(&descriptor).await?;
        }
        self.registry.record_pid(&descriptor, std::process::id()).await?;
        process_info!(
            ProcessId::current(),
            "📌 Recorded PID {} for session {}",
            std::process::id(),
            descriptor.session_id
        );
        Ok(descriptor)
    }

    async fn build_state(&self, port: u16) -> WorkerResult<AppState> {
        let store = Arc::new(FileMonitorStore::new(self.config.monitoring_dir()));
        let monitor = Arc::new(MonitoringService::load(store).await);

        let mut coordinator_config = CoordinatorConfig::with_home(&self.config.home_dir);
        coordinator_config.log_level = self.config.log_level.clone();
        let lifecycle = Arc::new(RealProcessManager::new(Arc::clone(&self.registry), &coordinator_config));
        let coordinator = Coordinator::new(Arc::clone(&self.registry), lifecycle, &coordinator_config);

        let forwarder = HttpForwarder::new(self.config.upstream_url.clone())?;

        Ok(AppState::new(
            monitor,
            Arc::new(coordinator),
            Arc::new(forwarder),
            WorkerIdentity::from_config(&self.config, port),
        ))
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logging::log_error(ProcessId::current(), "Ctrl+C handler", &e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                logging::log_error(ProcessId::current(), "SIGTERM handler", &e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => logging::log_shutdown(ProcessId::current(), "Received Ctrl+C signal"),
        _ = terminate => logging::log_shutdown(ProcessId::current(), "Received SIGTERM"),
    }
}
