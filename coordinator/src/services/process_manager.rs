//! Real process management service implementation
//!
//! Spawns detached worker processes, polls them for readiness through the
//! registry's liveness check, and stops them with SIGTERM → SIGKILL
//! escalation. Workers record their own pid file once their port is bound.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::config::CoordinatorConfig;
use crate::core::lifecycle::{LifecycleEvent, SessionState};
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::services::port_allocator::PortAllocator;
use crate::services::signals::{self, StopSignal};
use crate::traits::{ProcessLifecycle, SessionRegistry, StopOutcome};
use shared::{env, process_debug, process_info, process_warn, ProcessId, SessionDescriptor, SessionId};

/// Interval between liveness polls while waiting for readiness
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Pause after the worker first looks alive, letting it finish booting
pub const READY_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Time a worker gets to exit after SIGTERM before SIGKILL
pub const STOP_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Real process manager implementation
pub struct RealProcessManager<R: SessionRegistry> {
    registry: Arc<R>,

    allocator: PortAllocator,

    /// Executable started for each session
    worker_program: PathBuf,

    /// Extra arguments passed before any environment is applied
    worker_args: Vec<String>,

    /// Home directory handed to workers
    home_dir: PathBuf,

    /// First port probed for sessions without one
    base_port: u16,

    /// Log level to pass to spawned workers
    log_level: String,

    settle_delay: Duration,
    stop_grace: Duration,

    /// Last known lifecycle state of sessions handled by this process
    states: Mutex<HashMap<SessionId, SessionState>>,
}

impl<R: SessionRegistry> RealProcessManager<R> {
    /// Create a process manager from coordinator configuration
    pub fn new(registry: Arc<R>, config: &CoordinatorConfig) -> Self {
        Self {
            registry,
            allocator: PortAllocator::new(),
            worker_program: config.worker_program.clone(),
            worker_args: Vec::new(),
            home_dir: config.home_dir.clone(),
            base_port: config.base_port,
            log_level: config.log_level.clone(),
            settle_delay: READY_SETTLE_DELAY,
            stop_grace: STOP_GRACE_PERIOD,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Configure the worker command (fluent API)
    pub fn with_worker_command(mut self, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        self.worker_program = program.into();
        self.worker_args = args;
        self
    }

    /// Configure the readiness settle delay (fluent API)
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Configure the SIGTERM grace window (fluent API)
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Last lifecycle state this process observed for `session_id`
    pub async fn state(&self, session_id: &SessionId) -> SessionState {
        let states = self.states.lock().await;
        states.get(session_id).copied().unwrap_or(SessionState::NotRunning)
    }

    async fn apply(&self, session_id: &SessionId, event: LifecycleEvent) {
        let mut states = self.states.lock().await;
        let current = states.get(session_id).copied().unwrap_or(SessionState::NotRunning);
        match current.transition(event) {
            Some(next) => {
                process_debug!(ProcessId::current(), "Session {}: {} -> {}", session_id, current, next);
                states.insert(session_id.clone(), next);
            }
            None => {
                process_debug!(ProcessId::current(), "Session {}: ignoring {:?} while {}", session_id, event, current);
            }
        }
    }

    fn build_command(&self, descriptor: &SessionDescriptor, port: u16) -> Command {
        let mut cmd = Command::new(&self.worker_program);
        cmd.args(&self.worker_args)
            .env(env::PREFERENCE, &descriptor.preference)
            .env(env::PORT, port.to_string())
            .env(env::SESSION_ID, descriptor.session_id.as_str())
            .env(env::HOME, &self.home_dir)
            .env(env::LOG_LEVEL, &self.log_level);

        if let Some(provider) = &descriptor.provider {
            cmd.env(env::PROVIDER, provider);
        }
        if let Some(model) = &descriptor.model {
            cmd.env(env::MODEL, model);
        }

        // Detached: no inherited stdio, own process group so the caller's
        // terminal signals do not reach the worker
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }

    async fn spawn_worker(&self, descriptor: &mut SessionDescriptor) -> CoordinatorResult<u32> {
        let port = match descriptor.port {
            Some(port) => port,
            None => {
                let port = self.allocator.find_available_port(self.base_port).await?;
                descriptor.port = Some(port);
                port
            }
        };
        self.registry.persist(descriptor).await?;

        let mut child = self
            .build_command(descriptor, port)
            .spawn()
            .map_err(|e| CoordinatorError::SpawnFailed {
                session_id: descriptor.session_id.clone(),
                message: format!("{}: {e}", self.worker_program.display()),
            })?;

        let pid = child.id().unwrap_or(0);
        // Reap the worker when it exits so it never lingers as a zombie
        tokio::spawn(async move {
            let _ = child.wait().await;
        });

        process_info!(
            ProcessId::current(),
            "🚀 Spawned worker for session {} (PID: {}) on port {}",
            descriptor.session_id,
            pid,
            port
        );
        Ok(pid)
    }

    async fn escalate(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<StopOutcome> {
        let Some(pid) = self.registry.read_pid(descriptor).await else {
            return Ok(StopOutcome::AlreadyStopped);
        };

        match signals::send_signal(pid, StopSignal::Terminate) {
            Ok(()) => {
                process_debug!(ProcessId::current(), "📤 Sent SIGTERM to {}", pid);
            }
            Err(CoordinatorError::ProcessAbsent { .. }) => return Ok(StopOutcome::AlreadyStopped),
            Err(e) => return Err(e),
        }

        sleep(self.stop_grace).await;

        if !signals::process_exists(pid)? {
            return Ok(StopOutcome::Terminated);
        }

        process_warn!(ProcessId::current(), "🔨 Worker {} ignored SIGTERM, sending SIGKILL", pid);
        match signals::send_signal(pid, StopSignal::Kill) {
            Ok(()) => Ok(StopOutcome::Killed),
            Err(CoordinatorError::ProcessAbsent { .. }) => Ok(StopOutcome::Terminated),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<R: SessionRegistry + 'static> ProcessLifecycle for RealProcessManager<R> {
    async fn start(&self, descriptor: &mut SessionDescriptor) -> CoordinatorResult<u32> {
        self.apply(&descriptor.session_id, LifecycleEvent::SpawnRequested).await;
        match self.spawn_worker(descriptor).await {
            Ok(pid) => Ok(pid),
            Err(e) => {
                self.apply(&descriptor.session_id, LifecycleEvent::ReadyTimedOut).await;
                Err(e)
            }
        }
    }

    async fn wait_until_ready(&self, descriptor: &SessionDescriptor, timeout: Duration, initial_delay: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        sleep(initial_delay.min(timeout)).await;

        loop {
            if self.registry.is_alive(descriptor).await {
                sleep(self.settle_delay).await;
                self.apply(&descriptor.session_id, LifecycleEvent::BecameReady).await;
                return true;
            }
            if Instant::now() >= deadline {
                process_warn!(
                    ProcessId::current(),
                    "⏰ Session {} not ready after {:?}",
                    descriptor.session_id,
                    timeout
                );
                self.apply(&descriptor.session_id, LifecycleEvent::ReadyTimedOut).await;
                return false;
            }
            sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn stop(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<StopOutcome> {
        self.apply(&descriptor.session_id, LifecycleEvent::StopRequested).await;

        let outcome = self.escalate(descriptor).await;

        // Cleanup runs whatever the signalling result was
        if let Err(e) = self.registry.clear_pid(descriptor).await {
            process_warn!(ProcessId::current(), "Failed to clear pid file for {}: {}", descriptor.session_id, e);
        }
        if let Err(e) = self.registry.clear_reference_count(descriptor).await {
            process_warn!(
                ProcessId::current(),
                "Failed to clear reference count for {}: {}",
                descriptor.session_id,
                e
            );
        }
        self.apply(&descriptor.session_id, LifecycleEvent::Exited).await;

        if let Ok(outcome) = &outcome {
            process_info!(ProcessId::current(), "🛑 Session {}: {}", descriptor.session_id, outcome.message());
        }
        outcome
    }

    async fn restart(&self, descriptor: &mut SessionDescriptor) -> CoordinatorResult<u32> {
        if let Err(e) = self.stop(descriptor).await {
            process_warn!(ProcessId::current(), "Stop before restart of {} failed: {}", descriptor.session_id, e);
        }
        self.start(descriptor).await
    }
}
