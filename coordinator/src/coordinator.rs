//! Session coordinator
//!
//! Composes the registry and the process lifecycle into the operations used
//! by the CLI and the worker HTTP API. Holds no state of its own beyond the
//! injected services; the filesystem is the source of truth.

use std::sync::Arc;
use std::time::Duration;

use crate::config::CoordinatorConfig;
use crate::core::lifecycle::SessionState;
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::traits::{ProcessLifecycle, SessionRegistry, StopOutcome};
use shared::{process_debug, process_info, ProcessId, SessionDescriptor, SessionId, SessionSummary};

/// Descriptor plus everything observable about it right now
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub descriptor: SessionDescriptor,
    pub alive: bool,
    pub pid: Option<i32>,
    pub reference_count: u64,
}

impl SessionStatus {
    pub fn state(&self) -> SessionState {
        SessionState::observed(self.alive)
    }

    pub fn to_summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.descriptor.session_id.clone(),
            preference: self.descriptor.preference.clone(),
            provider: self.descriptor.provider.clone(),
            model: self.descriptor.model.clone(),
            port: self.descriptor.port,
            alive: self.alive,
            pid: self.pid,
            reference_count: self.reference_count,
        }
    }
}

/// Result of a start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { session_id: SessionId, port: u16, pid: u32 },
    AlreadyRunning { session_id: SessionId, port: u16 },
}

impl StartOutcome {
    pub fn session_id(&self) -> &SessionId {
        match self {
            StartOutcome::Started { session_id, .. } | StartOutcome::AlreadyRunning { session_id, .. } => session_id,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            StartOutcome::Started { port, .. } | StartOutcome::AlreadyRunning { port, .. } => *port,
        }
    }
}

/// Result of dropping a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub remaining: u64,
    pub stopped: Option<StopOutcome>,
}

/// Main coordinator with dependency injection
pub struct Coordinator<R, P>
where
    R: SessionRegistry,
    P: ProcessLifecycle,
{
    registry: Arc<R>,
    lifecycle: Arc<P>,
    ready_timeout: Duration,
    ready_initial_delay: Duration,
}

impl<R, P> Coordinator<R, P>
where
    R: SessionRegistry,
    P: ProcessLifecycle,
{
    pub fn new(registry: Arc<R>, lifecycle: Arc<P>, config: &CoordinatorConfig) -> Self {
        Self {
            registry,
            lifecycle,
            ready_timeout: config.ready_timeout,
            ready_initial_delay: config.ready_initial_delay,
        }
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    pub fn lifecycle(&self) -> &Arc<P> {
        &self.lifecycle
    }

    /// Descriptor for a preference, without starting anything
    pub async fn resolve(&self, preference: &str) -> CoordinatorResult<SessionDescriptor> {
        self.registry.get_or_create(preference).await
    }

    /// Descriptor for a known session id
    pub async fn find(&self, session_id: &SessionId) -> CoordinatorResult<SessionDescriptor> {
        self.registry
            .find(session_id)
            .await
            .ok_or_else(|| CoordinatorError::SessionNotFound { session_id: session_id.clone() })
    }

    pub async fn status(&self, descriptor: SessionDescriptor) -> SessionStatus {
        let alive = self.registry.is_alive(&descriptor).await;
        let pid = if alive { self.registry.read_pid(&descriptor).await } else { None };
        let reference_count = self.registry.reference_count(&descriptor).await;
        SessionStatus { descriptor, alive, pid, reference_count }
    }

    /// Every session on disk with its liveness
    pub async fn list_sessions(&self) -> Vec<SessionStatus> {
        let mut statuses = Vec::new();
        for descriptor in self.registry.list_all().await {
            statuses.push(self.status(descriptor).await);
        }
        statuses
    }

    /// Start the worker for `preference` unless it is already alive
    pub async fn start_session(&self, preference: &str) -> CoordinatorResult<StartOutcome> {
        let (outcome, _) = self.start_descriptor(preference).await?;
        Ok(outcome)
    }

    /// Idempotent start returning the resulting status
    pub async fn ensure_running(&self, preference: &str) -> CoordinatorResult<SessionStatus> {
        let (_, descriptor) = self.start_descriptor(preference).await?;
        Ok(self.status(descriptor).await)
    }

    pub async fn stop_session(&self, session_id: &SessionId) -> CoordinatorResult<StopOutcome> {
        let descriptor = self.find(session_id).await?;
        self.lifecycle.stop(&descriptor).await
    }

    /// Stop (best-effort) and start again, waiting for readiness
    pub async fn restart_session(&self, session_id: &SessionId) -> CoordinatorResult<StartOutcome> {
        let mut descriptor = self.find(session_id).await?;
        let pid = self.lifecycle.restart(&mut descriptor).await?;
        self.await_ready(&descriptor).await?;
        Ok(StartOutcome::Started {
            session_id: descriptor.session_id,
            port: descriptor.port.unwrap_or_default(),
            pid,
        })
    }

    /// Ensure the session runs and count one more user of it
    pub async fn acquire(&self, preference: &str) -> CoordinatorResult<SessionStatus> {
        let mut status = self.ensure_running(preference).await?;
        status.reference_count = self.registry.increment_reference_count(&status.descriptor).await?;
        Ok(status)
    }

    /// Drop one user; optionally stop the worker once nobody uses it
    pub async fn release(&self, preference: &str, stop_when_idle: bool) -> CoordinatorResult<ReleaseOutcome> {
        let descriptor = self.registry.get_or_create(preference).await?;
        let remaining = self.registry.decrement_reference_count(&descriptor).await?;

        let stopped = if remaining == 0 && stop_when_idle {
            Some(self.lifecycle.stop(&descriptor).await?)
        } else {
            None
        };
        Ok(ReleaseOutcome { remaining, stopped })
    }

    async fn start_descriptor(&self, preference: &str) -> CoordinatorResult<(StartOutcome, SessionDescriptor)> {
        let mut descriptor = self.registry.get_or_create(preference).await?;

        if self.registry.is_alive(&descriptor).await {
            process_debug!(ProcessId::current(), "Session {} already running", descriptor.session_id);
            let outcome = StartOutcome::AlreadyRunning {
                session_id: descriptor.session_id.clone(),
                port: descriptor.port.unwrap_or_default(),
            };
            return Ok((outcome, descriptor));
        }

        let pid = self.lifecycle.start(&mut descriptor).await?;
        self.await_ready(&descriptor).await?;

        process_info!(
            ProcessId::current(),
            "✅ Session {} ready on port {:?}",
            descriptor.session_id,
            descriptor.port
        );
        let outcome = StartOutcome::Started {
            session_id: descriptor.session_id.clone(),
            port: descriptor.port.unwrap_or_default(),
            pid,
        };
        Ok((outcome, descriptor))
    }

    async fn await_ready(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<()> {
        let ready = self
            .lifecycle
            .wait_until_ready(descriptor, self.ready_timeout, self.ready_initial_delay)
            .await;
        if ready {
            Ok(())
        } else {
            Err(CoordinatorError::WorkerNotReady {
                session_id: descriptor.session_id.clone(),
                timeout: self.ready_timeout,
            })
        }
    }
}
