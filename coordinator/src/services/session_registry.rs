//! Filesystem-backed session registry
//!
//! Layout under the home directory:
//!
//! ```text
//! sessions/<session-id>/session.json
//! sessions/<session-id>/worker.pid
//! sessions/<session-id>/reference-count
//! ```
//!
//! The tree is the only coordination medium between processes. Nothing here
//! is atomic across processes: readers treat unparsable files as absent and
//! concurrent reference-count updates may be lost.

use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::core::identity::{derive_session_id, parse_preference};
use crate::error::{CoordinatorError, CoordinatorResult};
use crate::services::signals;
use crate::traits::SessionRegistry;
use shared::{
    env, process_debug, process_warn, PersistedDescriptor, ProcessId, SessionDescriptor, SessionId,
    SessionPaths, SharedError,
};

/// Session registry stored under `<home>/sessions`
#[derive(Debug, Clone)]
pub struct FileSessionRegistry {
    sessions_root: PathBuf,
    /// Port reported for a descriptor whose file exists but does not parse
    fallback_port: u16,
}

impl FileSessionRegistry {
    pub fn new(home_dir: impl AsRef<Path>) -> Self {
        Self {
            sessions_root: home_dir.as_ref().join(env::SESSIONS_DIR),
            fallback_port: env::DEFAULT_BASE_PORT,
        }
    }

    /// Configure the fallback port (fluent API)
    pub fn with_fallback_port(mut self, port: u16) -> Self {
        self.fallback_port = port;
        self
    }

    pub fn sessions_root(&self) -> &Path {
        &self.sessions_root
    }

    async fn read_descriptor(path: &Path) -> Result<Option<PersistedDescriptor>, SharedError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SharedError::CorruptDescriptor {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        serde_json::from_str(&content).map(Some).map_err(|e| SharedError::CorruptDescriptor {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    async fn load(&self, session_id: &SessionId) -> Option<SessionDescriptor> {
        let paths = SessionPaths::new(&self.sessions_root, session_id);
        match Self::read_descriptor(&paths.descriptor_file).await {
            Ok(Some(persisted)) => Some(SessionDescriptor::from_persisted(persisted, &self.sessions_root)),
            Ok(None) => None,
            Err(e) => {
                process_debug!(ProcessId::current(), "Skipping session {}: {}", session_id, e);
                None
            }
        }
    }

    async fn read_count(path: &Path) -> u64 {
        match fs::read_to_string(path).await {
            Ok(content) => content.trim().parse().unwrap_or(0),
            Err(_) => 0,
        }
    }

    async fn write_count(path: &Path, count: u64) -> CoordinatorResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, count.to_string()).await?;
        Ok(())
    }

    async fn remove_if_exists(path: &Path) -> CoordinatorResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Self-healing cleanup of a pid file that no longer points at a live worker
    async fn discard_stale_pid(&self, descriptor: &SessionDescriptor) {
        let stale = CoordinatorError::StalePidFile { path: descriptor.paths.pid_file.clone() };
        process_debug!(ProcessId::current(), "🧹 {}", stale);
        if let Err(e) = Self::remove_if_exists(&descriptor.paths.pid_file).await {
            process_warn!(ProcessId::current(), "Failed to remove stale pid file for {}: {}", descriptor.session_id, e);
        }
    }
}

#[async_trait]
impl SessionRegistry for FileSessionRegistry {
    async fn get_or_create(&self, preference: &str) -> CoordinatorResult<SessionDescriptor> {
        let session_id = derive_session_id(preference);
        let parts = parse_preference(preference);
        let paths = SessionPaths::new(&self.sessions_root, &session_id);
        fs::create_dir_all(&paths.dir).await?;

        let mut descriptor = SessionDescriptor {
            preference: preference.to_string(),
            session_id,
            provider: parts.provider,
            model: parts.model,
            port: None,
            created_at: Utc::now(),
            paths,
        };

        match Self::read_descriptor(&descriptor.paths.descriptor_file).await {
            Ok(Some(persisted)) => {
                descriptor.port = persisted.port;
                descriptor.created_at = persisted.created_at;
            }
            Ok(None) => {}
            Err(e) => {
                process_warn!(
                    ProcessId::current(),
                    "⚠️ {}; using fallback port {}",
                    e,
                    self.fallback_port
                );
                descriptor.port = Some(self.fallback_port);
            }
        }

        Ok(descriptor)
    }

    async fn find(&self, session_id: &SessionId) -> Option<SessionDescriptor> {
        self.load(session_id).await
    }

    async fn persist(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<()> {
        fs::create_dir_all(&descriptor.paths.dir).await?;
        let content = serde_json::to_string_pretty(&descriptor.to_persisted())?;
        fs::write(&descriptor.paths.descriptor_file, content).await?;
        process_debug!(
            ProcessId::current(),
            "💾 Persisted session {} (port {:?})",
            descriptor.session_id,
            descriptor.port
        );
        Ok(())
    }

    async fn is_alive(&self, descriptor: &SessionDescriptor) -> bool {
        let Ok(raw) = fs::read_to_string(&descriptor.paths.pid_file).await else {
            return false;
        };

        let Ok(pid) = raw.trim().parse::<i32>() else {
            self.discard_stale_pid(descriptor).await;
            return false;
        };

        match signals::process_exists(pid) {
            Ok(true) => true,
            Ok(false) => {
                self.discard_stale_pid(descriptor).await;
                false
            }
            Err(e) => {
                process_warn!(ProcessId::current(), "Liveness probe for pid {} failed: {}", pid, e);
                false
            }
        }
    }

    async fn read_pid(&self, descriptor: &SessionDescriptor) -> Option<i32> {
        let raw = fs::read_to_string(&descriptor.paths.pid_file).await.ok()?;
        raw.trim().parse().ok()
    }

    async fn list_all(&self) -> Vec<SessionDescriptor> {
        let mut entries = match fs::read_dir(&self.sessions_root).await {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut descriptors = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(SessionId::from) else {
                continue;
            };
            if let Some(descriptor) = self.load(&name).await {
                descriptors.push(descriptor);
            }
        }

        descriptors.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        descriptors
    }

    async fn list_active(&self) -> Vec<SessionDescriptor> {
        let mut active = Vec::new();
        for descriptor in self.list_all().await {
            if self.is_alive(&descriptor).await {
                active.push(descriptor);
            }
        }
        active
    }

    async fn record_pid(&self, descriptor: &SessionDescriptor, pid: u32) -> CoordinatorResult<()> {
        fs::create_dir_all(&descriptor.paths.dir).await?;
        fs::write(&descriptor.paths.pid_file, pid.to_string()).await?;
        Ok(())
    }

    async fn clear_pid(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<()> {
        Self::remove_if_exists(&descriptor.paths.pid_file).await
    }

    async fn reference_count(&self, descriptor: &SessionDescriptor) -> u64 {
        Self::read_count(&descriptor.paths.reference_count_file).await
    }

    async fn increment_reference_count(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<u64> {
        let path = &descriptor.paths.reference_count_file;
        let count = Self::read_count(path).await + 1;
        Self::write_count(path, count).await?;
        Ok(count)
    }

    async fn decrement_reference_count(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<u64> {
        let path = &descriptor.paths.reference_count_file;
        let count = Self::read_count(path).await.saturating_sub(1);
        Self::write_count(path, count).await?;
        Ok(count)
    }

    async fn clear_reference_count(&self, descriptor: &SessionDescriptor) -> CoordinatorResult<()> {
        Self::remove_if_exists(&descriptor.paths.reference_count_file).await
    }
}
