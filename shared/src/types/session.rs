//! Session descriptor types shared by the coordinator and the workers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::SessionId;

pub const DESCRIPTOR_FILE_NAME: &str = "session.json";
pub const PID_FILE_NAME: &str = "worker.pid";
pub const REFERENCE_COUNT_FILE_NAME: &str = "reference-count";
pub const LOG_DIR_NAME: &str = "logs";

/// Provider/model pair parsed out of a preference string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceParts {
    pub provider: Option<String>,
    pub model: Option<String>,
}

/// Files belonging to one session, all derived from the session id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    pub dir: PathBuf,
    pub descriptor_file: PathBuf,
    pub pid_file: PathBuf,
    pub reference_count_file: PathBuf,
    pub log_dir: PathBuf,
}

impl SessionPaths {
    pub fn new(sessions_root: &Path, session_id: &SessionId) -> Self {
        let dir = sessions_root.join(session_id.as_str());
        Self {
            descriptor_file: dir.join(DESCRIPTOR_FILE_NAME),
            pid_file: dir.join(PID_FILE_NAME),
            reference_count_file: dir.join(REFERENCE_COUNT_FILE_NAME),
            log_dir: dir.join(LOG_DIR_NAME),
            dir,
        }
    }
}

/// One worker instance bound to a model preference
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDescriptor {
    pub preference: String,
    pub session_id: SessionId,
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Assigned on first start, then reused for the life of the descriptor file
    pub port: Option<u16>,
    pub created_at: DateTime<Utc>,
    pub paths: SessionPaths,
}

impl SessionDescriptor {
    /// On-disk shape of this descriptor
    pub fn to_persisted(&self) -> PersistedDescriptor {
        PersistedDescriptor {
            preference: self.preference.clone(),
            provider: self.provider.clone(),
            model: self.model.clone(),
            port: self.port,
            session_id: self.session_id.clone(),
            created_at: self.created_at,
        }
    }

    /// Rebuild a descriptor from its persisted form
    pub fn from_persisted(persisted: PersistedDescriptor, sessions_root: &Path) -> Self {
        let paths = SessionPaths::new(sessions_root, &persisted.session_id);
        Self {
            preference: persisted.preference,
            session_id: persisted.session_id,
            provider: persisted.provider,
            model: persisted.model,
            port: persisted.port,
            created_at: persisted.created_at,
            paths,
        }
    }
}

/// Content of `session.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDescriptor {
    pub preference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
}
