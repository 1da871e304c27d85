//! File-backed monitor persistence
//!
//! ```text
//! monitoring/metrics.json                    {sessions: [...], lastUpdated}
//! monitoring/logs/requests-YYYY-MM-DD.jsonl  one RequestLog per line
//! ```
//!
//! Log files are keyed by the calendar date of each entry's timestamp, so a
//! batch straddling midnight lands in two files.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::WorkerResult;
use crate::traits::MonitorStore;
use shared::{process_debug, process_warn, MetricsFile, ProcessId, RequestLog, SessionMetrics, SharedError};

pub const METRICS_FILE_NAME: &str = "metrics.json";
pub const LOGS_DIR_NAME: &str = "logs";

/// Monitor store rooted at `<home>/monitoring`
#[derive(Debug, Clone)]
pub struct FileMonitorStore {
    metrics_file: PathBuf,
    logs_dir: PathBuf,
}

impl FileMonitorStore {
    pub fn new(monitoring_dir: impl AsRef<Path>) -> Self {
        let dir = monitoring_dir.as_ref();
        Self {
            metrics_file: dir.join(METRICS_FILE_NAME),
            logs_dir: dir.join(LOGS_DIR_NAME),
        }
    }

    pub fn metrics_file(&self) -> &Path {
        &self.metrics_file
    }

    /// Per-day log file for `date` (`YYYY-MM-DD`)
    pub fn log_file_for(&self, date: &str) -> PathBuf {
        self.logs_dir.join(format!("requests-{date}.jsonl"))
    }
}

#[async_trait]
impl MonitorStore for FileMonitorStore {
    async fn load_metrics(&self) -> WorkerResult<Vec<SessionMetrics>> {
        let content = match fs::read_to_string(&self.metrics_file).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<MetricsFile>(&content) {
            Ok(file) => Ok(file.sessions),
            Err(e) => {
                let corrupt = SharedError::CorruptMetrics {
                    path: self.metrics_file.clone(),
                    message: e.to_string(),
                };
                process_warn!(ProcessId::current(), "⚠️ {}; starting with empty metrics", corrupt);
                Ok(Vec::new())
            }
        }
    }

    async fn save_metrics(&self, metrics: &[SessionMetrics]) -> WorkerResult<()> {
        if let Some(parent) = self.metrics_file.parent() {
            fs::create_dir_all(parent).await?;
        }
        let file = MetricsFile {
            sessions: metrics.to_vec(),
            last_updated: Utc::now(),
        };
        // Readers only ever see a complete file
        let staging = self.metrics_file.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_string_pretty(&file)?).await?;
        fs::rename(&staging, &self.metrics_file).await?;
        Ok(())
    }

    async fn append_logs(&self, logs: &[RequestLog]) -> WorkerResult<()> {
        if logs.is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.logs_dir).await?;

        let mut by_day: BTreeMap<String, String> = BTreeMap::new();
        for log in logs {
            let line = serde_json::to_string(log)?;
            let buffer = by_day.entry(log.timestamp.format("%Y-%m-%d").to_string()).or_default();
            buffer.push_str(&line);
            buffer.push('\n');
        }

        for (date, lines) in by_day {
            let path = self.log_file_for(&date);
            let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
            file.write_all(lines.as_bytes()).await?;
            file.flush().await?;
            process_debug!(ProcessId::current(), "📝 Appended to {}", path.display());
        }
        Ok(())
    }
}
