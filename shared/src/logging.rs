//! Tracing setup and process-aware log macros
//!
//! Every event carries a `process` field (`coordinator` or `worker_<id>`), so
//! interleaved output from several workers stays attributable.

use chrono::Utc;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

use crate::errors::{SharedError, SharedResult};
use crate::types::ProcessId;

/// File name prefix of the worker's daily-rolling log
pub const WORKER_LOG_FILE: &str = "worker.log";

/// Per-process filter directives at the given base level
fn level_filter(process_id: &ProcessId, base_level: &str) -> String {
    match process_id {
        ProcessId::Coordinator => {
            format!("coordinator={base_level},shared={base_level}")
        }
        ProcessId::Worker(_) => {
            format!(
                "worker={base_level},coordinator={base_level},shared={base_level},tower_http=warn,axum={base_level}"
            )
        }
    }
}

/// `RUST_LOG` when set, otherwise the per-process directives at `log_level`
fn build_filter(log_level: Option<&str>) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(level_filter(ProcessId::current(), log_level.unwrap_or("info")))
    })
}

/// Stderr-only tracing, used by the coordinator CLI
pub fn init_tracing_with_level(log_level: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Worker tracing: stderr plus a daily-rolling file in `log_dir`
///
/// Hold the returned guard for the life of the process; dropping it stops the
/// background file writer.
pub fn init_worker_tracing(log_dir: &Path, log_level: Option<&str>) -> SharedResult<WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*};

    std::fs::create_dir_all(log_dir).map_err(|e| SharedError::LoggingError {
        message: format!("cannot create {}: {e}", log_dir.display()),
    })?;

    let (file_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(log_dir, WORKER_LOG_FILE));

    tracing_subscriber::registry()
        .with(build_filter(log_level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .with(fmt::layer().with_ansi(false).with_target(true).with_writer(file_writer))
        .try_init()
        .map_err(|e| SharedError::LoggingError { message: e.to_string() })?;

    Ok(guard)
}

/// Wall-clock `HH:MM:SS.mmm` attached to every process-aware event
pub fn format_timestamp() -> String {
    Utc::now().format("%H:%M:%S%.3f").to_string()
}

/// Emit a tracing event at `$level` stamped with the process and time
#[doc(hidden)]
#[macro_export]
macro_rules! process_event {
    ($level:ident, $process_id:expr, $($arg:tt)*) => {
        tracing::$level!(
            process = %$process_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        )
    };
}

#[macro_export]
macro_rules! process_info {
    ($process_id:expr, $($arg:tt)*) => { $crate::process_event!(info, $process_id, $($arg)*) };
}

#[macro_export]
macro_rules! process_warn {
    ($process_id:expr, $($arg:tt)*) => { $crate::process_event!(warn, $process_id, $($arg)*) };
}

#[macro_export]
macro_rules! process_error {
    ($process_id:expr, $($arg:tt)*) => { $crate::process_event!(error, $process_id, $($arg)*) };
}

#[macro_export]
macro_rules! process_debug {
    ($process_id:expr, $($arg:tt)*) => { $crate::process_event!(debug, $process_id, $($arg)*) };
}

pub fn log_startup(process_id: &ProcessId, details: &str) {
    crate::process_event!(info, process_id, "🚀 Starting {}", details);
}

pub fn log_shutdown(process_id: &ProcessId, reason: &str) {
    crate::process_event!(info, process_id, "🛑 Shutting down: {}", reason);
}

/// Logs "<context> failed" with the error as a structured field
pub fn log_error(process_id: &ProcessId, context: &str, error: &dyn std::fmt::Display) {
    crate::process_event!(error, process_id, error = %error, "❌ {} failed: {}", context, error);
}

pub fn log_success(process_id: &ProcessId, message: &str) {
    crate::process_event!(info, process_id, "✅ {}", message);
}
