//! Environment variables understood by the coordinator and spawned workers

/// Root directory for sessions and monitoring data
pub const HOME: &str = "MODEL_ROUTER_HOME";
/// Model preference the worker is bound to
pub const PREFERENCE: &str = "MODEL_ROUTER_PREFERENCE";
/// Pre-assigned worker port
pub const PORT: &str = "MODEL_ROUTER_PORT";
/// Session id computed by the coordinator
pub const SESSION_ID: &str = "MODEL_ROUTER_SESSION_ID";
/// Provider override parsed from the preference
pub const PROVIDER: &str = "MODEL_ROUTER_PROVIDER";
/// Model override parsed from the preference
pub const MODEL: &str = "MODEL_ROUTER_MODEL";
/// First port probed when a session has none yet
pub const BASE_PORT: &str = "MODEL_ROUTER_BASE_PORT";
/// Path of the worker executable
pub const WORKER_BIN: &str = "MODEL_ROUTER_WORKER_BIN";
/// Upstream base URL requests are forwarded to
pub const UPSTREAM_URL: &str = "MODEL_ROUTER_UPSTREAM_URL";
/// Log level for both processes
pub const LOG_LEVEL: &str = "MODEL_ROUTER_LOG";

/// Directory name under the home dir holding one subdirectory per session
pub const SESSIONS_DIR: &str = "sessions";
/// Directory name under the home dir holding monitoring data
pub const MONITORING_DIR: &str = "monitoring";
/// Port probed first when nothing else is configured
pub const DEFAULT_BASE_PORT: u16 = 3456;
