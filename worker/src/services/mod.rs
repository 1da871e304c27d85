//! Service implementations
//!
//! Real implementations of the worker traits and the monitoring service.

pub mod forwarder;
pub mod monitor_store;
pub mod monitoring;
pub mod session_control;

#[cfg(test)]
mod tests;

// Re-export service implementations
pub use forwarder::HttpForwarder;
pub use monitor_store::FileMonitorStore;
pub use monitoring::MonitoringService;
