//! Localhost port allocation
//!
//! Probes a fixed window of ports by binding a throwaway listener. The port is
//! released before returning, so another process can still take it before the
//! worker binds; callers must handle that bind failure themselves.

use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;

use crate::error::{CoordinatorError, CoordinatorResult};
use shared::{process_debug, ProcessId};

/// Number of consecutive ports probed
pub const PORT_SCAN_WINDOW: u16 = 100;

/// Port allocator scanning `[start, start + window - 1]` on 127.0.0.1
///
/// The window is cut short at 65535, which is still probed.
#[derive(Debug, Clone, Copy)]
pub struct PortAllocator {
    window: u16,
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PortAllocator {
    pub fn new() -> Self {
        Self { window: PORT_SCAN_WINDOW }
    }

    /// Configure the scan window (fluent API)
    pub fn with_window(mut self, window: u16) -> Self {
        self.window = window.max(1);
        self
    }

    /// First bindable port at or after `start`
    pub async fn find_available_port(&self, start: u16) -> CoordinatorResult<u16> {
        let end = (u32::from(start) + u32::from(self.window) - 1).min(u32::from(u16::MAX)) as u16;
        for port in start..=end {
            if Self::is_bindable(port).await {
                process_debug!(ProcessId::current(), "🔌 Port {} is available", port);
                return Ok(port);
            }
        }
        Err(CoordinatorError::PortExhausted { start, end })
    }

    async fn is_bindable(port: u16) -> bool {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                drop(listener);
                true
            }
            Err(_) => false,
        }
    }
}

/// Convenience wrapper using the default window
pub async fn find_available_port(start: u16) -> CoordinatorResult<u16> {
    PortAllocator::new().find_available_port(start).await
}
