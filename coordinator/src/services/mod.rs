//! Service implementations
//!
//! Real implementations of the coordinator traits plus the OS-level helpers
//! they are built on. These are the pieces that touch the filesystem, the
//! network stack and other processes.

pub mod port_allocator;
pub mod process_manager;
pub mod session_registry;
pub mod signals;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use port_allocator::{find_available_port, PortAllocator};
pub use process_manager::RealProcessManager;
pub use session_registry::FileSessionRegistry;
