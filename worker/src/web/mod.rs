//! HTTP layer: router and handlers

pub mod handlers;
pub mod router;

pub use router::build_router;
