//! Core business logic modules
//!
//! Pure aggregation logic with no I/O or locking.

pub mod metrics;

pub use metrics::fold_completed;
