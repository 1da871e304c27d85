//! Request handlers grouped by surface

pub mod health;
pub mod monitoring;
pub mod proxy;
pub mod sessions;
pub mod stream;
