//! Shared error types for the session router

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Corrupt session descriptor at {path}: {message}")]
    CorruptDescriptor { path: PathBuf, message: String },

    #[error("Corrupt metrics file at {path}: {message}")]
    CorruptMetrics { path: PathBuf, message: String },

    #[error("Logging setup failed: {message}")]
    LoggingError { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
