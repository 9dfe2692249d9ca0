//! Centralized error handling for Job Finder
//!
//! This module provides the error taxonomy shared by every layer of the
//! application. Each layer has its own error type, and all of them convert
//! into [`AppError`] so the binary can report a single error chain.
//!
//! # Error Categories
//!
//! - **Configuration Errors**: missing, malformed or invalid config files (fatal)
//! - **Source Errors**: network, timeout and decode failures talking to a
//!   company's careers API (non-fatal, isolated per company)
//! - **Storage Errors**: SQLite operations and migrations (fatal for a run)
//! - **Notify Errors**: webhook delivery failures (non-fatal)
//!
//! # Usage
//!
//! ```rust
//! use job_finder::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     // Function can return any error type that converts to AppError
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for configuration Results
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience type alias for storage Results
pub type StorageResult<T> = Result<T, StorageError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;
