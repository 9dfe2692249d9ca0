//! Error type definitions for Job Finder
//!
//! This module defines all error types used throughout the application.
//! Fatal and non-fatal failures are kept as separate types so the
//! orchestrator can decide which ones abort a run.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Company;

/// Top-level application error type
///
/// Only fatal conditions end up here: a run or startup that returns an
/// `AppError` is aborted. Per-company fetch failures and webhook failures
/// are collected into the run report instead.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Notification errors surfaced directly (e.g. webhook tests)
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist
    #[error("config file {} not found (run `job-finder init` to create one)", path.display())]
    NotFound { path: PathBuf },

    /// `init` refused to overwrite an existing file
    #[error("config file {} already exists", path.display())]
    AlreadyExists { path: PathBuf },

    /// TOML syntax error, missing required key or wrong type
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Semantically invalid value
    #[error("invalid value for `{field}`: {message}")]
    Invalid { field: String, message: String },

    /// Filesystem failure while reading or writing the file
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Storage layer errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failures
    #[error("Migration failed: {version} - {message}")]
    MigrationFailed { version: i64, message: String },

    /// A persisted value could not be decoded
    #[error("Corrupt row: {field} = {value}")]
    Decode { field: String, value: String },

    /// The database directory could not be created
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors talking to an upstream careers API
#[derive(Error, Debug)]
pub enum SourceError {
    /// Network connection timeouts
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Transport-level failures (DNS, TLS, connection reset)
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP error: {status} - {url}")]
    Http { status: u16, url: String },

    /// Response body did not have the expected shape
    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// A failed fetch for a single company
///
/// Non-fatal: the orchestrator records it in the run report and moves on
/// to the next company.
#[derive(Error, Debug)]
#[error("{company}: {cause}")]
pub struct FetchError {
    pub company: Company,
    #[source]
    pub cause: SourceError,
}

/// Notification delivery errors
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Transport-level failures
    #[error("{sink} request failed: {source}")]
    Request {
        sink: String,
        #[source]
        source: reqwest::Error,
    },

    /// Webhook answered with a non-success status
    #[error("{sink} webhook returned HTTP {status}")]
    Rejected { sink: String, status: u16 },

    /// Writing to the terminal failed
    #[error("terminal output failed: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl StorageError {
    /// Create a decode error for a persisted column
    pub fn decode<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Self::Decode {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl SourceError {
    /// Create a timeout error
    pub fn timeout<U: Into<String>>(url: U) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Create a decode error
    pub fn decode<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Classify a reqwest error, separating timeouts from other failures
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(url)
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
                url: url.to_string(),
            }
        } else if err.is_decode() {
            Self::decode(url, err.to_string())
        } else {
            Self::Request(err)
        }
    }

    /// Attach the failing company to this error
    pub fn for_company(self, company: Company) -> FetchError {
        FetchError {
            company,
            cause: self,
        }
    }
}

impl NotifyError {
    /// Create a rejected-status error
    pub fn rejected<S: Into<String>>(sink: S, status: u16) -> Self {
        Self::Rejected {
            sink: sink.into(),
            status,
        }
    }
}
