//! Job Finder
//!
//! Polls company careers APIs, filters postings by keyword and location,
//! remembers what was already announced in SQLite and notifies about new
//! postings on the terminal and through Slack/Discord webhooks.

pub mod config;
pub mod database;
pub mod errors;
pub mod ingestor;
pub mod models;
pub mod notifiers;
pub mod services;
pub mod sources;
pub mod utils;
