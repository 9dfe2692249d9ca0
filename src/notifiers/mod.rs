//! Notification sinks for newly discovered jobs

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::NotifyError;
use crate::models::Job;
use crate::utils::HttpClient;

pub mod terminal;
pub mod webhook;

pub use terminal::TerminalNotifier;
pub use webhook::{WebhookKind, WebhookNotifier};

/// A sink that announces new jobs.
///
/// Called once per company and run, only with a non-empty list.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, jobs: &[Job]) -> Result<(), NotifyError>;
}

/// Terminal output plus one webhook notifier per configured URL
pub fn from_config(config: &Config, http: &HttpClient) -> Vec<Arc<dyn Notifier>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(TerminalNotifier::new())];
    notifiers.extend(
        webhook::configured(config, http)
            .into_iter()
            .map(|notifier| Arc::new(notifier) as Arc<dyn Notifier>),
    );
    notifiers
}
