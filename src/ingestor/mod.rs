//! Run orchestration
//!
//! [`IngestorService::run_once`] performs one full cycle over the enabled
//! companies: fetch, filter, dedup against the store, notify. The
//! [`scheduler`] module repeats that cycle on an interval.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::database::Database;
use crate::errors::{AppResult, FetchError};
use crate::models::{Company, Job};
use crate::notifiers::{self, Notifier};
use crate::services::filter::JobFilter;
use crate::sources::{JobSource, SourceHandlerFactory};
use crate::utils::HttpClient;

pub mod scheduler;

pub use scheduler::{RunTally, SchedulerService};

/// A notifier that failed for one company's batch
#[derive(Debug, Clone)]
pub struct NotifyFailure {
    pub notifier: String,
    pub company: Company,
    pub message: String,
}

/// Outcome of one run across all companies
#[derive(Debug, Default)]
pub struct RunReport {
    pub total_fetched: usize,
    pub total_matched: usize,
    pub total_new: usize,
    pub errors: Vec<FetchError>,
    pub notify_failures: Vec<NotifyFailure>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.notify_failures.is_empty()
    }
}

pub struct IngestorService {
    sources: Vec<Arc<dyn JobSource>>,
    filter: JobFilter,
    database: Database,
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl IngestorService {
    pub fn new(
        sources: Vec<Arc<dyn JobSource>>,
        filter: JobFilter,
        database: Database,
        notifiers: Vec<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            sources,
            filter,
            database,
            notifiers,
        }
    }

    /// Wire up sources, store and notifiers from a loaded config
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        let http = HttpClient::new(config.request_timeout())?;

        let database = Database::open(&config.db_path).await?;
        database.migrate().await?;
        info!("Using database: {}", config.db_path.display());

        let sources = SourceHandlerFactory::registry(&config.companies, &http);
        if sources.is_empty() {
            warn!("No known companies configured, runs will do nothing");
        }

        let filter = JobFilter::new(&config.filters);
        if filter.is_match_all() {
            info!("No keyword or location filters configured, every job matches");
        }

        Ok(Self::new(
            sources,
            filter,
            database,
            notifiers::from_config(config, &http),
        ))
    }

    /// One fetch-filter-dedup-notify cycle.
    ///
    /// Fetch and notification failures are recorded in the report and the
    /// run moves on; a storage failure aborts the run. New jobs of a company
    /// are committed before its notifiers are called.
    pub async fn run_once(&self) -> AppResult<RunReport> {
        let mut report = RunReport::default();

        for source in &self.sources {
            let company = source.company();
            info!("Checking {}...", company);

            let jobs = match source.fetch().await {
                Ok(jobs) => jobs,
                Err(e) => {
                    warn!("Fetch failed for {}: {}", company, e.cause);
                    report.errors.push(e);
                    continue;
                }
            };
            report.total_fetched += jobs.len();

            let matched = self.filter.apply(jobs);
            report.total_matched += matched.len();

            let new_jobs = self.database.filter_new(&matched).await?;
            report.total_new += new_jobs.len();
            info!(
                "{}: {} matching, {} new",
                company,
                matched.len(),
                new_jobs.len()
            );

            if !new_jobs.is_empty() {
                self.notify_all(company, &new_jobs, &mut report).await;
            }
        }

        Ok(report)
    }

    async fn notify_all(&self, company: Company, jobs: &[Job], report: &mut RunReport) {
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(jobs).await {
                error!(
                    "{} notification failed for {}: {}",
                    notifier.name(),
                    company,
                    e
                );
                report.notify_failures.push(NotifyFailure {
                    notifier: notifier.name().to_string(),
                    company,
                    message: e.to_string(),
                });
            }
        }
    }
}
