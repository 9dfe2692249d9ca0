use std::future::Future;
use std::time::Duration;
use tracing::{error, info};

use super::{IngestorService, RunReport};
use crate::notifiers::TerminalNotifier;

/// How many runs a scheduler finished before shutdown
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunTally {
    pub succeeded: u64,
    pub failed: u64,
}

/// Repeats [`IngestorService::run_once`] every `interval` until shut down.
///
/// A run that fails, even with a storage error, is logged and the loop
/// waits for the next interval.
pub struct SchedulerService {
    ingestor: IngestorService,
    interval: Duration,
    terminal: TerminalNotifier,
}

impl SchedulerService {
    pub fn new(ingestor: IngestorService, interval: Duration) -> Self {
        Self {
            ingestor,
            interval,
            terminal: TerminalNotifier::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until `shutdown` resolves. The shutdown future interrupts both
    /// the sleep between runs and a run in progress. A cancelled run is not
    /// counted.
    pub async fn run_until<F>(&self, shutdown: F) -> RunTally
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut tally = RunTally::default();

        info!(
            "Scheduler started, running every {:.2} hours",
            self.interval.as_secs_f64() / 3600.0
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, cancelling run in progress");
                    break;
                }
                result = self.ingestor.run_once() => {
                    match result {
                        Ok(report) => {
                            tally.succeeded += 1;
                            self.report(&report);
                        }
                        Err(e) => {
                            tally.failed += 1;
                            error!("Run {} failed: {}", tally.succeeded + tally.failed, e);
                        }
                    }
                }
            }

            info!("Next run in {:?}", self.interval);
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tally
    }

    fn report(&self, report: &RunReport) {
        if report.total_new == 0 {
            self.terminal.no_new_jobs();
        }
        self.terminal.show_summary(report);
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
