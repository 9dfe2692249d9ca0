use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use job_finder::{
    config::{hours_to_duration, validate_interval_hours, Config, DEFAULT_CONFIG_PATH},
    database::Database,
    ingestor::{
        scheduler::{shutdown_signal, SchedulerService},
        IngestorService,
    },
    models::Company,
    notifiers::{webhook, TerminalNotifier},
    utils::HttpClient,
};

#[derive(Parser)]
#[command(name = "job-finder")]
#[command(version)]
#[command(about = "Monitor company career pages for new job postings")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    config: PathBuf,

    /// Log level
    #[arg(short = 'v', long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default configuration file
    Init,
    /// Run a single job check (default)
    Run,
    /// Run job checks on an interval until interrupted
    Schedule {
        /// Check interval in hours (overrides config)
        #[arg(short, long, value_name = "HOURS")]
        interval: Option<f64>,
    },
    /// Show database statistics
    Stats,
    /// List stored jobs, newest first
    List {
        /// Only show jobs of this company
        #[arg(long)]
        company: Option<Company>,

        /// Maximum number of jobs shown
        #[arg(short = 'n', long)]
        limit: Option<u32>,
    },
    /// Send a test message to every configured webhook
    TestWebhooks,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_filter = format!("job_finder={}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let terminal = TerminalNotifier::new();
    match run(cli, &terminal).await {
        Ok(code) => code,
        Err(e) => {
            terminal.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, terminal: &TerminalNotifier) -> Result<ExitCode> {
    match cli.command.unwrap_or(Command::Run) {
        Command::Init => {
            Config::init(&cli.config)?;
            terminal.success(&format!(
                "Created default configuration at {}",
                cli.config.display()
            ));
            terminal.info("Edit the file to customize companies, webhooks and filters");
            Ok(ExitCode::SUCCESS)
        }
        Command::Run => {
            let config = Config::load(&cli.config)?;
            let ingestor = IngestorService::from_config(&config).await?;

            let report = ingestor.run_once().await?;
            if report.total_new == 0 {
                terminal.no_new_jobs();
            }
            terminal.show_summary(&report);
            Ok(ExitCode::SUCCESS)
        }
        Command::Schedule { interval } => {
            let config = Config::load(&cli.config)?;
            let hours = interval.unwrap_or(config.schedule.interval_hours);
            validate_interval_hours(hours)?;

            let ingestor = IngestorService::from_config(&config).await?;
            let scheduler = SchedulerService::new(ingestor, hours_to_duration(hours));

            terminal.success(&format!(
                "Starting scheduler (checking every {hours} hours)"
            ));
            terminal.info("Press Ctrl+C to stop");

            let runs = scheduler.run_until(shutdown_signal()).await;
            info!(
                "Scheduler stopped after {} successful and {} failed runs",
                runs.succeeded, runs.failed
            );
            terminal.info("Scheduler stopped");
            Ok(ExitCode::SUCCESS)
        }
        Command::Stats => {
            let database = open_database(&cli.config).await?;
            terminal.show_stats(&database.stats().await?);
            Ok(ExitCode::SUCCESS)
        }
        Command::List { company, limit } => {
            let database = open_database(&cli.config).await?;
            terminal.show_listing(&database.list(company, limit).await?);
            Ok(ExitCode::SUCCESS)
        }
        Command::TestWebhooks => {
            let config = Config::load(&cli.config)?;
            let http = HttpClient::new(config.request_timeout())?;
            let webhooks = webhook::configured(&config, &http);

            if webhooks.is_empty() {
                terminal.error("No webhooks configured. Add them to the config file or set the environment variables");
                return Ok(ExitCode::FAILURE);
            }

            terminal.info("Testing webhook connections...");
            let mut all_ok = true;
            for notifier in &webhooks {
                match notifier.send_test().await {
                    Ok(()) => terminal.success(&format!("{}: Connected successfully", notifier.kind())),
                    Err(e) => {
                        all_ok = false;
                        terminal.error(&format!("{}: Connection failed ({})", notifier.kind(), e));
                    }
                }
            }

            Ok(if all_ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn open_database(config_path: &Path) -> Result<Database> {
    let config = Config::load(config_path)?;
    let database = Database::open(&config.db_path).await?;
    database.migrate().await?;
    Ok(database)
}
