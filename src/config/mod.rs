use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::{ConfigError, ConfigResult};
use crate::models::Company;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const SLACK_WEBHOOK_ENV: &str = "JOB_FINDER_SLACK_WEBHOOK";
pub const DISCORD_WEBHOOK_ENV: &str = "JOB_FINDER_DISCORD_WEBHOOK";

const MAX_TIMEOUT_SECS: u64 = 300;

/// Written by `job-finder init`. Must stay parseable by [`Config::from_toml_str`].
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Job Finder configuration

# Companies to monitor. Supported: google, stripe, paypal, uber, ramp,
# anthropic, amazon, salesforce
companies = ["google", "stripe", "paypal", "uber", "ramp", "anthropic", "amazon", "salesforce"]

# SQLite database that remembers postings which were already announced
db_path = "jobs.db"

[webhooks]
# Incoming webhook URLs, leave empty to disable.
# JOB_FINDER_SLACK_WEBHOOK and JOB_FINDER_DISCORD_WEBHOOK override these.
slack = ""
discord = ""

[filters]
# Case-insensitive substrings. A job matches when its title contains any
# keyword and its location contains any location. Empty lists match everything.
keywords = ["engineer", "developer", "software"]
locations = ["remote", "new york"]

[schedule]
interval_hours = 6

[http]
timeout_secs = 30
"#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub companies: Vec<String>,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default)]
    pub webhooks: WebhooksConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WebhooksConfig {
    pub slack: Option<String>,
    pub discord: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FiltersConfig {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_hours")]
    pub interval_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("jobs.db")
}

fn default_interval_hours() -> f64 {
    6.0
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            companies: Company::all().iter().map(Company::key).collect(),
            db_path: default_db_path(),
            webhooks: WebhooksConfig::default(),
            filters: FiltersConfig::default(),
            schedule: ScheduleConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load the config file, apply environment overrides and validate it.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut config = Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        info!("Configuration loaded from: {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Write the default template. Never overwrites an existing file.
    pub fn init(path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => ConfigError::AlreadyExists {
                    path: path.to_path_buf(),
                },
                _ => io_err(e),
            })?;
        file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())
            .map_err(io_err)?;

        info!("Created default config file: {}", path.display());
        Ok(())
    }

    /// Environment values win over file values whenever they are set and non-empty.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = non_empty(lookup(SLACK_WEBHOOK_ENV)) {
            debug!("Slack webhook overridden by {}", SLACK_WEBHOOK_ENV);
            self.webhooks.slack = Some(url);
        }
        if let Some(url) = non_empty(lookup(DISCORD_WEBHOOK_ENV)) {
            debug!("Discord webhook overridden by {}", DISCORD_WEBHOOK_ENV);
            self.webhooks.discord = Some(url);
        }
    }

    pub fn validate(&mut self) -> ConfigResult<()> {
        self.webhooks.slack = non_empty(self.webhooks.slack.take());
        self.webhooks.discord = non_empty(self.webhooks.discord.take());

        if self.companies.is_empty() {
            return Err(ConfigError::invalid(
                "companies",
                "at least one company must be listed",
            ));
        }
        validate_interval_hours(self.schedule.interval_hours)?;
        if self.http.timeout_secs == 0 || self.http.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::invalid(
                "http.timeout_secs",
                format!("must be between 1 and {MAX_TIMEOUT_SECS}"),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        hours_to_duration(self.schedule.interval_hours)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

pub fn validate_interval_hours(hours: f64) -> ConfigResult<()> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(ConfigError::invalid(
            "schedule.interval_hours",
            format!("must be a positive number, got {hours}"),
        ));
    }
    if Duration::try_from_secs_f64(hours * 3600.0).is_err() {
        return Err(ConfigError::invalid(
            "schedule.interval_hours",
            format!("{hours} hours is too large"),
        ));
    }
    Ok(())
}

/// Saturates at `Duration::MAX` for values that [`validate_interval_hours`] rejects
pub fn hours_to_duration(hours: f64) -> Duration {
    Duration::try_from_secs_f64(hours * 3600.0).unwrap_or(Duration::MAX)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
