//! Slack and Discord incoming webhooks
//!
//! Each call sends one batched message. Long company lists are truncated
//! to [`MAX_JOBS_PER_COMPANY`] entries with an "...and N more" line, and
//! Discord messages carry at most [`MAX_DISCORD_EMBEDS`] embeds.

use async_trait::async_trait;
use serde_json::{json, Value};
use strum::{AsRefStr, Display};
use tracing::{debug, info};

use super::Notifier;
use crate::config::Config;
use crate::errors::NotifyError;
use crate::models::{group_by_company, Job};
use crate::utils::HttpClient;

pub const MAX_JOBS_PER_COMPANY: usize = 10;
pub const MAX_DISCORD_EMBEDS: usize = 10;

const DISCORD_EMBED_COLOR: u32 = 0x00FF00;
const TEST_MESSAGE: &str = "🔔 Job Finder webhook test - connection successful!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum WebhookKind {
    Slack,
    Discord,
}

pub struct WebhookNotifier {
    kind: WebhookKind,
    url: Option<String>,
    http: HttpClient,
}

/// Webhook notifiers for every sink that has a URL configured
pub fn configured(config: &Config, http: &HttpClient) -> Vec<WebhookNotifier> {
    [
        WebhookNotifier::new(WebhookKind::Slack, config.webhooks.slack.clone(), http.clone()),
        WebhookNotifier::new(WebhookKind::Discord, config.webhooks.discord.clone(), http.clone()),
    ]
    .into_iter()
    .filter(WebhookNotifier::is_configured)
    .collect()
}

impl WebhookNotifier {
    pub fn new(kind: WebhookKind, url: Option<String>, http: HttpClient) -> Self {
        let url = url.filter(|u| !u.trim().is_empty());
        Self { kind, url, http }
    }

    pub fn kind(&self) -> WebhookKind {
        self.kind
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    pub fn payload(&self, jobs: &[Job]) -> Value {
        match self.kind {
            WebhookKind::Slack => slack_payload(jobs),
            WebhookKind::Discord => discord_payload(jobs),
        }
    }

    /// Post a synthetic message to check the URL
    pub async fn send_test(&self) -> Result<(), NotifyError> {
        self.post(&test_payload(self.kind)).await
    }

    async fn post(&self, payload: &Value) -> Result<(), NotifyError> {
        let Some(url) = &self.url else {
            debug!("No {} webhook configured, skipping", self.kind);
            return Ok(());
        };

        let response = self
            .http
            .inner_client()
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|source| NotifyError::Request {
                sink: self.kind.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::rejected(self.kind.to_string(), status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        self.kind.as_ref()
    }

    async fn notify(&self, jobs: &[Job]) -> Result<(), NotifyError> {
        if jobs.is_empty() || !self.is_configured() {
            return Ok(());
        }
        self.post(&self.payload(jobs)).await?;
        info!("Sent {} notification for {} jobs", self.kind, jobs.len());
        Ok(())
    }
}

fn remaining(total: usize) -> Option<usize> {
    total
        .checked_sub(MAX_JOBS_PER_COMPANY)
        .filter(|extra| *extra > 0)
}

/// Block Kit message: header, then one section per job grouped by company
pub fn slack_payload(jobs: &[Job]) -> Value {
    let mut blocks = vec![
        json!({
            "type": "header",
            "text": {
                "type": "plain_text",
                "text": format!("🚀 {} New Job(s) Found!", jobs.len()),
                "emoji": true,
            },
        }),
        json!({"type": "divider"}),
    ];

    for (company, company_jobs) in group_by_company(jobs) {
        blocks.push(mrkdwn_section(format!(
            "*{}* ({} jobs)",
            company,
            company_jobs.len()
        )));

        for job in company_jobs.iter().take(MAX_JOBS_PER_COMPANY) {
            let mut line = format!("• <{}|{}>", job.url, job.title);
            if !job.location.is_empty() {
                line.push_str(&format!(" | 📍 {}", job.location));
            }
            if !job.department.is_empty() {
                line.push_str(&format!(" | 🏢 {}", job.department));
            }
            blocks.push(mrkdwn_section(line));
        }

        if let Some(extra) = remaining(company_jobs.len()) {
            blocks.push(mrkdwn_section(format!("_...and {extra} more_")));
        }
        blocks.push(json!({"type": "divider"}));
    }

    json!({ "blocks": blocks })
}

fn mrkdwn_section(text: String) -> Value {
    json!({
        "type": "section",
        "text": {"type": "mrkdwn", "text": text},
    })
}

/// One embed per company, capped at the Discord embed limit
pub fn discord_payload(jobs: &[Job]) -> Value {
    let embeds: Vec<Value> = group_by_company(jobs)
        .into_iter()
        .take(MAX_DISCORD_EMBEDS)
        .map(|(company, company_jobs)| {
            let mut lines: Vec<String> = company_jobs
                .iter()
                .take(MAX_JOBS_PER_COMPANY)
                .map(|job| {
                    if job.location.is_empty() {
                        format!("• [{}]({})", job.title, job.url)
                    } else {
                        format!("• [{}]({}) ({})", job.title, job.url, job.location)
                    }
                })
                .collect();
            if let Some(extra) = remaining(company_jobs.len()) {
                lines.push(format!("_...and {extra} more_"));
            }

            json!({
                "title": format!("{} ({} jobs)", company, company_jobs.len()),
                "description": lines.join("\n"),
                "color": DISCORD_EMBED_COLOR,
            })
        })
        .collect();

    json!({
        "content": format!("🚀 **{} New Job(s) Found!**", jobs.len()),
        "embeds": embeds,
    })
}

pub fn test_payload(kind: WebhookKind) -> Value {
    match kind {
        WebhookKind::Slack => json!({ "text": TEST_MESSAGE }),
        WebhookKind::Discord => json!({ "content": TEST_MESSAGE }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Company;
    use std::time::Duration;
    use strum::IntoEnumIterator;

    fn jobs_for(company: Company, count: usize) -> Vec<Job> {
        (0..count)
            .map(|i| {
                Job::new(
                    company,
                    i.to_string(),
                    format!("Engineer {i}"),
                    "Remote",
                    format!("https://example.com/{i}"),
                )
            })
            .collect()
    }

    #[test]
    fn test_slack_payload_caps_jobs_per_company() {
        let mut jobs = jobs_for(Company::Stripe, 13);
        jobs.extend(jobs_for(Company::Ramp, 2));
        let payload = slack_payload(&jobs);
        let blocks = payload["blocks"].as_array().unwrap();

        assert_eq!(blocks[0]["text"]["text"], "🚀 15 New Job(s) Found!");
        let texts: Vec<&str> = blocks
            .iter()
            .filter_map(|b| b["text"]["text"].as_str())
            .collect();
        assert!(texts.contains(&"*Stripe* (13 jobs)"));
        assert!(texts.contains(&"_...and 3 more_"));
        assert!(texts.contains(&"• <https://example.com/0|Engineer 0> | 📍 Remote"));
        assert_eq!(texts.iter().filter(|t| t.starts_with("• ")).count(), 12);
        assert_eq!(texts.iter().filter(|t| t.contains("more_")).count(), 1);
    }

    #[test]
    fn test_slack_payload_exactly_ten_has_no_more_line() {
        let payload = slack_payload(&jobs_for(Company::Uber, 10));
        assert!(!payload.to_string().contains("more_"));
    }

    #[test]
    fn test_discord_payload_one_embed_per_company() {
        let mut jobs = Vec::new();
        for company in Company::iter() {
            jobs.extend(jobs_for(company, 1));
        }
        let payload = discord_payload(&jobs);
        assert_eq!(payload["embeds"].as_array().unwrap().len(), 8);
        assert_eq!(payload["content"], "🚀 **8 New Job(s) Found!**");

        let payload = discord_payload(&jobs_for(Company::Amazon, 12));
        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"], "Amazon (12 jobs)");
        assert_eq!(embed["color"], 0x00FF00);
        let description = embed["description"].as_str().unwrap();
        assert_eq!(description.lines().count(), 11);
        assert!(description.ends_with("_...and 2 more_"));
        assert!(description.starts_with("• [Engineer 0](https://example.com/0) (Remote)"));
    }

    #[test]
    fn test_test_payload() {
        assert!(test_payload(WebhookKind::Slack)["text"].is_string());
        assert!(test_payload(WebhookKind::Discord)["content"].is_string());
    }

    #[tokio::test]
    async fn test_unconfigured_webhook_skips_silently() {
        let http = HttpClient::new(Duration::from_secs(1)).unwrap();
        let notifier = WebhookNotifier::new(WebhookKind::Slack, Some("  ".to_string()), http);
        assert!(!notifier.is_configured());
        assert_eq!(notifier.name(), "slack");
        notifier.notify(&jobs_for(Company::Stripe, 1)).await.unwrap();
        notifier.send_test().await.unwrap();
    }
}
