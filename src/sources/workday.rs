//! Workday CXS job search (PayPal, Salesforce)
//!
//! The CXS endpoint is paged with `limit`/`offset` in a POST body and
//! reports the overall `total` on every page.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, info};

use super::{decode_listings, reached_cap, title_or_unknown, JobSource};
use crate::errors::{FetchError, SourceResult};
use crate::models::{Company, Job};
use crate::utils::location::UNKNOWN_LOCATION;
use crate::utils::{last_path_segment, HttpClient};

/// One company's Workday career site
#[derive(Debug, Clone, Copy)]
pub struct WorkdaySite {
    pub api_url: &'static str,
    /// Prefix that a posting's `externalPath` is appended to
    pub public_url: &'static str,
    pub page_size: usize,
}

pub const PAYPAL: WorkdaySite = WorkdaySite {
    api_url: "https://paypal.wd1.myworkdayjobs.com/wday/cxs/paypal/jobs/jobs",
    public_url: "https://paypal.wd1.myworkdayjobs.com/jobs",
    page_size: 50,
};

pub const SALESFORCE: WorkdaySite = WorkdaySite {
    api_url: "https://salesforce.wd12.myworkdayjobs.com/wday/cxs/salesforce/External_Career_Site/jobs",
    public_url: "https://salesforce.wd12.myworkdayjobs.com/en-US/External_Career_Site",
    page_size: 20,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    applied_facets: serde_json::Map<String, Value>,
    limit: usize,
    offset: usize,
    search_text: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(rename = "jobPostings")]
    pub job_postings: Vec<Value>,
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Posting {
    title: Option<String>,
    external_path: Option<String>,
    locations_text: Option<String>,
    posted_on: Option<String>,
    bullet_fields: Option<Vec<String>>,
    category_hierarchy: Option<Vec<String>>,
}

pub struct WorkdaySource {
    company: Company,
    site: WorkdaySite,
    api_url: String,
    http: HttpClient,
}

impl WorkdaySource {
    pub fn new(company: Company, site: WorkdaySite, http: HttpClient) -> Self {
        Self {
            company,
            site,
            api_url: site.api_url.to_string(),
            http,
        }
    }

    /// Send searches somewhere other than the site's CXS endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn fetch_listings(&self) -> SourceResult<Vec<Job>> {
        let mut jobs = Vec::new();
        let mut offset = 0;

        loop {
            let request = SearchRequest {
                applied_facets: serde_json::Map::new(),
                limit: self.site.page_size,
                offset,
                search_text: String::new(),
            };
            let page: SearchPage = self
                .http
                .post_json(&self.api_url, &request, &[])
                .await?;
            debug!(
                "{} page at offset {}: {} postings of {}",
                self.company,
                offset,
                page.job_postings.len(),
                page.total
            );

            if page.job_postings.is_empty() {
                break;
            }
            let total = page.total;
            jobs.extend(parse_page(self.company, &self.site, page, Utc::now()));

            offset += self.site.page_size;
            if offset >= total || reached_cap(self.company, jobs.len()) {
                break;
            }
        }

        info!("Fetched {} jobs from {} (Workday)", jobs.len(), self.company);
        Ok(jobs)
    }
}

#[async_trait]
impl JobSource for WorkdaySource {
    fn company(&self) -> Company {
        self.company
    }

    async fn fetch(&self) -> Result<Vec<Job>, FetchError> {
        self.fetch_listings()
            .await
            .map_err(|e| e.for_company(self.company))
    }
}

/// Map one search page onto jobs; `now` anchors relative "Posted N Days Ago" dates
pub fn parse_page(
    company: Company,
    site: &WorkdaySite,
    page: SearchPage,
    now: DateTime<Utc>,
) -> Vec<Job> {
    decode_listings(company, page.job_postings, |posting: Posting| {
        let path = posting
            .external_path
            .filter(|p| !p.trim().is_empty());
        let id = path
            .as_deref()
            .and_then(last_path_segment)
            .map(str::to_string)
            .or_else(|| {
                posting
                    .bullet_fields
                    .as_ref()
                    .and_then(|fields| fields.first())
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
            })?;

        let url = match &path {
            Some(path) => format!("{}{}", site.public_url, path),
            None => site.public_url.to_string(),
        };
        let location = posting
            .locations_text
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
        let department = posting
            .category_hierarchy
            .and_then(|c| c.into_iter().next())
            .unwrap_or_default();

        Some(
            Job::new(
                company,
                id,
                title_or_unknown(posting.title),
                location,
                url,
            )
            .with_department(department)
            .with_posted_at(
                posting
                    .posted_on
                    .as_deref()
                    .and_then(|text| parse_posted_on(text, now)),
            ),
        )
    })
}

/// Workday only reports relative dates. "30+ Days Ago" is too vague to keep.
pub fn parse_posted_on(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    static DAYS_AGO: OnceLock<Regex> = OnceLock::new();
    let days_ago = DAYS_AGO
        .get_or_init(|| Regex::new(r"(?i)\b(\d+)\s+days?\s+ago\b").expect("static pattern"));

    let lower = text.to_lowercase();
    if lower.contains("today") {
        return Some(now);
    }
    if lower.contains("yesterday") {
        return Some(now - Duration::days(1));
    }
    if lower.contains('+') {
        return None;
    }
    let days: i64 = days_ago.captures(text)?.get(1)?.as_str().parse().ok()?;
    Some(now - Duration::days(days))
}
