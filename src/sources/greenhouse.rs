//! Greenhouse job board API
//!
//! Used by Stripe and Anthropic, and by Uber as a fallback.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{decode_listings, title_or_unknown, FlexibleId, JobSource};
use crate::errors::{FetchError, SourceResult};
use crate::models::{Company, Job};
use crate::utils::location::UNKNOWN_LOCATION;
use crate::utils::{join_non_empty, DateTimeParser, HttpClient};

const API_BASE: &str = "https://api.greenhouse.io/v1/boards";

#[derive(Debug, Deserialize)]
pub struct BoardResponse {
    pub jobs: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    id: Option<FlexibleId>,
    title: Option<String>,
    absolute_url: Option<String>,
    location: Option<Named>,
    offices: Option<Vec<Named>>,
    departments: Option<Vec<Named>>,
    updated_at: Option<String>,
}

pub struct GreenhouseSource {
    company: Company,
    board: String,
    api_base: String,
    http: HttpClient,
}

impl GreenhouseSource {
    pub fn new(company: Company, board: impl Into<String>, http: HttpClient) -> Self {
        Self {
            company,
            board: board.into(),
            api_base: API_BASE.to_string(),
            http,
        }
    }

    /// Point the source at another boards API root
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/{}/jobs", self.api_base, self.board)
    }

    pub(crate) async fn fetch_listings(&self) -> SourceResult<Vec<Job>> {
        let response: BoardResponse = self.http.get_json(&self.endpoint(), &[]).await?;
        let jobs = parse_board(self.company, response);
        info!(
            "Fetched {} jobs from {} (Greenhouse board {})",
            jobs.len(),
            self.company,
            self.board
        );
        Ok(jobs)
    }
}

#[async_trait]
impl JobSource for GreenhouseSource {
    fn company(&self) -> Company {
        self.company
    }

    async fn fetch(&self) -> Result<Vec<Job>, FetchError> {
        self.fetch_listings()
            .await
            .map_err(|e| e.for_company(self.company))
    }
}

/// Map a board response onto jobs for `company`
pub fn parse_board(company: Company, response: BoardResponse) -> Vec<Job> {
    decode_listings(company, response.jobs, |listing: Listing| {
        let id = listing.id?.into_non_empty()?;

        let offices = names(listing.offices);
        let location = if !offices.is_empty() {
            offices
        } else {
            listing
                .location
                .and_then(|l| l.name)
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
        };

        Some(
            Job::new(
                company,
                id,
                title_or_unknown(listing.title),
                location,
                listing.absolute_url.unwrap_or_default(),
            )
            .with_department(names(listing.departments))
            .with_posted_at(DateTimeParser::parse_optional(listing.updated_at.as_deref())),
        )
    })
}

fn names(items: Option<Vec<Named>>) -> String {
    let names: Vec<String> = items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| item.name)
        .collect();
    join_non_empty(names.iter().map(String::as_str), ", ")
}
