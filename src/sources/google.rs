//! Google careers v3 search API, paged by `next_page_token`

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{decode_listings, reached_cap, title_or_unknown, JobSource};
use crate::errors::{FetchError, SourceResult};
use crate::models::{Company, Job};
use crate::utils::location::UNKNOWN_LOCATION;
use crate::utils::{join_non_empty, last_path_segment, HttpClient};

const API_URL: &str = "https://careers.google.com/api/v3/search/";
const RESULTS_URL: &str = "https://careers.google.com/jobs/results";
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SearchPage {
    pub jobs: Vec<Value>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingId {
    Text(String),
    Number(i64),
    Object { job_id: Option<String> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingLocation {
    Text(String),
    Place {
        display: Option<String>,
        city: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct Listing {
    id: Option<ListingId>,
    name: Option<String>,
    title: Option<String>,
    locations: Option<Vec<ListingLocation>>,
    categories: Option<Vec<String>>,
    apply_url: Option<String>,
}

pub struct GoogleSource {
    api_url: String,
    http: HttpClient,
}

impl GoogleSource {
    pub fn new(http: HttpClient) -> Self {
        Self {
            api_url: API_URL.to_string(),
            http,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn fetch_listings(&self) -> SourceResult<Vec<Job>> {
        let mut jobs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("page_size", PAGE_SIZE.to_string()), ("q", String::new())];
            if let Some(token) = &page_token {
                query.push(("page_token", token.clone()));
            }

            let page: SearchPage = self.http.get_json(&self.api_url, &query).await?;
            debug!("Google page: {} listings", page.jobs.len());
            if page.jobs.is_empty() {
                break;
            }
            let next = page.next_page_token.clone().filter(|t| !t.is_empty());
            jobs.extend(parse_page(page));

            match next {
                Some(token) if !reached_cap(Company::Google, jobs.len()) => page_token = Some(token),
                _ => break,
            }
        }

        info!("Fetched {} jobs from Google", jobs.len());
        Ok(jobs)
    }
}

#[async_trait]
impl JobSource for GoogleSource {
    fn company(&self) -> Company {
        Company::Google
    }

    async fn fetch(&self) -> Result<Vec<Job>, FetchError> {
        self.fetch_listings()
            .await
            .map_err(|e| e.for_company(Company::Google))
    }
}

pub fn parse_page(page: SearchPage) -> Vec<Job> {
    decode_listings(Company::Google, page.jobs, |listing: Listing| {
        let id = listing_id(listing.id, listing.name.as_deref())?;

        let locations: Vec<String> = listing
            .locations
            .unwrap_or_default()
            .into_iter()
            .filter_map(|location| match location {
                ListingLocation::Text(text) => Some(text),
                ListingLocation::Place { display, city } => display.or(city),
            })
            .collect();
        let location = join_non_empty(locations.iter().map(String::as_str), "; ");
        let location = if location.is_empty() {
            UNKNOWN_LOCATION.to_string()
        } else {
            location
        };

        let categories = listing.categories.unwrap_or_default();
        let url = listing
            .apply_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| format!("{RESULTS_URL}/{id}"));

        Some(
            Job::new(
                Company::Google,
                id,
                title_or_unknown(listing.title),
                location,
                url,
            )
            .with_department(join_non_empty(categories.iter().map(String::as_str), ", ")),
        )
    })
}

/// `id` may be a plain value or `{"job_id": ...}`; `name` looks like `jobs/123`
fn listing_id(id: Option<ListingId>, name: Option<&str>) -> Option<String> {
    let from_id = id.and_then(|id| match id {
        ListingId::Text(text) => Some(text),
        ListingId::Number(n) => Some(n.to_string()),
        ListingId::Object { job_id } => job_id,
    });
    from_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .or_else(|| name.and_then(last_path_segment).map(str::to_string))
}
