//! Uber careers search, with Uber's Greenhouse board as fallback

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::greenhouse::GreenhouseSource;
use super::{decode_listings, reached_cap, title_or_unknown, FlexibleId, JobSource, OneOrMany};
use crate::errors::{FetchError, SourceResult};
use crate::models::{Company, Job};
use crate::utils::location::{format_structured_location, UNKNOWN_LOCATION};
use crate::utils::{join_non_empty, HttpClient};

const API_URL: &str = "https://www.uber.com/api/loadSearchJobsResults";
const LISTING_URL: &str = "https://www.uber.com/careers/list";
const FALLBACK_BOARD: &str = "uber";
const PAGE_SIZE: usize = 100;
const MAX_PAGES: usize = 50;

#[derive(Debug, Serialize)]
struct SearchRequest {
    params: SearchParams,
}

#[derive(Debug, Serialize)]
struct SearchParams {
    page: usize,
    limit: usize,
    location: Vec<String>,
    team: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub data: SearchData,
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListingLocation {
    Text(String),
    List(Vec<ListingLocation>),
    Place {
        city: Option<String>,
        region: Option<String>,
        #[serde(rename = "countryName")]
        country_name: Option<String>,
        country: Option<String>,
    },
}

impl ListingLocation {
    fn render(self) -> Vec<String> {
        match self {
            ListingLocation::Text(text) => vec![text],
            ListingLocation::Place {
                city,
                region,
                country_name,
                country,
            } => {
                let rendered = format_structured_location(
                    city.as_deref(),
                    region.as_deref(),
                    country_name.or(country).as_deref(),
                );
                if rendered == UNKNOWN_LOCATION {
                    Vec::new()
                } else {
                    vec![rendered]
                }
            }
            ListingLocation::List(items) => items.into_iter().flat_map(Self::render).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    id: Option<FlexibleId>,
    title: Option<String>,
    location: Option<ListingLocation>,
    team: Option<OneOrMany<String>>,
    url: Option<String>,
}

pub struct UberSource {
    api_url: String,
    http: HttpClient,
    fallback: GreenhouseSource,
}

impl UberSource {
    pub fn new(http: HttpClient) -> Self {
        let fallback = GreenhouseSource::new(Company::Uber, FALLBACK_BOARD, http.clone());
        Self {
            api_url: API_URL.to_string(),
            http,
            fallback,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Replace the Greenhouse board tried when the careers search fails
    pub fn with_fallback(mut self, fallback: GreenhouseSource) -> Self {
        self.fallback = fallback;
        self
    }

    async fn fetch_listings(&self) -> SourceResult<Vec<Job>> {
        let mut jobs = Vec::new();

        for page in 0..MAX_PAGES {
            let request = SearchRequest {
                params: SearchParams {
                    page,
                    limit: PAGE_SIZE,
                    location: Vec::new(),
                    team: Vec::new(),
                },
            };
            let response: SearchResponse = self
                .http
                .post_json(&self.api_url, &request, &[("x-csrf-token", "x")])
                .await?;
            debug!("Uber page {}: {} results", page, response.data.results.len());

            if response.data.results.is_empty() {
                break;
            }
            jobs.extend(parse_results(response));

            if reached_cap(Company::Uber, jobs.len()) {
                break;
            }
        }

        info!("Fetched {} jobs from Uber", jobs.len());
        Ok(jobs)
    }
}

#[async_trait]
impl JobSource for UberSource {
    fn company(&self) -> Company {
        Company::Uber
    }

    async fn fetch(&self) -> Result<Vec<Job>, FetchError> {
        match self.fetch_listings().await {
            Ok(jobs) => Ok(jobs),
            Err(primary) => {
                warn!(
                    "Uber careers search failed ({}), falling back to Greenhouse board",
                    primary
                );
                self.fallback
                    .fetch_listings()
                    .await
                    .map_err(|e| e.for_company(Company::Uber))
            }
        }
    }
}

pub fn parse_results(response: SearchResponse) -> Vec<Job> {
    decode_listings(Company::Uber, response.data.results, |listing: Listing| {
        let id = listing.id?.into_non_empty()?;

        let locations = listing.location.map(ListingLocation::render).unwrap_or_default();
        let location = join_non_empty(locations.iter().map(String::as_str), "; ");
        let location = if location.is_empty() {
            UNKNOWN_LOCATION.to_string()
        } else {
            location
        };

        let teams = listing.team.map(OneOrMany::into_vec).unwrap_or_default();
        let url = listing
            .url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| format!("{LISTING_URL}/{id}"));

        Some(
            Job::new(
                Company::Uber,
                id,
                title_or_unknown(listing.title),
                location,
                url,
            )
            .with_department(join_non_empty(teams.iter().map(String::as_str), ", ")),
        )
    })
}
