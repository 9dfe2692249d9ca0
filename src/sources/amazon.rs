//! Amazon jobs `search.json`, paged by `offset` until `hits` is reached

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{decode_listings, reached_cap, title_or_unknown, FlexibleId, JobSource, OneOrMany};
use crate::errors::{FetchError, SourceResult};
use crate::models::{Company, Job};
use crate::utils::location::UNKNOWN_LOCATION;
use crate::utils::{join_non_empty, DateTimeParser, HttpClient};

const API_URL: &str = "https://www.amazon.jobs/en/search.json";
const SITE_URL: &str = "https://www.amazon.jobs";
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SearchPage {
    pub jobs: Vec<Value>,
    #[serde(default)]
    pub hits: usize,
}

#[derive(Debug, Deserialize)]
struct Listing {
    id_icims: Option<FlexibleId>,
    id: Option<FlexibleId>,
    title: Option<String>,
    normalized_location: Option<String>,
    location: Option<String>,
    business_category: Option<String>,
    category: Option<OneOrMany<String>>,
    posted_date: Option<String>,
    job_path: Option<String>,
}

pub struct AmazonSource {
    api_url: String,
    http: HttpClient,
}

impl AmazonSource {
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
        let mut offset = 0;

        loop {
            let query = [
                ("offset", offset.to_string()),
                ("result_limit", PAGE_SIZE.to_string()),
                ("sort", "recent".to_string()),
            ];
            let page: SearchPage = self.http.get_json(&self.api_url, &query).await?;
            debug!(
                "Amazon page at offset {}: {} jobs of {}",
                offset,
                page.jobs.len(),
                page.hits
            );

            if page.jobs.is_empty() {
                break;
            }
            let hits = page.hits;
            jobs.extend(parse_page(page));

            offset += PAGE_SIZE;
            if offset >= hits || reached_cap(Company::Amazon, jobs.len()) {
                break;
            }
        }

        info!("Fetched {} jobs from Amazon", jobs.len());
        Ok(jobs)
    }
}

#[async_trait]
impl JobSource for AmazonSource {
    fn company(&self) -> Company {
        Company::Amazon
    }

    async fn fetch(&self) -> Result<Vec<Job>, FetchError> {
        self.fetch_listings()
            .await
            .map_err(|e| e.for_company(Company::Amazon))
    }
}

pub fn parse_page(page: SearchPage) -> Vec<Job> {
    decode_listings(Company::Amazon, page.jobs, |listing: Listing| {
        let id = listing
            .id_icims
            .and_then(FlexibleId::into_non_empty)
            .or_else(|| listing.id.and_then(FlexibleId::into_non_empty))?;

        let location = listing
            .normalized_location
            .or(listing.location)
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        let categories = listing.category.map(OneOrMany::into_vec).unwrap_or_default();
        let department = if categories.is_empty() {
            listing.business_category.unwrap_or_default()
        } else {
            join_non_empty(categories.iter().map(String::as_str), ", ")
        };

        let url = listing
            .job_path
            .filter(|p| !p.is_empty())
            .map(|path| format!("{SITE_URL}{path}"))
            .unwrap_or_default();

        Some(
            Job::new(
                Company::Amazon,
                id,
                title_or_unknown(listing.title),
                location,
                url,
            )
            .with_department(department)
            .with_posted_at(DateTimeParser::parse_optional(listing.posted_date.as_deref())),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;
    use serde_json::json;

    const FIXTURE: &str = r#"{
        "error": null,
        "hits": 2843,
        "jobs": [
            {
                "id": "2591234",
                "id_icims": "2591234",
                "title": "Software Development Engineer II, AWS",
                "normalized_location": "Seattle, Washington, USA",
                "location": "US, WA, Seattle",
                "business_category": "aws",
                "category": ["Software Development"],
                "posted_date": "March 5, 2024",
                "job_path": "/en/jobs/2591234/software-development-engineer-ii-aws"
            },
            {
                "id": "ab12-cd34",
                "title": "Area Manager",
                "location": "Dublin, IE",
                "business_category": "fulfillment-operations",
                "posted_date": "not a date"
            },
            {
                "title": "No id"
            }
        ]
    }"#;

    #[test]
    fn test_parse_page() {
        let page: SearchPage = serde_json::from_str(FIXTURE).unwrap();
        assert_eq!(page.hits, 2843);
        let jobs = parse_page(page);
        assert_eq!(jobs.len(), 2);

        assert_eq!(jobs[0].external_id, "2591234");
        assert_eq!(jobs[0].location, "Seattle, Washington, USA");
        assert_eq!(jobs[0].department, "Software Development");
        assert_eq!(
            jobs[0].url,
            "https://www.amazon.jobs/en/jobs/2591234/software-development-engineer-ii-aws"
        );
        assert_eq!(
            jobs[0].posted_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );

        assert_eq!(jobs[1].external_id, "ab12-cd34");
        assert_eq!(jobs[1].location, "Dublin, IE");
        assert_eq!(jobs[1].department, "fulfillment-operations");
        assert_eq!(jobs[1].url, "");
        assert_eq!(jobs[1].posted_at, None);
    }

    #[tokio::test]
    async fn test_fetch_pages_until_hits() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/search.json")
            .match_query(Matcher::UrlEncoded("offset".into(), "0".into()))
            .with_status(200)
            .with_body(
                json!({"hits": 150, "jobs": [{"id_icims": "1", "title": "SDE"}, {"id_icims": "2", "title": "SDE II"}]})
                    .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/search.json")
            .match_query(Matcher::UrlEncoded("offset".into(), "100".into()))
            .with_status(200)
            .with_body(json!({"hits": 150, "jobs": [{"id_icims": "3", "title": "PM"}]}).to_string())
            .expect(1)
            .create_async()
            .await;

        let http = HttpClient::new(std::time::Duration::from_secs(5)).unwrap();
        let source = AmazonSource::new(http).with_api_url(format!("{}/search.json", server.url()));
        let jobs = source.fetch().await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        let ids: Vec<_> = jobs.iter().map(|j| j.external_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(jobs[0].location, "Unknown");
    }
}
