//! Ashby posting API (Ramp)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{decode_listings, title_or_unknown, FlexibleId, JobSource};
use crate::errors::{FetchError, SourceResult};
use crate::models::{Company, Job};
use crate::utils::location::{REMOTE_LOCATION, UNKNOWN_LOCATION};
use crate::utils::{join_non_empty, DateTimeParser, HttpClient};

const API_BASE: &str = "https://api.ashbyhq.com/posting-api/job-board";

#[derive(Debug, Deserialize)]
pub struct JobBoardResponse {
    pub jobs: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Listing {
    id: Option<FlexibleId>,
    title: Option<String>,
    location: Option<String>,
    is_remote: Option<bool>,
    department: Option<String>,
    team: Option<String>,
    job_url: Option<String>,
    published_at: Option<String>,
}

pub struct AshbySource {
    company: Company,
    board: String,
    api_base: String,
    http: HttpClient,
}

impl AshbySource {
    pub fn new(company: Company, board: impl Into<String>, http: HttpClient) -> Self {
        Self {
            company,
            board: board.into(),
            api_base: API_BASE.to_string(),
            http,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.api_base, self.board)
    }

    async fn fetch_listings(&self) -> SourceResult<Vec<Job>> {
        let response: JobBoardResponse = self.http.get_json(&self.endpoint(), &[]).await?;
        let jobs = parse_job_board(self.company, response);
        info!("Fetched {} jobs from {}", jobs.len(), self.company);
        Ok(jobs)
    }
}

#[async_trait]
impl JobSource for AshbySource {
    fn company(&self) -> Company {
        self.company
    }

    async fn fetch(&self) -> Result<Vec<Job>, FetchError> {
        self.fetch_listings()
            .await
            .map_err(|e| e.for_company(self.company))
    }
}

pub fn parse_job_board(company: Company, response: JobBoardResponse) -> Vec<Job> {
    decode_listings(company, response.jobs, |listing: Listing| {
        let id = listing.id?.into_non_empty()?;

        let location = listing
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());
        let location = match (listing.is_remote.unwrap_or(false), location.as_str()) {
            (true, UNKNOWN_LOCATION) => REMOTE_LOCATION.to_string(),
            (true, _) => format!("{location} ({REMOTE_LOCATION})"),
            (false, _) => location,
        };

        let department = join_non_empty(
            [
                listing.department.as_deref().unwrap_or_default(),
                listing.team.as_deref().unwrap_or_default(),
            ],
            " - ",
        );

        Some(
            Job::new(
                company,
                id,
                title_or_unknown(listing.title),
                location,
                listing.job_url.unwrap_or_default(),
            )
            .with_department(department)
            .with_posted_at(DateTimeParser::parse_optional(listing.published_at.as_deref())),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const FIXTURE: &str = r#"{
        "apiVersion": "1",
        "jobs": [
            {
                "id": "0f5a1c3e-1111-4c2b-9c1d-aaaaaaaaaaaa",
                "title": "Software Engineer, Backend",
                "location": "New York",
                "isRemote": true,
                "department": "Engineering",
                "team": "Platform",
                "jobUrl": "https://jobs.ashbyhq.com/ramp/0f5a1c3e",
                "publishedAt": "2024-05-02T14:30:00.000+00:00"
            },
            {
                "id": "0f5a1c3e-2222-4c2b-9c1d-bbbbbbbbbbbb",
                "title": "Account Executive",
                "isRemote": true,
                "team": "Sales"
            },
            {
                "id": "0f5a1c3e-3333-4c2b-9c1d-cccccccccccc",
                "title": "Designer",
                "location": "San Francisco, CA",
                "isRemote": false,
                "department": "Design"
            },
            {
                "id": "",
                "title": "Blank id"
            }
        ]
    }"#;

    #[test]
    fn test_parse_job_board() {
        let response: JobBoardResponse = serde_json::from_str(FIXTURE).unwrap();
        let jobs = parse_job_board(Company::Ramp, response);
        assert_eq!(jobs.len(), 3);

        assert_eq!(jobs[0].location, "New York (Remote)");
        assert_eq!(jobs[0].department, "Engineering - Platform");
        assert_eq!(jobs[0].url, "https://jobs.ashbyhq.com/ramp/0f5a1c3e");
        assert!(jobs[0].posted_at.is_some());

        assert_eq!(jobs[1].location, "Remote");
        assert_eq!(jobs[1].department, "Sales");

        assert_eq!(jobs[2].location, "San Francisco, CA");
        assert_eq!(jobs[2].department, "Design");
    }

    #[tokio::test]
    async fn test_fetch_from_posting_api() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ramp")
            .with_status(200)
            .with_body(FIXTURE)
            .create_async()
            .await;

        let http = HttpClient::new(Duration::from_secs(5)).unwrap();
        let source = AshbySource::new(Company::Ramp, "ramp", http).with_api_base(server.url());
        let jobs = source.fetch().await.unwrap();

        mock.assert_async().await;
        assert_eq!(jobs.len(), 3);
        assert!(jobs.iter().all(|job| job.company == Company::Ramp));
    }
}
