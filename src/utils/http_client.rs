use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::errors::{AppError, AppResult, SourceError, SourceResult};

pub const USER_AGENT: &str = concat!("JobFinder/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for careers APIs and webhooks
///
/// Every request carries the configured total timeout, so a hung upstream
/// delays the run by at most that long.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Get underlying reqwest client for custom operations
    pub fn inner_client(&self) -> &Client {
        &self.client
    }

    /// GET a URL and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> SourceResult<T> {
        debug!("GET {}", url);
        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .query(query);
        Self::send(request, url).await
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post_json<B, T>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&'static str, &'static str)],
    ) -> SourceResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", url);
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            header_map.insert(
                HeaderName::from_static(*name),
                HeaderValue::from_static(*value),
            );
        }

        let request = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .headers(header_map)
            .json(body);
        Self::send(request, url).await
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder, url: &str) -> SourceResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| SourceError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::from_reqwest(url, e))?;
        serde_json::from_str(&body).map_err(|e| SourceError::decode(url, e.to_string()))
    }
}
