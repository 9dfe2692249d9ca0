//! Job sources
//!
//! One [`JobSource`] implementation per hiring platform. A source is
//! parametrized by company (board name, Workday site, ...) and turns the
//! platform's listing payload into [`Job`] values. The set of enabled
//! sources is built by [`SourceHandlerFactory`].
//!
//! Sources are lenient per listing and strict per response: a listing that
//! lacks its identifier is skipped with a warning, while a response whose
//! top-level shape is wrong fails the whole fetch with a [`FetchError`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::errors::FetchError;
use crate::models::{Company, Job};

pub mod amazon;
pub mod ashby;
pub mod factory;
pub mod google;
pub mod greenhouse;
pub mod uber;
pub mod workday;

pub use factory::SourceHandlerFactory;

/// Upper bound on listings collected per company and run
pub const MAX_LISTINGS: usize = 5000;

/// Fetches the current postings of one company
#[async_trait]
pub trait JobSource: Send + Sync {
    fn company(&self) -> Company;

    /// Retrieve and normalize all current listings
    async fn fetch(&self) -> Result<Vec<Job>, FetchError>;
}

/// Identifier that some APIs send as a number and others as a string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum FlexibleId {
    Text(String),
    Number(i64),
}

impl FlexibleId {
    /// `None` for blank identifiers
    pub(crate) fn into_non_empty(self) -> Option<String> {
        let id = match self {
            FlexibleId::Text(text) => text.trim().to_string(),
            FlexibleId::Number(n) => n.to_string(),
        };
        (!id.is_empty()).then_some(id)
    }
}

/// A field that is either a single value or a list of values
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// Decode raw listings one by one, skipping the ones that do not fit.
///
/// `to_job` returns `None` when a listing decoded but carries no usable
/// identifier.
pub(crate) fn decode_listings<T, F>(company: Company, listings: Vec<Value>, mut to_job: F) -> Vec<Job>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Option<Job>,
{
    listings
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<T>(raw) {
            Ok(listing) => {
                let job = to_job(listing);
                if job.is_none() {
                    warn!("Skipping {} listing without an identifier", company);
                }
                job
            }
            Err(e) => {
                warn!("Skipping malformed {} listing: {}", company, e);
                None
            }
        })
        .collect()
}

/// Title fallback shared by all platforms
pub(crate) fn title_or_unknown(title: Option<String>) -> String {
    title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Whether a paged fetch has reached the per-company cap
pub(crate) fn reached_cap(company: Company, collected: usize) -> bool {
    if collected >= MAX_LISTINGS {
        warn!(
            "Hit safety limit of {} listings for {}, stopping pagination",
            MAX_LISTINGS, company
        );
        return true;
    }
    false
}
