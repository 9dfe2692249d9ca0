//! Job filter service
//!
//! Keyword and location filtering for fetched jobs. Both criteria are
//! case-insensitive substring checks; an empty criterion list matches
//! everything.
//!
//! Locations are stored as the source reported them. A location needle
//! matches either that text or its normalized form, so "new york" finds
//! "NYC" while "d.c." still finds "Washington, D.C.".

use crate::config::FiltersConfig;
use crate::models::Job;
use crate::utils::normalize_location;

/// Precompiled form of [`FiltersConfig`] with lowercased needles
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    keywords: Vec<String>,
    locations: Vec<String>,
}

impl JobFilter {
    pub fn new(filters: &FiltersConfig) -> Self {
        Self {
            keywords: lowercase_needles(&filters.keywords),
            locations: lowercase_needles(&filters.locations),
        }
    }

    /// Title contains any keyword AND location contains any location
    pub fn matches(&self, job: &Job) -> bool {
        contains_any(&job.title, &self.keywords) && self.location_matches(&job.location)
    }

    fn location_matches(&self, location: &str) -> bool {
        contains_any(location, &self.locations)
            || contains_any(&normalize_location(location), &self.locations)
    }

    pub fn apply(&self, jobs: Vec<Job>) -> Vec<Job> {
        jobs.into_iter().filter(|job| self.matches(job)).collect()
    }

    pub fn is_match_all(&self) -> bool {
        self.keywords.is_empty() && self.locations.is_empty()
    }
}

/// One-off check without building a [`JobFilter`]
pub fn matches(job: &Job, filters: &FiltersConfig) -> bool {
    JobFilter::new(filters).matches(job)
}

fn lowercase_needles(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    if needles.is_empty() {
        return true;
    }
    let haystack = haystack.to_lowercase();
    needles.iter().any(|needle| haystack.contains(needle.as_str()))
}
