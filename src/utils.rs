//! Utility modules for Job Finder
//!
//! - `utils::datetime` for parsing upstream posting dates
//! - `utils::http_client` for the shared, timeout-bounded HTTP client
//! - `utils::location` for location normalization

pub mod datetime;
pub mod http_client;
pub mod location;

pub use datetime::DateTimeParser;
pub use http_client::HttpClient;
pub use location::normalize_location;

/// Last non-empty path segment, e.g. `/job/Austin/Engineer_R123` -> `Engineer_R123`
pub fn last_path_segment(path: &str) -> Option<&str> {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// Join non-empty trimmed parts with a separator
pub fn join_non_empty<'a, I>(parts: I, separator: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
