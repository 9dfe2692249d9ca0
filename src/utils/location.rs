//! Location normalization
//!
//! Every careers API spells locations differently ("US-Remote-TX (National)",
//! "NYC", "London, United Kingdom"). Sources run their raw location through
//! [`normalize_location`] so that the location filter sees one vocabulary.

use regex::{NoExpand, Regex};
use std::sync::OnceLock;

pub const UNKNOWN_LOCATION: &str = "Unknown";
pub const REMOTE_LOCATION: &str = "Remote";

const REMOTE_MARKERS: &[&str] = &["remote", "work from home", "wfh", "distributed"];

/// (alias, canonical, case_sensitive). Short abbreviations only match in
/// upper case so that "La Jolla" is not read as Los Angeles.
const CITY_ALIASES: &[(&str, &str, bool)] = &[
    ("SF", "San Francisco", true),
    ("san fran", "San Francisco", false),
    ("NYC", "New York", true),
    ("LA", "Los Angeles", true),
    ("DC", "Washington DC", true),
    ("washington, d.c.", "Washington DC", false),
    ("washington d.c.", "Washington DC", false),
    ("london, united kingdom", "London, UK", false),
    ("london, uk", "London, UK", false),
    ("bangalore", "Bengaluru", false),
    ("bombay", "Mumbai", false),
];

const COUNTRY_ALIASES: &[(&str, &str, bool)] = &[
    ("united states of america", "US", false),
    ("united states", "US", false),
    ("usa", "US", false),
    ("united kingdom", "UK", false),
    ("great britain", "UK", false),
    ("deutschland", "Germany", false),
    ("brasil", "Brazil", false),
];

const STATE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("california", "CA"),
    ("new york", "NY"),
    ("texas", "TX"),
    ("washington", "WA"),
    ("colorado", "CO"),
    ("oregon", "OR"),
    ("massachusetts", "MA"),
    ("illinois", "IL"),
    ("georgia", "GA"),
    ("florida", "FL"),
    ("pennsylvania", "PA"),
    ("british columbia", "BC"),
    ("ontario", "ON"),
];

struct Alias {
    regex: Regex,
    replacement: &'static str,
}

struct Cleaners {
    remote_suffix: Regex,
    locations_suffix: Regex,
    country_remote: Regex,
    country_prefix: Regex,
    remote_national: Regex,
    national: Regex,
    headquarters: Regex,
}

fn build_aliases(table: &[(&'static str, &'static str, bool)]) -> Vec<Alias> {
    table
        .iter()
        .map(|(alias, replacement, case_sensitive)| {
            // A trailing \b after punctuation ("d.c.") would never match at end of input
            let tail = if alias.ends_with(|c: char| c.is_alphanumeric()) {
                r"\b"
            } else {
                ""
            };
            let flags = if *case_sensitive { "" } else { "(?i)" };
            let pattern = format!(r"{flags}\b{}{tail}", regex::escape(alias));
            Alias {
                regex: Regex::new(&pattern).expect("static alias pattern"),
                replacement: *replacement,
            }
        })
        .collect()
}

fn city_aliases() -> &'static [Alias] {
    static ALIASES: OnceLock<Vec<Alias>> = OnceLock::new();
    ALIASES.get_or_init(|| build_aliases(CITY_ALIASES))
}

fn country_aliases() -> &'static [Alias] {
    static ALIASES: OnceLock<Vec<Alias>> = OnceLock::new();
    ALIASES.get_or_init(|| build_aliases(COUNTRY_ALIASES))
}

fn cleaners() -> &'static Cleaners {
    static CLEANERS: OnceLock<Cleaners> = OnceLock::new();
    CLEANERS.get_or_init(|| Cleaners {
        remote_suffix: Regex::new(r"(?i)\s*\(remote\)\s*").expect("static pattern"),
        locations_suffix: Regex::new(r"(?i)\s+locations?\s*$").expect("static pattern"),
        country_remote: Regex::new(r"^[A-Z]{2}-Remote-(.+)$").expect("static pattern"),
        country_prefix: Regex::new(r"^[A-Z]{2}-").expect("static pattern"),
        remote_national: Regex::new(r"Remote-([A-Z]{2})\s*\(National\)").expect("static pattern"),
        national: Regex::new(r"(?i)\s*\(National\)\s*").expect("static pattern"),
        headquarters: Regex::new(r"(?i)\s*\(HQ\)\s*").expect("static pattern"),
    })
}

/// Whether a location string describes remote work
pub fn is_remote(location: &str) -> bool {
    let lower = location.to_lowercase();
    REMOTE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Normalize a raw location to "City, Region", "Remote" or "City (Remote)".
pub fn normalize_location(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == UNKNOWN_LOCATION {
        return UNKNOWN_LOCATION.to_string();
    }

    let remote = is_remote(trimmed);
    let mut location = clean_location(trimmed);
    location = apply_aliases(&location, city_aliases());
    location = apply_aliases(&location, country_aliases());

    if remote && !location.to_lowercase().contains("remote") {
        location = if location.is_empty() || location == UNKNOWN_LOCATION {
            REMOTE_LOCATION.to_string()
        } else {
            format!("{location} ({REMOTE_LOCATION})")
        };
    }

    if location.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        location
    }
}

/// Render a structured location the way sources with city/region/country objects need it.
///
/// US states are abbreviated, and the country is only appended when it adds
/// information (non-US and fewer than two parts so far).
pub fn format_structured_location(
    city: Option<&str>,
    region: Option<&str>,
    country: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    let city = city.map(str::trim).filter(|c| !c.is_empty());
    let region = region.map(str::trim).filter(|r| !r.is_empty());
    let country = country.map(str::trim).filter(|c| !c.is_empty());

    if let Some(city) = city {
        parts.push(city.to_string());
    }
    if let Some(region) = region.filter(|r| Some(*r) != city) {
        let abbreviated = STATE_ABBREVIATIONS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(region))
            .map(|(_, abbr)| abbr.to_string())
            .unwrap_or_else(|| region.to_string());
        parts.push(abbreviated);
    }
    if let Some(country) = country {
        if !matches!(country, "United States" | "USA") && parts.len() < 2 {
            parts.push(country.to_string());
        }
    }

    if parts.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        parts.join(", ")
    }
}

fn clean_location(location: &str) -> String {
    let c = cleaners();
    let mut location = c.remote_suffix.replace_all(location, " ").into_owned();
    location = c.locations_suffix.replace(&location, "").into_owned();

    let remote_region = c
        .country_remote
        .captures(&location)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());
    if let Some(region) = remote_region {
        location = region;
    }

    location = c.country_prefix.replace(&location, "").into_owned();
    location = c.remote_national.replace_all(&location, "$1").into_owned();
    location = c.national.replace_all(&location, " ").into_owned();

    if location.contains(", US-") || location.contains(", IE-") {
        location = location
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
    }

    location = c.headquarters.replace_all(&location, " ").into_owned();
    location.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn apply_aliases(location: &str, aliases: &[Alias]) -> String {
    aliases.iter().fold(location.to_string(), |acc, alias| {
        alias
            .regex
            .replace_all(&acc, NoExpand(alias.replacement))
            .into_owned()
    })
}
