use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Companies with a registered job source.
///
/// Parsed case-insensitively from config and CLI input (`"paypal"`),
/// displayed and persisted by canonical name (`"PayPal"`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Company {
    Google,
    Stripe,
    PayPal,
    Uber,
    Ramp,
    Anthropic,
    Amazon,
    Salesforce,
}

impl Company {
    /// Lowercase identifier used in config files
    pub fn key(&self) -> String {
        self.to_string().to_lowercase()
    }

    pub fn all() -> Vec<Company> {
        Company::iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub company: Company,
    pub external_id: String, // stable per company, not globally unique
    pub title: String,
    pub location: String,
    pub url: String,
    pub department: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub first_seen_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        company: Company,
        external_id: impl Into<String>,
        title: impl Into<String>,
        location: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            company,
            external_id: external_id.into(),
            title: title.into(),
            location: location.into(),
            url: url.into(),
            department: String::new(),
            posted_at: None,
            first_seen_at: Utc::now(),
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn with_posted_at(mut self, posted_at: Option<DateTime<Utc>>) -> Self {
        self.posted_at = posted_at;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobStats {
    pub total: i64,
    pub by_company: BTreeMap<String, i64>,
    pub most_recent: Option<DateTime<Utc>>,
}

/// Groups jobs by company, keeping first-appearance order of companies.
pub fn group_by_company(jobs: &[Job]) -> Vec<(Company, Vec<&Job>)> {
    let mut groups: Vec<(Company, Vec<&Job>)> = Vec::new();
    for job in jobs {
        match groups.iter_mut().find(|(company, _)| *company == job.company) {
            Some((_, bucket)) => bucket.push(job),
            None => groups.push((job.company, vec![job])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_company_parse_case_insensitive() {
        assert_eq!(Company::from_str("paypal").unwrap(), Company::PayPal);
        assert_eq!(Company::from_str("PAYPAL").unwrap(), Company::PayPal);
        assert_eq!(Company::from_str("Google").unwrap(), Company::Google);
        assert!(Company::from_str("openai").is_err());
    }

    #[test]
    fn test_company_display_and_key() {
        assert_eq!(Company::PayPal.to_string(), "PayPal");
        assert_eq!(Company::PayPal.key(), "paypal");
        for company in Company::all() {
            assert_eq!(Company::from_str(&company.key()).unwrap(), company);
        }
    }

    #[test]
    fn test_group_by_company_preserves_order() {
        let jobs = vec![
            Job::new(Company::Ramp, "1", "A", "NY", "u1"),
            Job::new(Company::Stripe, "2", "B", "SF", "u2"),
            Job::new(Company::Ramp, "3", "C", "NY", "u3"),
        ];
        let groups = group_by_company(&jobs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, Company::Ramp);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, Company::Stripe);
    }
}
