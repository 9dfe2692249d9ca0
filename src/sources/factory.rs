//! Source handler factory
//!
//! Builds the company-keyed registry of job sources from the configured
//! company names.

use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use super::amazon::AmazonSource;
use super::ashby::AshbySource;
use super::google::GoogleSource;
use super::greenhouse::GreenhouseSource;
use super::uber::UberSource;
use super::workday::{self, WorkdaySource};
use super::JobSource;
use crate::models::Company;
use crate::utils::HttpClient;

pub struct SourceHandlerFactory;

impl SourceHandlerFactory {
    /// Create the source for a company
    pub fn create_handler(company: Company, http: &HttpClient) -> Arc<dyn JobSource> {
        let http = http.clone();
        match company {
            Company::Google => Arc::new(GoogleSource::new(http)),
            Company::Stripe => Arc::new(GreenhouseSource::new(company, "stripe", http)),
            Company::Anthropic => Arc::new(GreenhouseSource::new(company, "anthropic", http)),
            Company::Ramp => Arc::new(AshbySource::new(company, "ramp", http)),
            Company::PayPal => Arc::new(WorkdaySource::new(company, workday::PAYPAL, http)),
            Company::Salesforce => {
                Arc::new(WorkdaySource::new(company, workday::SALESFORCE, http))
            }
            Company::Uber => Arc::new(UberSource::new(http)),
            Company::Amazon => Arc::new(AmazonSource::new(http)),
        }
    }

    /// Sources for the configured companies, in config order.
    ///
    /// Unknown names are logged and skipped; a company listed twice gets one source.
    pub fn registry(companies: &[String], http: &HttpClient) -> Vec<Arc<dyn JobSource>> {
        let mut seen = Vec::new();
        let mut sources = Vec::new();

        for name in companies {
            let company = match Company::from_str(name.trim()) {
                Ok(company) => company,
                Err(_) => {
                    warn!("Unknown company '{}' in config, skipping", name);
                    continue;
                }
            };
            if seen.contains(&company) {
                debug!("Company {} listed more than once", company);
                continue;
            }
            seen.push(company);
            sources.push(Self::create_handler(company, http));
        }

        sources
    }
}
