//! Plain-text terminal output
//!
//! Rendering is split from writing so the text can be checked in tests;
//! [`TerminalNotifier`] only writes what the `render_*` functions produce.

use async_trait::async_trait;
use std::fmt::Write as _;
use std::io::Write;

use super::Notifier;
use crate::errors::NotifyError;
use crate::ingestor::RunReport;
use crate::models::{group_by_company, Job, JobStats};
use crate::utils::DateTimeParser;

const RULE_WIDTH: usize = 64;

#[derive(Debug, Default, Clone)]
pub struct TerminalNotifier;

impl TerminalNotifier {
    pub fn new() -> Self {
        Self
    }

    pub fn info(&self, message: &str) {
        println!("{message}");
    }

    pub fn success(&self, message: &str) {
        println!("✓ {message}");
    }

    pub fn error(&self, message: &str) {
        eprintln!("Error: {message}");
    }

    pub fn no_new_jobs(&self) {
        print!("{}", render_no_new_jobs());
    }

    pub fn show_stats(&self, stats: &JobStats) {
        print!("{}", render_stats(stats));
    }

    pub fn show_listing(&self, jobs: &[Job]) {
        print!("{}", render_listing(jobs));
    }

    pub fn show_summary(&self, report: &RunReport) {
        print!("{}", render_summary(report));
    }
}

#[async_trait]
impl Notifier for TerminalNotifier {
    fn name(&self) -> &str {
        "terminal"
    }

    async fn notify(&self, jobs: &[Job]) -> Result<(), NotifyError> {
        let text = render_jobs(jobs);
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

fn rule(c: char) -> String {
    std::iter::repeat(c).take(RULE_WIDTH).collect()
}

fn panel(out: &mut String, text: &str) {
    let _ = writeln!(out, "{}", rule('='));
    let _ = writeln!(out, " {text}");
    let _ = writeln!(out, "{}", rule('='));
}

/// New jobs grouped by company, with title, location, department and link
pub fn render_jobs(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return render_no_new_jobs();
    }

    let mut out = String::new();
    out.push('\n');
    panel(&mut out, &format!("Found {} new job(s)!", jobs.len()));

    for (company, company_jobs) in group_by_company(jobs) {
        let _ = writeln!(out, "\n{} ({} jobs)", company, company_jobs.len());
        let _ = writeln!(out, "{}", rule('-'));
        for job in company_jobs {
            let _ = writeln!(out, "  {}", job.title);
            let _ = writeln!(out, "    Location:   {}", job.location);
            if !job.department.is_empty() {
                let _ = writeln!(out, "    Department: {}", job.department);
            }
            let _ = writeln!(out, "    Link:       {}", job.url);
        }
    }
    out.push('\n');
    out
}

pub fn render_no_new_jobs() -> String {
    let mut out = String::new();
    panel(&mut out, "No new jobs found");
    out
}

/// Job counts per company, alphabetical, with a total row
pub fn render_stats(stats: &JobStats) -> String {
    let name_width = stats
        .by_company
        .keys()
        .map(String::len)
        .chain(std::iter::once("Company".len()))
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "\nJob Database Statistics");
    let _ = writeln!(out, "{:<name_width$}  {:>6}", "Company", "Jobs");
    let _ = writeln!(out, "{}", "-".repeat(name_width + 8));
    for (company, count) in &stats.by_company {
        let _ = writeln!(out, "{:<name_width$}  {:>6}", company, count);
    }
    let _ = writeln!(out, "{}", "-".repeat(name_width + 8));
    let _ = writeln!(out, "{:<name_width$}  {:>6}", "Total", stats.total);
    if let Some(most_recent) = &stats.most_recent {
        let _ = writeln!(
            out,
            "Last new job seen: {}",
            DateTimeParser::format_for_display(most_recent)
        );
    }
    out.push('\n');
    out
}

/// Stored jobs for the `list` command, newest first
pub fn render_listing(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return "No jobs stored yet\n".to_string();
    }

    let mut out = String::new();
    for job in jobs {
        let _ = writeln!(
            out,
            "[{}] {} | {} | {}",
            DateTimeParser::format_for_display(&job.first_seen_at),
            job.company,
            job.title,
            job.location
        );
        let _ = writeln!(out, "    {}", job.url);
    }
    out
}

/// End-of-run summary, including per-company failures
pub fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Run complete: {} fetched, {} matched filters, {} new",
        report.total_fetched, report.total_matched, report.total_new
    );
    for error in &report.errors {
        let _ = writeln!(out, "  fetch failed: {error}");
    }
    for failure in &report.notify_failures {
        let _ = writeln!(
            out,
            "  {} notification failed for {}: {}",
            failure.notifier, failure.company, failure.message
        );
    }
    out
}
