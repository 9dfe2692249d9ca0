use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

use crate::errors::{StorageError, StorageResult};
use crate::models::{Company, Job, JobStats};

const INSERT_JOB: &str = r#"
    INSERT INTO jobs (company, external_id, title, location, url, department, posted_at, first_seen_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT (company, external_id) DO NOTHING
"#;

impl super::Database {
    pub async fn is_known(&self, company: Company, external_id: &str) -> StorageResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM jobs WHERE company = ? AND external_id = ?",
        )
        .bind(company.to_string())
        .bind(external_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Insert a job unless its key is already stored. Returns whether a row was added.
    pub async fn record_new(&self, job: &Job) -> StorageResult<bool> {
        let result = bind_job(sqlx::query(INSERT_JOB), job)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Keep only the jobs that were not stored yet and store them.
    ///
    /// Runs in one transaction that is committed before returning, so a job
    /// handed back here is never reported as new again, including duplicates
    /// inside `jobs` itself.
    pub async fn filter_new(&self, jobs: &[Job]) -> StorageResult<Vec<Job>> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let mut transaction = self.pool.begin().await?;
        let mut new_jobs = Vec::new();

        for job in jobs {
            let result = bind_job(sqlx::query(INSERT_JOB), job)
                .execute(&mut *transaction)
                .await?;
            if result.rows_affected() == 1 {
                new_jobs.push(job.clone());
            }
        }

        transaction.commit().await?;
        debug!("{} of {} jobs are new", new_jobs.len(), jobs.len());
        Ok(new_jobs)
    }

    pub async fn stats(&self) -> StorageResult<JobStats> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query("SELECT company, COUNT(*) AS count FROM jobs GROUP BY company")
            .fetch_all(&self.pool)
            .await?;
        let mut by_company: BTreeMap<String, i64> = BTreeMap::new();
        for row in rows {
            by_company.insert(row.try_get::<String, _>("company")?, row.try_get("count")?);
        }

        let most_recent: Option<String> = sqlx::query_scalar("SELECT MAX(first_seen_at) FROM jobs")
            .fetch_one(&self.pool)
            .await?;
        let most_recent = most_recent
            .map(|value| parse_timestamp("first_seen_at", &value))
            .transpose()?;

        Ok(JobStats {
            total,
            by_company,
            most_recent,
        })
    }

    /// Most recently seen jobs first, optionally restricted to one company
    pub async fn list(&self, company: Option<Company>, limit: Option<u32>) -> StorageResult<Vec<Job>> {
        let rows = sqlx::query(
            r#"
            SELECT company, external_id, title, location, url, department, posted_at, first_seen_at
            FROM jobs
            WHERE ?1 IS NULL OR company = ?1
            ORDER BY first_seen_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(company.map(|c| c.to_string()))
        .bind(limit.map(i64::from).unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(job_from_row).collect()
    }
}

fn bind_job<'q>(
    query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    job: &'q Job,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(job.company.to_string())
        .bind(job.external_id.as_str())
        .bind(job.title.as_str())
        .bind(job.location.as_str())
        .bind(job.url.as_str())
        .bind(job.department.as_str())
        .bind(job.posted_at.as_ref().map(format_timestamp))
        .bind(format_timestamp(&job.first_seen_at))
}

/// Fixed-width RFC3339 so that text ordering matches time ordering
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(field: &str, value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::decode(field, value))
}

fn job_from_row(row: &SqliteRow) -> StorageResult<Job> {
    let company: String = row.try_get("company")?;
    let company =
        Company::from_str(&company).map_err(|_| StorageError::decode("company", company.clone()))?;

    let posted_at: Option<String> = row.try_get("posted_at")?;
    let first_seen_at: String = row.try_get("first_seen_at")?;

    Ok(Job {
        company,
        external_id: row.try_get("external_id")?,
        title: row.try_get("title")?,
        location: row.try_get("location")?,
        url: row.try_get("url")?,
        department: row.try_get("department")?,
        posted_at: posted_at
            .map(|value| parse_timestamp("posted_at", &value))
            .transpose()?,
        first_seen_at: parse_timestamp("first_seen_at", &first_seen_at)?,
    })
}
