//! End-to-end runs over stub sources, an in-memory store and recording notifiers

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use job_finder::config::FiltersConfig;
use job_finder::database::Database;
use job_finder::errors::{AppError, FetchError, NotifyError, SourceError};
use job_finder::ingestor::{IngestorService, RunTally, SchedulerService};
use job_finder::models::{Company, Job};
use job_finder::notifiers::Notifier;
use job_finder::services::JobFilter;
use job_finder::sources::greenhouse::{parse_board, BoardResponse};
use job_finder::sources::JobSource;

struct StubSource {
    company: Company,
    jobs: Vec<Job>,
    fail: bool,
    calls: AtomicUsize,
    /// Notified when the fetch count reaches the given call number
    signal: Option<(usize, Arc<Notify>)>,
}

impl StubSource {
    fn new(company: Company, jobs: Vec<Job>) -> Self {
        Self {
            company,
            jobs,
            fail: false,
            calls: AtomicUsize::new(0),
            signal: None,
        }
    }

    fn failing(company: Company) -> Self {
        Self {
            fail: true,
            ..Self::new(company, Vec::new())
        }
    }

    fn signalling(company: Company, jobs: Vec<Job>, at: usize, notify: Arc<Notify>) -> Self {
        Self {
            signal: Some((at, notify)),
            ..Self::new(company, jobs)
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobSource for StubSource {
    fn company(&self) -> Company {
        self.company
    }

    async fn fetch(&self) -> Result<Vec<Job>, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, notify)) = &self.signal {
            if call == *at {
                notify.notify_one();
            }
        }
        if self.fail {
            return Err(SourceError::timeout("https://careers.example.com/api").for_company(self.company));
        }
        Ok(self.jobs.clone())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    batches: Mutex<Vec<Vec<Job>>>,
}

impl RecordingNotifier {
    fn batches(&self) -> Vec<Vec<Job>> {
        self.batches.lock().unwrap().clone()
    }

    fn all_jobs(&self) -> Vec<Job> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, jobs: &[Job]) -> Result<(), NotifyError> {
        self.batches.lock().unwrap().push(jobs.to_vec());
        Ok(())
    }
}

struct BrokenNotifier;

#[async_trait]
impl Notifier for BrokenNotifier {
    fn name(&self) -> &str {
        "broken"
    }

    async fn notify(&self, _jobs: &[Job]) -> Result<(), NotifyError> {
        Err(NotifyError::rejected("broken", 500))
    }
}

fn job(company: Company, id: &str, title: &str, location: &str) -> Job {
    Job::new(company, id, title, location, format!("https://careers.example.com/{id}"))
}

async fn memory_db() -> Database {
    let db = Database::open_in_memory().await.unwrap();
    db.migrate().await.unwrap();
    db
}

fn match_all() -> JobFilter {
    JobFilter::new(&FiltersConfig::default())
}

fn as_sources(sources: &[Arc<StubSource>]) -> Vec<Arc<dyn JobSource>> {
    sources
        .iter()
        .map(|s| s.clone() as Arc<dyn JobSource>)
        .collect()
}

#[tokio::test]
async fn test_new_jobs_are_stored_and_notified_once() {
    let db = memory_db().await;
    let recorder = Arc::new(RecordingNotifier::default());
    let source = Arc::new(StubSource::new(
        Company::Stripe,
        vec![
            job(Company::Stripe, "1", "Backend Engineer", "Remote"),
            job(Company::Stripe, "2", "Frontend Engineer", "New York"),
        ],
    ));
    let ingestor = IngestorService::new(
        as_sources(&[source.clone()]),
        match_all(),
        db.clone(),
        vec![recorder.clone() as Arc<dyn Notifier>],
    );

    let report = ingestor.run_once().await.unwrap();
    assert_eq!(report.total_fetched, 2);
    assert_eq!(report.total_matched, 2);
    assert_eq!(report.total_new, 2);
    assert!(report.is_clean());

    let stored = db.list(Some(Company::Stripe), None).await.unwrap();
    assert_eq!(stored.len(), 2);

    let notified = recorder.all_jobs();
    assert_eq!(notified.len(), 2);
    let mut ids: Vec<_> = notified.iter().map(|j| j.external_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["1", "2"]);

    // Second run sees the same postings: nothing new, notifier not invoked again
    let report = ingestor.run_once().await.unwrap();
    assert_eq!(report.total_fetched, 2);
    assert_eq!(report.total_new, 0);
    assert_eq!(recorder.batches().len(), 1);
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_failing_company_does_not_stop_the_run() {
    let db = memory_db().await;
    let recorder = Arc::new(RecordingNotifier::default());
    let sources = [
        Arc::new(StubSource::failing(Company::Uber)),
        Arc::new(StubSource::new(
            Company::Ramp,
            vec![job(Company::Ramp, "r1", "Software Engineer", "New York")],
        )),
    ];
    let ingestor = IngestorService::new(
        as_sources(&sources),
        match_all(),
        db.clone(),
        vec![recorder.clone() as Arc<dyn Notifier>],
    );

    let report = ingestor.run_once().await.unwrap();
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].company, Company::Uber);
    assert!(matches!(report.errors[0].cause, SourceError::Timeout { .. }));
    assert_eq!(report.total_new, 1);
    assert_eq!(recorder.all_jobs()[0].company, Company::Ramp);
}

#[tokio::test]
async fn test_filters_apply_before_dedup() {
    let db = memory_db().await;
    let recorder = Arc::new(RecordingNotifier::default());
    let filters = FiltersConfig {
        keywords: vec!["engineer".to_string()],
        locations: vec!["remote".to_string()],
    };
    let source = Arc::new(StubSource::new(
        Company::Anthropic,
        vec![
            job(Company::Anthropic, "a", "Research Engineer", "Remote"),
            job(Company::Anthropic, "b", "Research Engineer", "London, UK"),
            job(Company::Anthropic, "c", "Recruiter", "Remote"),
        ],
    ));
    let ingestor = IngestorService::new(
        as_sources(&[source]),
        JobFilter::new(&filters),
        db.clone(),
        vec![recorder.clone() as Arc<dyn Notifier>],
    );

    let report = ingestor.run_once().await.unwrap();
    assert_eq!(report.total_fetched, 3);
    assert_eq!(report.total_matched, 1);
    assert_eq!(report.total_new, 1);

    // Postings that did not match are not remembered
    assert!(!db.is_known(Company::Anthropic, "b").await.unwrap());
    assert!(db.is_known(Company::Anthropic, "a").await.unwrap());
}

#[tokio::test]
async fn test_location_filter_sees_upstream_text() {
    let board: BoardResponse = serde_json::from_value(serde_json::json!({
        "jobs": [
            {"id": 1, "title": "Software Engineer", "location": {"name": "Austin, United States"}},
            {"id": 2, "title": "Software Engineer", "location": {"name": "Dublin, US-NY"}},
            {"id": 3, "title": "Software Engineer", "location": {"name": "Washington, D.C."}},
            {"id": 4, "title": "Software Engineer", "location": {"name": "London, UK"}}
        ]
    }))
    .unwrap();
    let source = Arc::new(StubSource::new(
        Company::Stripe,
        parse_board(Company::Stripe, board),
    ));
    let filters = FiltersConfig {
        keywords: Vec::new(),
        locations: vec!["united states".to_string(), "ny".to_string(), "d.c.".to_string()],
    };
    let db = memory_db().await;
    let ingestor = IngestorService::new(as_sources(&[source]), JobFilter::new(&filters), db.clone(), Vec::new());

    let report = ingestor.run_once().await.unwrap();
    assert_eq!(report.total_fetched, 4);
    assert_eq!(report.total_matched, 3);
    assert_eq!(report.total_new, 3);

    let mut locations: Vec<String> = db
        .list(Some(Company::Stripe), None)
        .await
        .unwrap()
        .into_iter()
        .map(|job| job.location)
        .collect();
    locations.sort();
    assert_eq!(
        locations,
        vec!["Austin, United States", "Dublin, US-NY", "Washington, D.C."]
    );
}

#[tokio::test]
async fn test_notifier_failure_is_reported_and_jobs_stay_stored() {
    let db = memory_db().await;
    let recorder = Arc::new(RecordingNotifier::default());
    let source = Arc::new(StubSource::new(
        Company::Google,
        vec![job(Company::Google, "g1", "SRE", "Zurich")],
    ));
    let ingestor = IngestorService::new(
        as_sources(&[source]),
        match_all(),
        db.clone(),
        vec![
            Arc::new(BrokenNotifier) as Arc<dyn Notifier>,
            recorder.clone() as Arc<dyn Notifier>,
        ],
    );

    let report = ingestor.run_once().await.unwrap();
    assert_eq!(report.total_new, 1);
    assert_eq!(report.notify_failures.len(), 1);
    assert_eq!(report.notify_failures[0].notifier, "broken");
    assert_eq!(report.notify_failures[0].company, Company::Google);
    assert_eq!(recorder.all_jobs().len(), 1);

    let report = ingestor.run_once().await.unwrap();
    assert_eq!(report.total_new, 0);
    assert!(report.notify_failures.is_empty());
}

#[tokio::test]
async fn test_duplicate_postings_within_a_run_count_once() {
    let db = memory_db().await;
    let recorder = Arc::new(RecordingNotifier::default());
    let posting = job(Company::Amazon, "2591234", "SDE II", "Seattle");
    let source = Arc::new(StubSource::new(
        Company::Amazon,
        vec![posting.clone(), posting.clone()],
    ));
    let ingestor = IngestorService::new(
        as_sources(&[source]),
        match_all(),
        db,
        vec![recorder.clone() as Arc<dyn Notifier>],
    );

    let report = ingestor.run_once().await.unwrap();
    assert_eq!(report.total_fetched, 2);
    assert_eq!(report.total_new, 1);
    assert_eq!(recorder.all_jobs(), vec![posting]);
}

#[tokio::test]
async fn test_storage_failure_aborts_the_run() {
    let db = memory_db().await;
    let source = Arc::new(StubSource::new(
        Company::Stripe,
        vec![job(Company::Stripe, "1", "Engineer", "Remote")],
    ));
    let ingestor = IngestorService::new(as_sources(&[source]), match_all(), db.clone(), Vec::new());

    db.pool().close().await;
    let err = ingestor.run_once().await.unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
}

#[tokio::test]
async fn test_scheduler_runs_until_shutdown() {
    let shutdown = Arc::new(Notify::new());
    let source = Arc::new(StubSource::signalling(
        Company::Ramp,
        Vec::new(),
        3,
        shutdown.clone(),
    ));
    let ingestor = IngestorService::new(as_sources(&[source.clone()]), match_all(), memory_db().await, Vec::new());
    let scheduler = SchedulerService::new(ingestor, Duration::from_millis(10));

    let runs = tokio::time::timeout(
        Duration::from_secs(10),
        scheduler.run_until(shutdown.notified()),
    )
    .await
    .expect("scheduler should stop after shutdown");

    assert_eq!(source.calls(), 3);
    assert_eq!(runs, RunTally { succeeded: 3, failed: 0 });
}

#[tokio::test]
async fn test_shutdown_interrupts_the_sleep() {
    let shutdown = Arc::new(Notify::new());
    let source = Arc::new(StubSource::signalling(
        Company::Ramp,
        Vec::new(),
        1,
        shutdown.clone(),
    ));
    let ingestor = IngestorService::new(as_sources(&[source.clone()]), match_all(), memory_db().await, Vec::new());
    let scheduler = SchedulerService::new(ingestor, Duration::from_secs(3600));

    let runs = tokio::time::timeout(
        Duration::from_secs(10),
        scheduler.run_until(shutdown.notified()),
    )
    .await
    .expect("shutdown should cut the hour-long sleep short");

    assert_eq!(runs.succeeded, 1);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_scheduler_keeps_going_after_storage_errors() {
    let shutdown = Arc::new(Notify::new());
    let db = memory_db().await;
    let source = Arc::new(StubSource::signalling(
        Company::Stripe,
        vec![job(Company::Stripe, "1", "Engineer", "Remote")],
        3,
        shutdown.clone(),
    ));
    let ingestor = IngestorService::new(as_sources(&[source.clone()]), match_all(), db.clone(), Vec::new());
    let scheduler = SchedulerService::new(ingestor, Duration::from_millis(10));
    db.pool().close().await;

    let runs = tokio::time::timeout(
        Duration::from_secs(10),
        scheduler.run_until(shutdown.notified()),
    )
    .await
    .expect("scheduler should stop after shutdown");

    assert_eq!(source.calls(), 3);
    assert_eq!(runs.succeeded, 0);
    assert!(runs.failed >= 2);
}
