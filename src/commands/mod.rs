//! Operator-facing operations
//!
//! Thin orchestration over the store, dispatcher, and provider client. Each
//! function maps to one CLI subcommand and returns plain data the CLI layer
//! renders.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{GenerationJob, JobStatus};
use crate::provider::{ProviderClient, ProviderError};
use crate::scheduler::{backdate, Dispatcher, PostingWindow, RunOutcome, SchedulerError};
use crate::storage::{JobStore, StoreResult};

/// One-shot flag preventing repeated backdate bulk scheduling
const BACKDATE_FLAG: &str = "backdate_scheduled";

/// Schedule a single generation job
///
/// Defaults: the configured prompt template, due immediately.
pub fn schedule_single(
    store: &dyn JobStore,
    config: &Config,
    prompt: Option<&str>,
    at: Option<NaiveDateTime>,
) -> StoreResult<Uuid> {
    let prompt = prompt.unwrap_or(&config.schedule.prompt_template);
    let at = at.unwrap_or_else(|| Local::now().naive_local());

    let id = store.schedule(prompt, at)?;
    tracing::info!(job_id = %id, schedule_at = %at, "Job scheduled");
    Ok(id)
}

/// Schedule the configured backdate range as individual jobs
///
/// Idempotent per store: a one-shot flag records that bulk scheduling has
/// run, so activating twice never duplicates the history. Returns the
/// number of jobs created (zero on a repeat call).
pub fn schedule_bulk(store: &dyn JobStore, config: &Config) -> Result<usize, SchedulerError> {
    let (start_date, end_date) = config
        .backdate_range()
        .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;
    let (start_time, end_time) = config
        .posting_window()
        .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;
    let window = PostingWindow::new(start_time, end_time)?;

    // Parameters are validated before the flag is consumed, so a rejected
    // range can be corrected and retried
    if !store.set_flag(BACKDATE_FLAG)? {
        tracing::info!("Backdate scheduling already performed, skipping");
        return Ok(0);
    }

    let now = Local::now().naive_local();
    let slots = backdate::plan_slots(
        start_date,
        end_date,
        window,
        config.schedule.posts_per_day,
        now,
    );

    for slot in &slots {
        store.schedule(&config.schedule.prompt_template, *slot)?;
    }

    tracing::info!(
        jobs = slots.len(),
        start = %start_date,
        end = %end_date,
        "Backdate jobs scheduled"
    );
    Ok(slots.len())
}

/// Run one dispatcher batch immediately, ignoring the posting window
pub async fn force_run_now(dispatcher: &Dispatcher) -> Result<RunOutcome, SchedulerError> {
    dispatcher.run_forced(Local::now()).await
}

/// Status report returned by [`get_status`]
#[derive(Debug)]
pub struct StatusReport {
    pub pending: Vec<GenerationJob>,
    pub recent: Vec<GenerationJob>,
    pub completed_today: u32,
}

/// Summarize the job queue: pending jobs, recent activity, today's count
pub fn get_status(store: &dyn JobStore, limit: usize) -> StoreResult<StatusReport> {
    let today = Local::now().date_naive();

    Ok(StatusReport {
        pending: store.list(Some(JobStatus::Pending), limit)?,
        recent: store.list(None, limit)?,
        completed_today: store.count_completed_today(today)?,
    })
}

/// Delete a job by id; returns whether it existed
pub fn delete_job(store: &dyn JobStore, id: Uuid) -> StoreResult<bool> {
    let removed = store.delete(id)?;
    if removed {
        tracing::info!(job_id = %id, "Job deleted");
    }
    Ok(removed)
}

/// Verify provider credentials with a canned prompt
///
/// Returns the provider's model catalog on success.
pub async fn test_provider_connection(
    provider: Arc<ProviderClient>,
    config: &Config,
) -> Result<Vec<&'static str>, ProviderError> {
    provider
        .test_connection(&config.provider.name, &config.provider.api_key)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteJobStore;
    use chrono::NaiveDate;

    fn backdated_config() -> Config {
        let mut config = Config::default();
        config.backdate.enabled = true;
        config.backdate.start_date = "2025-05-05".to_string();
        config.backdate.end_date = "2025-05-09".to_string();
        config.schedule.posts_per_day = 2;
        config
    }

    #[test]
    fn test_schedule_single_defaults() {
        let store = SqliteJobStore::in_memory().unwrap();
        let config = Config::default();

        let id = schedule_single(&store, &config, None, None).unwrap();
        let job = store.get(id).unwrap().unwrap();
        assert_eq!(job.prompt, config.schedule.prompt_template);
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn test_schedule_single_explicit_values() {
        let store = SqliteJobStore::in_memory().unwrap();
        let at = NaiveDate::from_ymd_opt(2025, 7, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();

        let id = schedule_single(&store, &Config::default(), Some("custom"), Some(at)).unwrap();
        let job = store.get(id).unwrap().unwrap();
        assert_eq!(job.prompt, "custom");
        assert_eq!(job.schedule_at, at);
    }

    #[test]
    fn test_schedule_bulk_idempotent() {
        let store = SqliteJobStore::in_memory().unwrap();
        let config = backdated_config();

        let first = schedule_bulk(&store, &config).unwrap();
        // 5 weekdays x 2 posts, all strictly in the past
        assert_eq!(first, 10);

        let second = schedule_bulk(&store, &config).unwrap();
        assert_eq!(second, 0);
        assert_eq!(store.list(None, 100).unwrap().len(), 10);
    }

    #[test]
    fn test_status_report() {
        let store = SqliteJobStore::in_memory().unwrap();
        let config = Config::default();
        schedule_single(&store, &config, Some("a"), None).unwrap();
        schedule_single(&store, &config, Some("b"), None).unwrap();

        let report = get_status(&store, 10).unwrap();
        assert_eq!(report.pending.len(), 2);
        assert_eq!(report.recent.len(), 2);
        assert_eq!(report.completed_today, 0);
    }

    #[test]
    fn test_delete_job() {
        let store = SqliteJobStore::in_memory().unwrap();
        let id = schedule_single(&store, &Config::default(), None, None).unwrap();

        assert!(delete_job(&store, id).unwrap());
        assert!(!delete_job(&store, id).unwrap());
        assert!(store.get(id).unwrap().is_none());
    }
}
