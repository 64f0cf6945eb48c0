//! SQLite-backed job store
//!
//! The scheduled-job table is append-only on creation; each job receives a
//! single mutable status/result/error/processed_at update at its terminal
//! transition. The claim operation is a conditional UPDATE so two
//! overlapping dispatcher runs can never both take the same job.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::models::{GenerationJob, JobStatus};

/// Timestamp format used for all stored datetimes (local time)
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Durable table of scheduled generation jobs plus auxiliary flag and
/// lease state
pub trait JobStore: Send + Sync {
    /// Append a new pending job; returns its id
    fn schedule(&self, prompt: &str, schedule_at: NaiveDateTime) -> StoreResult<Uuid>;

    /// Pending jobs with `schedule_at <= now`, ordered ascending by
    /// `schedule_at` so the earliest-due jobs are attempted first
    fn fetch_due(&self, now: NaiveDateTime, limit: usize) -> StoreResult<Vec<GenerationJob>>;

    /// Atomically transition a job from Pending to Processing
    ///
    /// Returns false when the job was already claimed (or is not pending),
    /// which makes concurrent double-claims impossible.
    fn claim(&self, id: Uuid) -> StoreResult<bool>;

    /// Terminal transition: Processing -> Completed with the document id
    fn mark_completed(&self, id: Uuid, document_id: &str) -> StoreResult<()>;

    /// Terminal transition: Processing -> Failed with the error detail
    fn mark_failed(&self, id: Uuid, error_detail: &str) -> StoreResult<()>;

    /// Completed jobs whose `processed_at` falls on the given local day
    fn count_completed_today(&self, day: NaiveDate) -> StoreResult<u32>;

    /// Fetch a single job
    fn get(&self, id: Uuid) -> StoreResult<Option<GenerationJob>>;

    /// List jobs, optionally filtered by status, newest schedule first
    fn list(&self, status: Option<JobStatus>, limit: usize) -> StoreResult<Vec<GenerationJob>>;

    /// Operator-initiated deletion; returns whether a row was removed
    fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Persist a one-shot flag; returns false when it was already set
    fn set_flag(&self, name: &str) -> StoreResult<bool>;

    /// Whether a one-shot flag has been set
    fn is_flag_set(&self, name: &str) -> StoreResult<bool>;

    /// Try to take a named lease until `now + ttl_secs`
    ///
    /// Returns false while another holder's unexpired lease exists.
    fn acquire_lease(
        &self,
        name: &str,
        holder: &str,
        ttl_secs: i64,
        now: NaiveDateTime,
    ) -> StoreResult<bool>;

    /// Release a lease held by `holder`; other holders' leases are untouched
    fn release_lease(&self, name: &str, holder: &str) -> StoreResult<()>;
}

/// SQLite implementation of [`JobStore`]
///
/// Uses a `Mutex` around the connection; WAL mode keeps readers responsive
/// while the dispatcher writes.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Open (or create) a job store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Corrupt(format!("cannot create {parent:?}: {e}")))?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "Job store initialized");
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> StoreResult<()> {
        let conn = self.lock();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS jobs (
                id                  TEXT PRIMARY KEY,
                prompt              TEXT NOT NULL,
                schedule_at         TEXT NOT NULL,
                status              TEXT NOT NULL DEFAULT 'pending',
                result_document_id  TEXT,
                error_detail        TEXT,
                created_at          TEXT NOT NULL,
                processed_at        TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs (status);
            CREATE INDEX IF NOT EXISTS idx_jobs_schedule_at ON jobs (schedule_at);

            CREATE TABLE IF NOT EXISTS flags (
                name    TEXT PRIMARY KEY,
                set_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS leases (
                name        TEXT PRIMARY KEY,
                holder      TEXT NOT NULL,
                expires_at  TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn row_to_job(row: &Row<'_>) -> rusqlite::Result<GenerationJob> {
        let id: String = row.get("id")?;
        let status: String = row.get("status")?;
        let schedule_at: String = row.get("schedule_at")?;
        let created_at: String = row.get("created_at")?;
        let processed_at: Option<String> = row.get("processed_at")?;

        Ok(GenerationJob {
            id: id.parse().unwrap_or_else(|_| Uuid::nil()),
            prompt: row.get("prompt")?,
            schedule_at: parse_datetime(&schedule_at),
            status: status.parse().unwrap_or(JobStatus::Failed),
            result_document_id: row.get("result_document_id")?,
            error_detail: row.get("error_detail")?,
            created_at: to_local(parse_datetime(&created_at)),
            processed_at: processed_at.map(|s| to_local(parse_datetime(&s))),
        })
    }
}

fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).unwrap_or_default()
}

fn to_local(naive: NaiveDateTime) -> DateTime<Local> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(Local::now)
}

impl JobStore for SqliteJobStore {
    fn schedule(&self, prompt: &str, schedule_at: NaiveDateTime) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        let created_at = Local::now().naive_local();

        self.lock().execute(
            "INSERT INTO jobs (id, prompt, schedule_at, status, created_at)
             VALUES (?1, ?2, ?3, 'pending', ?4)",
            params![
                id.to_string(),
                prompt,
                format_datetime(schedule_at),
                format_datetime(created_at),
            ],
        )?;

        tracing::debug!(job_id = %id, schedule_at = %schedule_at, "Job scheduled");
        Ok(id)
    }

    fn fetch_due(&self, now: NaiveDateTime, limit: usize) -> StoreResult<Vec<GenerationJob>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT * FROM jobs
             WHERE status = 'pending' AND schedule_at <= ?1
             ORDER BY schedule_at ASC
             LIMIT ?2",
        )?;

        let jobs = stmt
            .query_map(params![format_datetime(now), limit as i64], Self::row_to_job)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(jobs)
    }

    fn claim(&self, id: Uuid) -> StoreResult<bool> {
        let changed = self.lock().execute(
            "UPDATE jobs SET status = 'processing'
             WHERE id = ?1 AND status = 'pending'",
            params![id.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn mark_completed(&self, id: Uuid, document_id: &str) -> StoreResult<()> {
        let processed_at = format_datetime(Local::now().naive_local());
        let changed = self.lock().execute(
            "UPDATE jobs
             SET status = 'completed', result_document_id = ?2, processed_at = ?3
             WHERE id = ?1 AND status = 'processing'",
            params![id.to_string(), document_id, processed_at],
        )?;

        if changed == 1 {
            Ok(())
        } else {
            Err(StoreError::InvalidTransition {
                id: id.to_string(),
                expected: "processing",
            })
        }
    }

    fn mark_failed(&self, id: Uuid, error_detail: &str) -> StoreResult<()> {
        let processed_at = format_datetime(Local::now().naive_local());
        let changed = self.lock().execute(
            "UPDATE jobs
             SET status = 'failed', error_detail = ?2, processed_at = ?3
             WHERE id = ?1 AND status = 'processing'",
            params![id.to_string(), error_detail, processed_at],
        )?;

        if changed == 1 {
            Ok(())
        } else {
            Err(StoreError::InvalidTransition {
                id: id.to_string(),
                expected: "processing",
            })
        }
    }

    fn count_completed_today(&self, day: NaiveDate) -> StoreResult<u32> {
        let count: u32 = self.lock().query_row(
            "SELECT COUNT(*) FROM jobs
             WHERE status = 'completed' AND date(processed_at) = ?1",
            params![day.format("%Y-%m-%d").to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn get(&self, id: Uuid) -> StoreResult<Option<GenerationJob>> {
        let conn = self.lock();
        let job = conn
            .query_row(
                "SELECT * FROM jobs WHERE id = ?1",
                params![id.to_string()],
                Self::row_to_job,
            )
            .optional()?;
        Ok(job)
    }

    fn list(&self, status: Option<JobStatus>, limit: usize) -> StoreResult<Vec<GenerationJob>> {
        let conn = self.lock();
        let jobs = match status {
            Some(status) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM jobs WHERE status = ?1
                     ORDER BY schedule_at DESC LIMIT ?2",
                )?;
                let rows = stmt
                    .query_map(params![status.as_str(), limit as i64], Self::row_to_job)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM jobs ORDER BY schedule_at DESC LIMIT ?1",
                )?;
                let rows = stmt
                    .query_map(params![limit as i64], Self::row_to_job)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(jobs)
    }

    fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let changed = self
            .lock()
            .execute("DELETE FROM jobs WHERE id = ?1", params![id.to_string()])?;
        Ok(changed == 1)
    }

    fn set_flag(&self, name: &str) -> StoreResult<bool> {
        let changed = self.lock().execute(
            "INSERT OR IGNORE INTO flags (name, set_at) VALUES (?1, ?2)",
            params![name, format_datetime(Local::now().naive_local())],
        )?;
        Ok(changed == 1)
    }

    fn is_flag_set(&self, name: &str) -> StoreResult<bool> {
        let found: Option<String> = self
            .lock()
            .query_row(
                "SELECT name FROM flags WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn acquire_lease(
        &self,
        name: &str,
        holder: &str,
        ttl_secs: i64,
        now: NaiveDateTime,
    ) -> StoreResult<bool> {
        let conn = self.lock();

        // Reap an expired lease first, then a plain insert either wins the
        // lease or loses to a live holder.
        conn.execute(
            "DELETE FROM leases WHERE name = ?1 AND expires_at <= ?2",
            params![name, format_datetime(now)],
        )?;

        let expires_at = now + chrono::Duration::seconds(ttl_secs);
        let changed = conn.execute(
            "INSERT OR IGNORE INTO leases (name, holder, expires_at) VALUES (?1, ?2, ?3)",
            params![name, holder, format_datetime(expires_at)],
        )?;

        Ok(changed == 1)
    }

    fn release_lease(&self, name: &str, holder: &str) -> StoreResult<()> {
        self.lock().execute(
            "DELETE FROM leases WHERE name = ?1 AND holder = ?2",
            params![name, holder],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn store() -> SqliteJobStore {
        SqliteJobStore::in_memory().unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_schedule_and_get() {
        let store = store();
        let id = store.schedule("Write about {topic}", dt("2025-05-01 09:00:00")).unwrap();

        let job = store.get(id).unwrap().unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.prompt, "Write about {topic}");
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.result_document_id.is_none());
        assert!(job.error_detail.is_none());
        assert!(job.processed_at.is_none());
    }

    #[test]
    fn test_fetch_due_filters_and_orders() {
        let store = store();
        let late = store.schedule("late", dt("2025-05-01 12:00:00")).unwrap();
        let early = store.schedule("early", dt("2025-05-01 08:00:00")).unwrap();
        let future = store.schedule("future", dt("2025-05-02 08:00:00")).unwrap();

        let due = store.fetch_due(dt("2025-05-01 12:00:00"), 5).unwrap();
        let ids: Vec<_> = due.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![early, late]);
        assert!(!ids.contains(&future));
    }

    #[test]
    fn test_fetch_due_excludes_non_pending() {
        let store = store();
        let id = store.schedule("p", dt("2025-05-01 08:00:00")).unwrap();
        assert!(store.claim(id).unwrap());

        let due = store.fetch_due(dt("2025-05-01 12:00:00"), 5).unwrap();
        assert!(due.is_empty());
    }

    #[test]
    fn test_fetch_due_respects_limit() {
        let store = store();
        for i in 0..8 {
            store
                .schedule(&format!("job {i}"), dt("2025-05-01 08:00:00"))
                .unwrap();
        }
        let due = store.fetch_due(dt("2025-05-01 12:00:00"), 5).unwrap();
        assert_eq!(due.len(), 5);
    }

    #[test]
    fn test_claim_is_single_winner() {
        let store = store();
        let id = store.schedule("p", dt("2025-05-01 08:00:00")).unwrap();

        assert!(store.claim(id).unwrap());
        // Second claim must lose
        assert!(!store.claim(id).unwrap());
    }

    #[test]
    fn test_completed_lifecycle() {
        let store = store();
        let id = store.schedule("p", dt("2025-05-01 08:00:00")).unwrap();
        store.claim(id).unwrap();
        store.mark_completed(id, "doc-42").unwrap();

        let job = store.get(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.result_document_id.as_deref(), Some("doc-42"));
        assert!(job.error_detail.is_none());
        assert!(job.processed_at.is_some());
    }

    #[test]
    fn test_failed_lifecycle() {
        let store = store();
        let id = store.schedule("p", dt("2025-05-01 08:00:00")).unwrap();
        store.claim(id).unwrap();
        store.mark_failed(id, "provider rejected").unwrap();

        let job = store.get(id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_detail.as_deref(), Some("provider rejected"));
        assert!(job.result_document_id.is_none());
    }

    #[test]
    fn test_no_backward_transition() {
        let store = store();
        let id = store.schedule("p", dt("2025-05-01 08:00:00")).unwrap();
        store.claim(id).unwrap();
        store.mark_completed(id, "doc-1").unwrap();

        // Terminal states reject further transitions
        assert!(store.mark_failed(id, "late error").is_err());
        assert!(store.mark_completed(id, "doc-2").is_err());
    }

    #[test]
    fn test_completed_without_claim_rejected() {
        let store = store();
        let id = store.schedule("p", dt("2025-05-01 08:00:00")).unwrap();
        assert!(matches!(
            store.mark_completed(id, "doc"),
            Err(StoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_count_completed_today() {
        let store = store();
        let today = Local::now().date_naive();

        for _ in 0..2 {
            let id = store.schedule("p", dt("2025-05-01 08:00:00")).unwrap();
            store.claim(id).unwrap();
            store.mark_completed(id, "doc").unwrap();
        }
        let failed = store.schedule("p", dt("2025-05-01 08:00:00")).unwrap();
        store.claim(failed).unwrap();
        store.mark_failed(failed, "e").unwrap();

        assert_eq!(store.count_completed_today(today).unwrap(), 2);
        assert_eq!(
            store
                .count_completed_today(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_delete() {
        let store = store();
        let id = store.schedule("p", dt("2025-05-01 08:00:00")).unwrap();
        assert!(store.delete(id).unwrap());
        assert!(!store.delete(id).unwrap());
        assert!(store.get(id).unwrap().is_none());
    }

    #[test]
    fn test_list_filtered() {
        let store = store();
        let a = store.schedule("a", dt("2025-05-01 08:00:00")).unwrap();
        store.schedule("b", dt("2025-05-01 09:00:00")).unwrap();
        store.claim(a).unwrap();

        let pending = store.list(Some(JobStatus::Pending), 10).unwrap();
        assert_eq!(pending.len(), 1);
        let all = store.list(None, 10).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_list_newest_first() {
        let store = store();
        let older = store.schedule("older", dt("2025-05-01 08:00:00")).unwrap();
        let newer = store.schedule("newer", dt("2025-05-03 08:00:00")).unwrap();

        let all = store.list(None, 10).unwrap();
        let ids: Vec<_> = all.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![newer, older]);

        let pending = store.list(Some(JobStatus::Pending), 1).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, newer);
    }

    #[test]
    fn test_one_shot_flag() {
        let store = store();
        assert!(!store.is_flag_set("backdate_scheduled").unwrap());
        assert!(store.set_flag("backdate_scheduled").unwrap());
        assert!(store.is_flag_set("backdate_scheduled").unwrap());
        // Second set is a no-op
        assert!(!store.set_flag("backdate_scheduled").unwrap());
    }

    #[test]
    fn test_lease_mutual_exclusion() {
        let store = store();
        let now = dt("2025-05-01 10:00:00");

        assert!(store.acquire_lease("dispatcher", "run-a", 300, now).unwrap());
        assert!(!store.acquire_lease("dispatcher", "run-b", 300, now).unwrap());

        // Expired lease can be reacquired
        let later = dt("2025-05-01 10:06:00");
        assert!(store.acquire_lease("dispatcher", "run-b", 300, later).unwrap());
    }

    #[test]
    fn test_lease_release() {
        let store = store();
        let now = dt("2025-05-01 10:00:00");

        assert!(store.acquire_lease("dispatcher", "run-a", 300, now).unwrap());
        store.release_lease("dispatcher", "run-a").unwrap();
        assert!(store.acquire_lease("dispatcher", "run-b", 300, now).unwrap());
    }
}
