//! Job dispatcher
//!
//! Drains due jobs in small batches through the full pipeline: claim,
//! placeholder substitution, generation, normalization, optional image
//! resolution, publish, terminal status update. A store-backed lease makes
//! overlapping runs mutually exclusive, and the atomic claim makes
//! per-job double-processing impossible even without the lease.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use uuid::Uuid;

use super::error::SchedulerError;
use super::window::PostingWindow;
use crate::config::Config;
use crate::images::ImageResolver;
use crate::models::GenerationJob;
use crate::parser;
use crate::provider::{placeholder, PlaceholderContext, ProviderClient};
use crate::publisher::{self, DocumentId, Publisher};
use crate::storage::JobStore;

/// Jobs attempted per run
const BATCH_SIZE: usize = 5;

/// Pause between consecutive jobs in a batch
const INTER_JOB_DELAY: Duration = Duration::from_secs(2);

/// Store lease guarding against overlapping runs
const RUN_LEASE: &str = "dispatcher_run";
const RUN_LEASE_TTL_SECS: i64 = 300;

/// Result of one dispatcher run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The batch ran; counts of terminal transitions made
    Ran { completed: u32, failed: u32 },

    /// Current time is outside the posting window
    OutsideWindow,

    /// Today's completion quota was already met before the run
    QuotaReached,

    /// Another run holds the lease
    LockHeld,
}

/// Drives due jobs through generation and publishing
pub struct Dispatcher {
    store: Arc<dyn JobStore>,
    provider: Arc<ProviderClient>,
    publisher: Arc<dyn Publisher>,
    images: Option<Arc<dyn ImageResolver>>,
    config: Config,
    window: PostingWindow,

    /// Lease holder identity, unique per dispatcher instance
    holder: String,

    inter_job_delay: Duration,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn JobStore>,
        provider: Arc<ProviderClient>,
        publisher: Arc<dyn Publisher>,
        images: Option<Arc<dyn ImageResolver>>,
        config: Config,
    ) -> Result<Self, SchedulerError> {
        let (start, end) = config
            .posting_window()
            .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;
        let window = PostingWindow::new(start, end)?;

        Ok(Self {
            store,
            provider,
            publisher,
            images,
            config,
            window,
            holder: Uuid::new_v4().to_string(),
            inter_job_delay: INTER_JOB_DELAY,
        })
    }

    /// Drop the inter-job pause (for testing)
    #[cfg(test)]
    pub fn without_delay(mut self) -> Self {
        self.inter_job_delay = Duration::ZERO;
        self
    }

    /// Whether a run at `now` would be allowed to process jobs
    pub fn check_eligible(&self, now: DateTime<Local>) -> Result<RunOutcome, SchedulerError> {
        if !self.window.contains(now.time()) {
            return Ok(RunOutcome::OutsideWindow);
        }

        let completed = self.store.count_completed_today(now.date_naive())?;
        if completed >= self.config.schedule.posts_per_day {
            return Ok(RunOutcome::QuotaReached);
        }

        Ok(RunOutcome::Ran {
            completed: 0,
            failed: 0,
        })
    }

    /// Run one batch of due jobs
    ///
    /// The lease is taken before fetching and released on every exit path.
    /// The daily quota is re-checked before each job so a batch never
    /// overshoots it.
    pub async fn run_batch(&self, now: DateTime<Local>) -> Result<RunOutcome, SchedulerError> {
        self.run_inner(now, true).await
    }

    /// Operator-forced run: skips the posting-window check but keeps the
    /// quota and lease guards
    pub async fn run_forced(&self, now: DateTime<Local>) -> Result<RunOutcome, SchedulerError> {
        self.run_inner(now, false).await
    }

    async fn run_inner(
        &self,
        now: DateTime<Local>,
        enforce_window: bool,
    ) -> Result<RunOutcome, SchedulerError> {
        match self.check_eligible(now)? {
            RunOutcome::Ran { .. } => {}
            // A forced run ignores the window but still honors the quota,
            // which check_eligible short-circuits past
            RunOutcome::OutsideWindow if !enforce_window => {
                let completed = self.store.count_completed_today(now.date_naive())?;
                if completed >= self.config.schedule.posts_per_day {
                    return Ok(RunOutcome::QuotaReached);
                }
            }
            other => {
                tracing::debug!(outcome = ?other, "Dispatcher run skipped");
                return Ok(other);
            }
        }

        let acquired = self.store.acquire_lease(
            RUN_LEASE,
            &self.holder,
            RUN_LEASE_TTL_SECS,
            now.naive_local(),
        )?;
        if !acquired {
            tracing::debug!("Dispatcher run lease held elsewhere, skipping");
            return Ok(RunOutcome::LockHeld);
        }

        let result = self.drain_batch(now).await;

        // Best-effort release; an expired lease is reclaimed by the next run
        if let Err(e) = self.store.release_lease(RUN_LEASE, &self.holder) {
            tracing::warn!(error = %e, "Failed to release dispatcher lease");
        }

        result
    }

    async fn drain_batch(&self, now: DateTime<Local>) -> Result<RunOutcome, SchedulerError> {
        let due = self.store.fetch_due(now.naive_local(), BATCH_SIZE)?;
        tracing::info!(due = due.len(), "Dispatcher batch starting");

        let mut completed = 0u32;
        let mut failed = 0u32;

        for (index, job) in due.iter().enumerate() {
            let done_today = self.store.count_completed_today(now.date_naive())?;
            if done_today >= self.config.schedule.posts_per_day {
                tracing::info!(done_today, "Daily quota reached mid-batch, stopping");
                break;
            }

            if index > 0 && !self.inter_job_delay.is_zero() {
                tokio::time::sleep(self.inter_job_delay).await;
            }

            if !self.store.claim(job.id)? {
                tracing::debug!(job_id = %job.id, "Job already claimed, skipping");
                continue;
            }

            match self.process_job(job).await {
                Ok(document_id) => {
                    self.store.mark_completed(job.id, &document_id.0)?;
                    tracing::info!(job_id = %job.id, document_id = %document_id, "Job completed");
                    completed += 1;
                }
                Err(e) => {
                    self.store.mark_failed(job.id, &e.to_string())?;
                    tracing::warn!(
                        job_id = %job.id,
                        error = %e,
                        recoverable = e.is_recoverable(),
                        "Job failed"
                    );
                    failed += 1;
                }
            }
        }

        Ok(RunOutcome::Ran { completed, failed })
    }

    /// Execute a single claimed job through the full pipeline
    async fn process_job(&self, job: &GenerationJob) -> Result<DocumentId, SchedulerError> {
        let ctx = PlaceholderContext {
            topic: None,
            category: self.config.publish.default_category.clone(),
            author: self.config.publish.author.clone(),
        };
        let (prompt, topic) = placeholder::process(&job.prompt, &ctx);

        let generated = self
            .provider
            .generate(
                &self.config.provider.name,
                &self.config.provider.api_key,
                &prompt,
                self.config.provider.model.as_deref(),
            )
            .await?;

        let content = parser::parse(&generated.content);

        let image = match &self.images {
            Some(resolver) => resolver.resolve(&topic, &content.title).await,
            None => None,
        };

        // The scheduled instant becomes the post date, so backdated jobs
        // produce a backdated history
        let draft =
            publisher::assemble(&content, &self.config.publish, image, Some(job.schedule_at));
        let document_id = self.publisher.publish(&draft).await?;

        Ok(document_id)
    }
}
