//! Retry coordinator
//!
//! Picks up failed jobs that are still under the retry ceiling and sends
//! their stored content again. Each sweep gives a job at most one attempt.
//! Jobs for one printer go out one after another in creation order;
//! different printers are worked concurrently.

use super::service::{PrintService, PrintServiceResult};
use futures::future::join_all;
use shared::models::{PrintJob, PrintJobStatus, RETRY_BATCH_SIZE, RetrySummary};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Retry coordinator
#[derive(Clone)]
pub struct RetryCoordinator {
    service: Arc<PrintService>,
}

impl RetryCoordinator {
    pub fn new(service: Arc<PrintService>) -> Self {
        Self { service }
    }

    /// Run one retry sweep
    pub async fn retry_failed_jobs(&self) -> PrintServiceResult<RetrySummary> {
        let candidates = self.service.storage().retry_candidates(RETRY_BATCH_SIZE)?;
        if candidates.is_empty() {
            return Ok(RetrySummary::default());
        }

        let mut by_printer: BTreeMap<i64, Vec<PrintJob>> = BTreeMap::new();
        for job in candidates {
            by_printer.entry(job.printer_id).or_default().push(job);
        }

        let outcomes = join_all(
            by_printer
                .into_iter()
                .map(|(printer_id, jobs)| self.retry_printer(printer_id, jobs)),
        )
        .await;

        let summary = outcomes
            .into_iter()
            .fold(RetrySummary::default(), |acc, s| RetrySummary {
                processed: acc.processed + s.processed,
                succeeded: acc.succeeded + s.succeeded,
                failed: acc.failed + s.failed,
            });

        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Retry sweep finished"
        );
        Ok(summary)
    }

    async fn retry_printer(&self, printer_id: i64, jobs: Vec<PrintJob>) -> RetrySummary {
        let mut summary = RetrySummary::default();

        // Deactivated or deleted since candidates were read
        let printer = match self.service.registry().require_active(printer_id) {
            Ok(printer) => printer,
            Err(e) => {
                warn!(printer_id, error = %e, "Skipping retries for unavailable printer");
                return summary;
            }
        };

        for job in jobs {
            match self.service.storage().claim_for_retry(job.id) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    error!(job_id = job.id, error = %e, "Failed to claim job for retry");
                    continue;
                }
            }

            summary.processed += 1;
            match self.service.dispatch_job(job, &printer).await {
                Ok(job) if job.status == PrintJobStatus::Completed => summary.succeeded += 1,
                Ok(_) => summary.failed += 1,
                Err(e) => {
                    error!(printer_id, error = %e, "Failed to record retry outcome");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Sweep every `interval` until shutdown
    pub async fn run_periodic(self, interval: Duration, shutdown: CancellationToken) {
        tracing::info!(interval_secs = interval.as_secs(), "Print retry task started");

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Print retry task received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.retry_failed_jobs().await {
                        error!(error = %e, "Retry sweep failed");
                    }
                }
            }
        }
    }
}
