//! Print job store
//!
//! Every transition re-reads the job inside a write transaction and checks
//! its status there, so two sweeps racing on one job cannot both act on it.
//! Jobs are never deleted.

use super::{
    ORDERS_TABLE, PRINT_JOBS_BY_ORDER_TABLE, PRINT_JOBS_TABLE, PRINTERS_TABLE,
    RETRYABLE_JOBS_TABLE, Storage, StorageError, StorageResult, next_id,
};
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use shared::models::{
    OrderSnapshot, PrintJob, PrintJobRecord, PrintJobStatus, PrintJobType, Printer,
};
use std::collections::HashMap;

const PRINT_JOB_SEQUENCE: &str = "print_jobs";

/// Error recorded on jobs found `pending` at startup
pub const INTERRUPTED_ERROR: &str = "Interrupted: service stopped before dispatch finished";

impl Storage {
    /// Record a new pending job
    pub fn create_job(
        &self,
        order_id: Option<i64>,
        printer_id: i64,
        job_type: PrintJobType,
        content: &str,
    ) -> StorageResult<PrintJob> {
        let txn = self.begin_write()?;
        let job = {
            let id = next_id(&txn, PRINT_JOB_SEQUENCE)?;
            let job = PrintJob {
                id,
                order_id,
                printer_id,
                job_type,
                status: PrintJobStatus::Pending,
                retry_count: 0,
                error_message: None,
                content: content.to_string(),
                printed_at: None,
                created_at: Utc::now(),
            };

            let mut jobs = txn.open_table(PRINT_JOBS_TABLE)?;
            let value = serde_json::to_vec(&job)?;
            jobs.insert(id, value.as_slice())?;

            if let Some(order_id) = order_id {
                let mut by_order = txn.open_table(PRINT_JOBS_BY_ORDER_TABLE)?;
                by_order.insert((order_id, id), ())?;
            }
            job
        };
        txn.commit()?;

        Ok(job)
    }

    /// Get a print job by ID
    pub fn get_job(&self, id: u64) -> StorageResult<Option<PrintJob>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRINT_JOBS_TABLE)?;

        match table.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Mark a job completed
    ///
    /// Already completed jobs are returned unchanged.
    pub fn mark_completed(&self, id: u64) -> StorageResult<PrintJob> {
        let (job, _) = self.transition(id, |job| {
            if job.status == PrintJobStatus::Completed {
                return false;
            }
            job.status = PrintJobStatus::Completed;
            job.printed_at = Some(Utc::now());
            true
        })?;
        Ok(job)
    }

    /// Mark a job failed, counting the attempt
    ///
    /// Completed jobs are returned unchanged.
    pub fn mark_failed(&self, id: u64, error: &str) -> StorageResult<PrintJob> {
        let (job, _) = self.transition(id, |job| {
            if job.status == PrintJobStatus::Completed {
                return false;
            }
            job.status = PrintJobStatus::Failed;
            job.retry_count += 1;
            job.error_message = Some(error.to_string());
            true
        })?;
        Ok(job)
    }

    /// Move a retryable failed job back to pending
    ///
    /// Returns `false` when the job is no longer failed or has hit the
    /// retry ceiling, i.e. someone else already took it.
    pub fn claim_for_retry(&self, id: u64) -> StorageResult<bool> {
        let (_, claimed) = self.transition(id, |job| {
            if !job.is_retryable() {
                return false;
            }
            job.status = PrintJobStatus::Pending;
            true
        })?;
        Ok(claimed)
    }

    /// Failed jobs under the retry ceiling whose printer is active
    ///
    /// Oldest first, at most `limit`.
    pub fn retry_candidates(&self, limit: usize) -> StorageResult<Vec<PrintJob>> {
        let read_txn = self.db.begin_read()?;
        let retryable = read_txn.open_table(RETRYABLE_JOBS_TABLE)?;
        let jobs = read_txn.open_table(PRINT_JOBS_TABLE)?;
        let printers = read_txn.open_table(PRINTERS_TABLE)?;

        let mut printer_active: HashMap<i64, bool> = HashMap::new();
        let mut candidates = Vec::new();

        for result in retryable.iter()? {
            if candidates.len() >= limit {
                break;
            }
            let (key, _) = result?;
            let id = key.value();

            let job: PrintJob = match jobs.get(id)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => continue,
            };
            if !job.is_retryable() {
                continue;
            }

            let active = match printer_active.get(&job.printer_id) {
                Some(active) => *active,
                None => {
                    let active = match printers.get(job.printer_id)? {
                        Some(guard) => serde_json::from_slice::<Printer>(guard.value())?.is_active,
                        None => false,
                    };
                    printer_active.insert(job.printer_id, active);
                    active
                }
            };

            if active {
                candidates.push(job);
            }
        }

        Ok(candidates)
    }

    /// Print history, newest first, joined with customer and printer names
    pub fn list_history(
        &self,
        order_id: Option<i64>,
        limit: usize,
    ) -> StorageResult<Vec<PrintJobRecord>> {
        let read_txn = self.db.begin_read()?;
        let jobs_table = read_txn.open_table(PRINT_JOBS_TABLE)?;

        let mut jobs: Vec<PrintJob> = Vec::new();
        match order_id {
            Some(order_id) => {
                let by_order = read_txn.open_table(PRINT_JOBS_BY_ORDER_TABLE)?;
                for result in by_order.range((order_id, 0u64)..=(order_id, u64::MAX))?.rev() {
                    if jobs.len() >= limit {
                        break;
                    }
                    let (key, _) = result?;
                    let (_, job_id) = key.value();
                    if let Some(guard) = jobs_table.get(job_id)? {
                        jobs.push(serde_json::from_slice(guard.value())?);
                    }
                }
            }
            None => {
                for result in jobs_table.iter()?.rev().take(limit) {
                    let (_, guard) = result?;
                    jobs.push(serde_json::from_slice(guard.value())?);
                }
            }
        }

        let orders = read_txn.open_table(ORDERS_TABLE)?;
        let printers = read_txn.open_table(PRINTERS_TABLE)?;
        let mut customer_names: HashMap<i64, Option<String>> = HashMap::new();
        let mut printer_names: HashMap<i64, Option<String>> = HashMap::new();

        let mut records = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let customer_name = match job.order_id {
                Some(order_id) => {
                    if !customer_names.contains_key(&order_id) {
                        let name = match orders.get(order_id)? {
                            Some(guard) => Some(
                                serde_json::from_slice::<OrderSnapshot>(guard.value())?
                                    .order
                                    .customer_name,
                            ),
                            None => None,
                        };
                        customer_names.insert(order_id, name);
                    }
                    customer_names.get(&order_id).cloned().flatten()
                }
                None => None,
            };

            if !printer_names.contains_key(&job.printer_id) {
                let name = match printers.get(job.printer_id)? {
                    Some(guard) => Some(serde_json::from_slice::<Printer>(guard.value())?.name),
                    None => None,
                };
                printer_names.insert(job.printer_id, name);
            }
            let printer_name = printer_names.get(&job.printer_id).cloned().flatten();

            records.push(PrintJobRecord::from_job(job, customer_name, printer_name));
        }

        Ok(records)
    }

    /// Fail jobs left `pending` by a previous process
    ///
    /// The interrupted attempt is not counted against the retry ceiling.
    pub fn recover_interrupted(&self) -> StorageResult<usize> {
        let txn = self.begin_write()?;
        let recovered = {
            let mut jobs = txn.open_table(PRINT_JOBS_TABLE)?;
            let mut retryable = txn.open_table(RETRYABLE_JOBS_TABLE)?;

            let mut interrupted: Vec<PrintJob> = Vec::new();
            for result in jobs.iter()? {
                let (_, guard) = result?;
                let job: PrintJob = serde_json::from_slice(guard.value())?;
                if job.status == PrintJobStatus::Pending {
                    interrupted.push(job);
                }
            }

            for mut job in interrupted.iter().cloned() {
                job.status = PrintJobStatus::Failed;
                job.error_message = Some(INTERRUPTED_ERROR.to_string());
                let value = serde_json::to_vec(&job)?;
                jobs.insert(job.id, value.as_slice())?;
                if job.is_retryable() {
                    retryable.insert(job.id, ())?;
                }
            }
            interrupted.len()
        };
        txn.commit()?;

        Ok(recovered)
    }

    /// Apply a guarded status change to one job
    ///
    /// `apply` returns whether it changed the job; unchanged jobs are not
    /// rewritten. The retryable index is kept in step with the job.
    fn transition<F>(&self, id: u64, apply: F) -> StorageResult<(PrintJob, bool)>
    where
        F: FnOnce(&mut PrintJob) -> bool,
    {
        let txn = self.begin_write()?;
        let (job, changed) = Self::transition_in(&txn, id, apply)?;
        txn.commit()?;
        Ok((job, changed))
    }

    fn transition_in<F>(
        txn: &WriteTransaction,
        id: u64,
        apply: F,
    ) -> StorageResult<(PrintJob, bool)>
    where
        F: FnOnce(&mut PrintJob) -> bool,
    {
        let mut jobs = txn.open_table(PRINT_JOBS_TABLE)?;

        // Read first
        let bytes = {
            let guard = jobs.get(id)?.ok_or(StorageError::JobNotFound(id))?;
            guard.value().to_vec()
        };
        let mut job: PrintJob = serde_json::from_slice(&bytes)?;

        let changed = apply(&mut job);
        if changed {
            let value = serde_json::to_vec(&job)?;
            jobs.insert(id, value.as_slice())?;

            let mut retryable = txn.open_table(RETRYABLE_JOBS_TABLE)?;
            if job.is_retryable() {
                retryable.insert(id, ())?;
            } else {
                retryable.remove(id)?;
            }
        }

        Ok((job, changed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{
        MAX_PRINT_RETRIES, PaperWidth, PrinterCreate, PrinterPurpose, PrinterType,
    };

    fn storage_with_printer() -> (Storage, i64) {
        let storage = Storage::open_in_memory().unwrap();
        let printer = storage
            .create_printer(PrinterCreate {
                name: "Cozinha".to_string(),
                printer_type: PrinterType::Network,
                ip_address: Some("127.0.0.1".to_string()),
                port: Some(9100),
                device_path: None,
                paper_width: PaperWidth::Mm80,
                is_active: true,
                auto_print: true,
                location_id: "ilha".to_string(),
                purpose: PrinterPurpose::Kitchen,
            })
            .unwrap();
        (storage, printer.id)
    }

    #[test]
    fn test_create_job_starts_pending() {
        let (storage, printer_id) = storage_with_printer();

        let job = storage
            .create_job(Some(42), printer_id, PrintJobType::Kitchen, "ticket")
            .unwrap();
        assert_eq!(job.id, 1);
        assert_eq!(job.status, PrintJobStatus::Pending);
        assert_eq!(job.retry_count, 0);
        assert!(job.printed_at.is_none());

        let second = storage
            .create_job(None, printer_id, PrintJobType::Test, "test")
            .unwrap();
        assert!(second.id > job.id);
        assert_eq!(storage.get_job(job.id).unwrap().unwrap(), job);
    }

    #[test]
    fn test_mark_completed_is_idempotent() {
        let (storage, printer_id) = storage_with_printer();
        let job = storage
            .create_job(Some(1), printer_id, PrintJobType::Kitchen, "t")
            .unwrap();

        let first = storage.mark_completed(job.id).unwrap();
        assert_eq!(first.status, PrintJobStatus::Completed);
        assert!(first.printed_at.is_some());

        let second = storage.mark_completed(job.id).unwrap();
        assert_eq!(second, first);
        assert_eq!(second.retry_count, 0);
    }

    #[test]
    fn test_mark_failed_counts_attempts() {
        let (storage, printer_id) = storage_with_printer();
        let job = storage
            .create_job(Some(1), printer_id, PrintJobType::Kitchen, "t")
            .unwrap();

        let failed = storage.mark_failed(job.id, "connection refused").unwrap();
        assert_eq!(failed.status, PrintJobStatus::Failed);
        assert_eq!(failed.retry_count, 1);
        assert_eq!(failed.error_message.as_deref(), Some("connection refused"));

        // Failure after success is ignored
        storage.mark_completed(job.id).unwrap();
        let after = storage.mark_failed(job.id, "late").unwrap();
        assert_eq!(after.status, PrintJobStatus::Completed);
        assert_eq!(after.retry_count, 1);
    }

    #[test]
    fn test_missing_job_is_not_found() {
        let storage = Storage::open_in_memory().unwrap();
        assert!(matches!(
            storage.mark_completed(99),
            Err(StorageError::JobNotFound(99))
        ));
        assert!(matches!(
            storage.claim_for_retry(99),
            Err(StorageError::JobNotFound(99))
        ));
    }

    #[test]
    fn test_retry_ceiling_excludes_job() {
        let (storage, printer_id) = storage_with_printer();
        let job = storage
            .create_job(Some(1), printer_id, PrintJobType::Kitchen, "t")
            .unwrap();

        for attempt in 1..=MAX_PRINT_RETRIES {
            if attempt > 1 {
                assert!(storage.claim_for_retry(job.id).unwrap());
            }
            let failed = storage.mark_failed(job.id, "timeout").unwrap();
            assert_eq!(failed.retry_count, attempt);
        }

        assert!(storage.retry_candidates(10).unwrap().is_empty());
        assert!(!storage.claim_for_retry(job.id).unwrap());
    }

    #[test]
    fn test_claim_is_single_use() {
        let (storage, printer_id) = storage_with_printer();
        let job = storage
            .create_job(Some(1), printer_id, PrintJobType::Kitchen, "t")
            .unwrap();
        storage.mark_failed(job.id, "offline").unwrap();

        assert!(storage.claim_for_retry(job.id).unwrap());
        assert!(!storage.claim_for_retry(job.id).unwrap());
        assert_eq!(
            storage.get_job(job.id).unwrap().unwrap().status,
            PrintJobStatus::Pending
        );
        assert!(storage.retry_candidates(10).unwrap().is_empty());
    }

    #[test]
    fn test_retry_candidates_skip_inactive_printers_and_respect_limit() {
        let (storage, printer_id) = storage_with_printer();

        let mut ids = Vec::new();
        for _ in 0..3 {
            let job = storage
                .create_job(Some(1), printer_id, PrintJobType::Kitchen, "t")
                .unwrap();
            storage.mark_failed(job.id, "offline").unwrap();
            ids.push(job.id);
        }

        let candidates: Vec<_> = storage
            .retry_candidates(2)
            .unwrap()
            .into_iter()
            .map(|j| j.id)
            .collect();
        assert_eq!(candidates, ids[..2].to_vec());

        let mut printer = storage.get_printer(printer_id).unwrap().unwrap();
        printer.is_active = false;
        storage.save_printer(&printer).unwrap();

        assert!(storage.retry_candidates(10).unwrap().is_empty());
    }

    #[test]
    fn test_list_history_newest_first_with_names() {
        let (storage, printer_id) = storage_with_printer();
        storage
            .upsert_order(&OrderSnapshot {
                order: serde_json::from_value(serde_json::json!({
                    "id": 42,
                    "customer_name": "Ana",
                    "customer_phone": "923000000",
                    "customer_email": null,
                    "delivery_address": null,
                    "order_type": "takeaway",
                    "location_id": "ilha",
                    "table_id": null,
                    "payment_method": "cash",
                    "total_amount": 10.0,
                    "notes": null,
                    "estimated_delivery_time": null
                }))
                .unwrap(),
                items: vec![],
            })
            .unwrap();

        let a = storage
            .create_job(Some(42), printer_id, PrintJobType::Kitchen, "a")
            .unwrap();
        let b = storage
            .create_job(Some(7), printer_id, PrintJobType::Kitchen, "b")
            .unwrap();
        let c = storage
            .create_job(Some(42), printer_id, PrintJobType::Kitchen, "c")
            .unwrap();

        let all: Vec<_> = storage
            .list_history(None, 50)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(all, vec![c.id, b.id, a.id]);

        let for_order = storage.list_history(Some(42), 50).unwrap();
        assert_eq!(
            for_order.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![c.id, a.id]
        );
        assert_eq!(for_order[0].customer_name.as_deref(), Some("Ana"));
        assert_eq!(for_order[0].printer_name.as_deref(), Some("Cozinha"));

        assert_eq!(storage.list_history(None, 1).unwrap().len(), 1);
        assert_eq!(storage.list_history(Some(42), 1).unwrap()[0].id, c.id);

        let unknown_order = storage.list_history(Some(7), 50).unwrap();
        assert_eq!(unknown_order[0].customer_name, None);
    }

    #[test]
    fn test_recover_interrupted_fails_pending_jobs() {
        let (storage, printer_id) = storage_with_printer();
        let pending = storage
            .create_job(Some(1), printer_id, PrintJobType::Kitchen, "t")
            .unwrap();
        let done = storage
            .create_job(Some(1), printer_id, PrintJobType::Kitchen, "t")
            .unwrap();
        storage.mark_completed(done.id).unwrap();

        assert_eq!(storage.recover_interrupted().unwrap(), 1);

        let recovered = storage.get_job(pending.id).unwrap().unwrap();
        assert_eq!(recovered.status, PrintJobStatus::Failed);
        assert_eq!(recovered.retry_count, 0);
        assert_eq!(recovered.error_message.as_deref(), Some(INTERRUPTED_ERROR));

        let candidates = storage.retry_candidates(10).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, pending.id);

        assert_eq!(storage.recover_interrupted().unwrap(), 0);
    }
}
