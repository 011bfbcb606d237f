//! Print Job Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failed jobs stop being retried automatically once they reach this count
pub const MAX_PRINT_RETRIES: u32 = 3;

/// Maximum number of jobs re-dispatched by one retry sweep
pub const RETRY_BATCH_SIZE: usize = 10;

/// Print job status
///
/// `pending -> completed | failed`, `failed -> pending` (retry claim),
/// `failed -> completed`. Nothing leaves `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintJobStatus {
    Pending,
    Completed,
    Failed,
}

impl PrintJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// What a job prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintJobType {
    #[default]
    Kitchen,
    Test,
}

/// One persisted attempt to deliver a ticket to one printer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJob {
    pub id: u64,
    /// `None` for printer test tickets
    pub order_id: Option<i64>,
    pub printer_id: i64,
    #[serde(default)]
    pub job_type: PrintJobType,
    pub status: PrintJobStatus,
    pub retry_count: u32,
    pub error_message: Option<String>,
    /// Ticket text including ESC/POS control sequences
    pub content: String,
    pub printed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PrintJob {
    /// Whether the retry sweep may still pick this job up
    pub fn is_retryable(&self) -> bool {
        self.status == PrintJobStatus::Failed && self.retry_count < MAX_PRINT_RETRIES
    }
}

/// Print history row, joined with display names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJobRecord {
    pub id: u64,
    pub order_id: Option<i64>,
    pub printer_id: i64,
    pub job_type: PrintJobType,
    pub status: PrintJobStatus,
    pub retry_count: u32,
    pub error_message: Option<String>,
    pub printed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub printer_name: Option<String>,
}

impl PrintJobRecord {
    pub fn from_job(
        job: &PrintJob,
        customer_name: Option<String>,
        printer_name: Option<String>,
    ) -> Self {
        Self {
            id: job.id,
            order_id: job.order_id,
            printer_id: job.printer_id,
            job_type: job.job_type,
            status: job.status,
            retry_count: job.retry_count,
            error_message: job.error_message.clone(),
            printed_at: job.printed_at,
            created_at: job.created_at,
            customer_name,
            printer_name,
        }
    }
}

/// Outcome of one retry sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Outcome of a printer self-test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPrintResult {
    pub success: bool,
    pub job_id: u64,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: PrintJobStatus, retry_count: u32) -> PrintJob {
        PrintJob {
            id: 1,
            order_id: Some(42),
            printer_id: 1,
            job_type: PrintJobType::Kitchen,
            status,
            retry_count,
            error_message: None,
            content: String::new(),
            printed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_retryable() {
        assert!(job(PrintJobStatus::Failed, 0).is_retryable());
        assert!(job(PrintJobStatus::Failed, 2).is_retryable());
        assert!(!job(PrintJobStatus::Failed, MAX_PRINT_RETRIES).is_retryable());
        assert!(!job(PrintJobStatus::Pending, 0).is_retryable());
        assert!(!job(PrintJobStatus::Completed, 1).is_retryable());
    }

    #[test]
    fn test_record_serializes_history_shape() {
        let record = PrintJobRecord::from_job(
            &job(PrintJobStatus::Failed, 1),
            Some("Ana".to_string()),
            Some("Cozinha".to_string()),
        );
        let value = serde_json::to_value(&record).unwrap();

        for key in [
            "id",
            "order_id",
            "printer_id",
            "job_type",
            "status",
            "retry_count",
            "error_message",
            "printed_at",
            "created_at",
            "customer_name",
            "printer_name",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["status"], "failed");
        assert_eq!(value["job_type"], "kitchen");
    }
}
