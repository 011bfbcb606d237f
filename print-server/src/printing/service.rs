//! Print service
//!
//! Ties the pipeline together: load an order, render a ticket per printer,
//! persist a job, dispatch it, and record the outcome on the job. Dispatch
//! failures never surface as errors here; they end up on the job record.

use super::dispatcher::PrintDispatcher;
use super::registry::PrinterRegistry;
use super::renderer::TicketRenderer;
use crate::db::{Storage, StorageError};
use chrono::Utc;
use futures::future::join_all;
use shared::error::AppError;
use shared::models::{
    PaperWidth, PrintJob, PrintJobRecord, PrintJobStatus, PrintJobType, Printer, PrinterPurpose,
    TestPrintResult,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum PrintServiceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Printer not found or inactive: {0}")]
    PrinterNotFound(i64),

    #[error("Print job not found: {0}")]
    JobNotFound(u64),

    #[error("{0}")]
    Validation(String),
}

pub type PrintServiceResult<T> = Result<T, PrintServiceError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::JobNotFound(id) => AppError::print_job_not_found(id),
            other => AppError::database(other.to_string()),
        }
    }
}

impl From<PrintServiceError> for AppError {
    fn from(err: PrintServiceError) -> Self {
        match err {
            PrintServiceError::Storage(e) => e.into(),
            PrintServiceError::OrderNotFound(id) => AppError::order_not_found(id),
            PrintServiceError::PrinterNotFound(id) => AppError::printer_not_found(id),
            PrintServiceError::JobNotFound(id) => AppError::print_job_not_found(id),
            PrintServiceError::Validation(msg) => AppError::validation(msg),
        }
    }
}

/// Print service
pub struct PrintService {
    storage: Storage,
    registry: PrinterRegistry,
    renderer: TicketRenderer,
    dispatcher: Arc<PrintDispatcher>,
}

impl PrintService {
    pub fn new(
        storage: Storage,
        registry: PrinterRegistry,
        renderer: TicketRenderer,
        dispatcher: Arc<PrintDispatcher>,
    ) -> Self {
        Self {
            storage,
            registry,
            renderer,
            dispatcher,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn registry(&self) -> &PrinterRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &PrintDispatcher {
        &self.dispatcher
    }

    pub fn renderer(&self) -> &TicketRenderer {
        &self.renderer
    }

    /// Print a new order on every auto-print kitchen printer
    ///
    /// Returns one job per printer, already settled as completed or failed.
    /// With no printer configured the ticket is still rendered (and logged
    /// at debug level) but no job is created.
    #[instrument(skip(self))]
    pub async fn on_order_created(&self, order_id: i64) -> PrintServiceResult<Vec<PrintJob>> {
        let (order, lines) = self
            .storage
            .load_ticket_lines(order_id)?
            .ok_or(PrintServiceError::OrderNotFound(order_id))?;

        let printers = self.registry.auto_print_printers(PrinterPurpose::Kitchen)?;
        if printers.is_empty() {
            let ticket = self
                .renderer
                .format_ticket(&order, &lines, PaperWidth::default());
            debug!(order_id, ticket = %ticket, "No auto-print kitchen printer, ticket not dispatched");
            return Ok(Vec::new());
        }

        let order = &order;
        let lines = &lines;
        let settled = join_all(printers.into_iter().map(|printer| async move {
            let content = self.renderer.format_ticket(order, lines, printer.paper_width);
            let job = self.storage.create_job(
                Some(order_id),
                printer.id,
                PrintJobType::Kitchen,
                &content,
            )?;
            self.dispatch_job(job, &printer).await
        }))
        .await;
        let jobs = settled.into_iter().collect::<PrintServiceResult<Vec<_>>>()?;

        let failed = jobs
            .iter()
            .filter(|j| j.status == PrintJobStatus::Failed)
            .count();
        info!(order_id, jobs = jobs.len(), failed, "Order tickets dispatched");

        Ok(jobs)
    }

    /// Print an order on one specific printer
    #[instrument(skip(self))]
    pub async fn print_order(&self, order_id: i64, printer_id: i64) -> PrintServiceResult<PrintJob> {
        let printer = self.registry.require_active(printer_id)?;
        let (order, lines) = self
            .storage
            .load_ticket_lines(order_id)?
            .ok_or(PrintServiceError::OrderNotFound(order_id))?;

        let content = self
            .renderer
            .format_ticket(&order, &lines, printer.paper_width);
        let job = self
            .storage
            .create_job(Some(order_id), printer.id, PrintJobType::Kitchen, &content)?;

        self.dispatch_job(job, &printer).await
    }

    /// Print a self-test ticket
    ///
    /// Missing or inactive printers fail before any job is created.
    #[instrument(skip(self))]
    pub async fn test_print(&self, printer_id: i64) -> PrintServiceResult<TestPrintResult> {
        let printer = self.registry.require_active(printer_id)?;

        let content = self.renderer.format_test_ticket(&printer, Utc::now());
        let job = self
            .storage
            .create_job(None, printer.id, PrintJobType::Test, &content)?;
        let job = self.dispatch_job(job, &printer).await?;

        let success = job.status == PrintJobStatus::Completed;
        Ok(TestPrintResult {
            success,
            job_id: job.id,
            error: if success { None } else { job.error_message },
        })
    }

    /// Send a job's stored content and record the outcome
    pub async fn dispatch_job(&self, job: PrintJob, printer: &Printer) -> PrintServiceResult<PrintJob> {
        match self.dispatcher.send(printer, &job.content).await {
            Ok(()) => {
                let job = self.storage.mark_completed(job.id)?;
                info!(job_id = job.id, printer_id = printer.id, "Print job completed");
                Ok(job)
            }
            Err(e) => {
                let job = self.storage.mark_failed(job.id, &e.to_string())?;
                warn!(
                    job_id = job.id,
                    printer_id = printer.id,
                    retry_count = job.retry_count,
                    error = %e,
                    "Print job failed"
                );
                Ok(job)
            }
        }
    }

    pub fn get_job(&self, job_id: u64) -> PrintServiceResult<PrintJob> {
        self.storage
            .get_job(job_id)?
            .ok_or(PrintServiceError::JobNotFound(job_id))
    }

    /// Print history, newest first
    pub fn history(
        &self,
        order_id: Option<i64>,
        limit: usize,
    ) -> PrintServiceResult<Vec<PrintJobRecord>> {
        Ok(self.storage.list_history(order_id, limit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::error::ErrorCode;
    use shared::models::{
        MenuItem, Order, OrderItem, OrderSnapshot, PrinterCreate, PrinterType,
    };

    fn service() -> PrintService {
        let storage = Storage::open_in_memory().unwrap();
        PrintService::new(
            storage.clone(),
            PrinterRegistry::new(storage),
            TicketRenderer::default(),
            Arc::new(PrintDispatcher::default()),
        )
    }

    fn simulated_printer(service: &PrintService, auto_print: bool) -> Printer {
        service
            .registry()
            .create(PrinterCreate {
                name: "Simulada".to_string(),
                printer_type: PrinterType::Other("virtual".to_string()),
                ip_address: None,
                port: None,
                device_path: None,
                paper_width: PaperWidth::Mm58,
                is_active: true,
                auto_print,
                location_id: "ilha".to_string(),
                purpose: PrinterPurpose::Kitchen,
            })
            .unwrap()
    }

    fn seed_order(service: &PrintService, order_id: i64) {
        service
            .storage()
            .upsert_menu_items(&[MenuItem {
                id: 1,
                name: "Taco de Carne".to_string(),
                category: "Tacos".to_string(),
                station: None,
            }])
            .unwrap();
        service
            .storage()
            .upsert_order(&OrderSnapshot {
                order: Order {
                    id: order_id,
                    customer_name: "Ana".to_string(),
                    customer_phone: "923000000".to_string(),
                    customer_email: None,
                    delivery_address: None,
                    order_type: "takeaway".to_string(),
                    location_id: "ilha".to_string(),
                    table_id: None,
                    status: "received".to_string(),
                    payment_method: "cash".to_string(),
                    payment_status: "pending".to_string(),
                    total_amount: Decimal::new(500000, 2),
                    notes: None,
                    estimated_delivery_time: None,
                    created_at: Utc::now(),
                },
                items: vec![OrderItem {
                    id: 1,
                    order_id,
                    menu_item_id: 1,
                    quantity: 2,
                    unit_price: Decimal::new(250000, 2),
                    customizations: vec![],
                }],
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_order_created_prints_on_auto_print_printer() {
        let service = service();
        let printer = simulated_printer(&service, true);
        simulated_printer(&service, false);
        seed_order(&service, 42);

        let jobs = service.on_order_created(42).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].printer_id, printer.id);
        assert_eq!(jobs[0].status, PrintJobStatus::Completed);
        assert!(jobs[0].content.contains("2x Taco de Carne"));
        // 58mm paper
        assert!(jobs[0].content.contains(&"-".repeat(32)));
        assert!(!jobs[0].content.contains(&"-".repeat(48)));
    }

    #[tokio::test]
    async fn test_order_created_settles_every_printer_job() {
        let service = service();
        simulated_printer(&service, true);
        let broken = service
            .registry()
            .create(PrinterCreate {
                name: "USB".to_string(),
                printer_type: PrinterType::Usb,
                ip_address: None,
                port: None,
                device_path: Some("/nonexistent/dir/lp0".to_string()),
                paper_width: PaperWidth::Mm80,
                is_active: true,
                auto_print: true,
                location_id: "ilha".to_string(),
                purpose: PrinterPurpose::Kitchen,
            })
            .unwrap();
        seed_order(&service, 42);

        let jobs = service.on_order_created(42).await.unwrap();
        assert_eq!(jobs.len(), 2);
        for job in &jobs {
            let expected = if job.printer_id == broken.id {
                PrintJobStatus::Failed
            } else {
                PrintJobStatus::Completed
            };
            assert_eq!(job.status, expected);
        }

        let history = service.history(Some(42), 50).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|r| r.status != PrintJobStatus::Pending));
    }

    #[tokio::test]
    async fn test_order_created_without_printers_creates_no_job() {
        let service = service();
        seed_order(&service, 42);

        assert!(service.on_order_created(42).await.unwrap().is_empty());
        assert!(service.history(None, 50).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let service = service();
        simulated_printer(&service, true);

        assert!(matches!(
            service.on_order_created(7).await,
            Err(PrintServiceError::OrderNotFound(7))
        ));
    }

    #[tokio::test]
    async fn test_test_print_on_missing_printer_creates_no_job() {
        let service = service();

        let err = service.test_print(9).await.unwrap_err();
        assert!(matches!(err, PrintServiceError::PrinterNotFound(9)));
        assert!(service.history(None, 50).unwrap().is_empty());

        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::PrinterNotFound);
    }

    #[tokio::test]
    async fn test_test_print_reports_failure_in_result() {
        let service = service();
        let printer = service
            .registry()
            .create(PrinterCreate {
                name: "USB".to_string(),
                printer_type: PrinterType::Usb,
                ip_address: None,
                port: None,
                device_path: Some("/nonexistent/dir/lp0".to_string()),
                paper_width: PaperWidth::Mm80,
                is_active: true,
                auto_print: false,
                location_id: "ilha".to_string(),
                purpose: PrinterPurpose::Kitchen,
            })
            .unwrap();

        let result = service.test_print(printer.id).await.unwrap();
        assert!(!result.success);
        assert!(result.error.is_some());

        let job = service.get_job(result.job_id).unwrap();
        assert_eq!(job.status, PrintJobStatus::Failed);
        assert_eq!(job.retry_count, 1);
        assert_eq!(job.order_id, None);
        assert_eq!(job.job_type, PrintJobType::Test);
    }

    #[tokio::test]
    async fn test_manual_print_requires_active_printer() {
        let service = service();
        let printer = simulated_printer(&service, false);
        seed_order(&service, 42);

        let job = service.print_order(42, printer.id).await.unwrap();
        assert_eq!(job.status, PrintJobStatus::Completed);

        service.registry().set_active(printer.id, false).unwrap();
        assert!(matches!(
            service.print_order(42, printer.id).await,
            Err(PrintServiceError::PrinterNotFound(_))
        ));
    }

    #[test]
    fn test_error_mapping() {
        let app: AppError = PrintServiceError::OrderNotFound(1).into();
        assert_eq!(app.code, ErrorCode::OrderNotFound);

        let app: AppError = PrintServiceError::Storage(StorageError::JobNotFound(3)).into();
        assert_eq!(app.code, ErrorCode::PrintJobNotFound);

        let app: AppError = PrintServiceError::Validation("bad".to_string()).into();
        assert_eq!(app.code, ErrorCode::ValidationFailed);
    }
}
