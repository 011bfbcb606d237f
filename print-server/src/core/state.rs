use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result};
use crate::db::Storage;
use crate::printing::{
    AutoPrintWorker, ORDER_QUEUE_CAPACITY, PrintDispatcher, PrintService, PrinterRegistry,
    RetryCoordinator, TicketRenderer,
};

/// Server state - shared handles to every service
///
/// Cheap to clone; all clones share the same services.
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | Configuration (immutable) |
/// | storage | Embedded redb database |
/// | service | Print pipeline |
/// | retry | Retry coordinator |
/// | order_tx | Intake queue feeding the auto-print worker |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub storage: Storage,
    pub service: Arc<PrintService>,
    pub retry: RetryCoordinator,
    pub order_tx: mpsc::Sender<i64>,
    order_rx: Arc<Mutex<Option<mpsc::Receiver<i64>>>>,
}

impl ServerState {
    /// Open the database under the working directory and build the services
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let storage = Storage::open(config.db_path())?;
        tracing::info!(path = %config.db_path().display(), "Print database opened");
        Self::with_storage(config.clone(), storage)
    }

    /// Build the services on an already opened database
    ///
    /// Jobs a previous process left `pending` are failed here so the retry
    /// sweep picks them up.
    pub fn with_storage(config: Config, storage: Storage) -> Result<Self> {
        let recovered = storage.recover_interrupted()?;
        if recovered > 0 {
            tracing::warn!(recovered, "Marked interrupted print jobs as failed");
        }

        let renderer = TicketRenderer::new(
            config.ticket_header.clone(),
            config.ticket_utc_offset_minutes,
            &config.ticket_currency,
        );
        let dispatcher = Arc::new(PrintDispatcher::new(config.dispatch_timeout()));
        let service = Arc::new(PrintService::new(
            storage.clone(),
            PrinterRegistry::new(storage.clone()),
            renderer,
            dispatcher,
        ));
        let retry = RetryCoordinator::new(service.clone());
        let (order_tx, order_rx) = mpsc::channel(ORDER_QUEUE_CAPACITY);

        Ok(Self {
            config,
            storage,
            service,
            retry,
            order_tx,
            order_rx: Arc::new(Mutex::new(Some(order_rx))),
        })
    }

    pub fn registry(&self) -> &PrinterRegistry {
        self.service.registry()
    }

    /// Queue an order for auto-print
    ///
    /// Never blocks; a full or closed queue is logged and the order is left
    /// for a manual print.
    pub fn enqueue_order(&self, order_id: i64) {
        if let Err(e) = self.order_tx.try_send(order_id) {
            tracing::warn!(order_id, error = %e, "Auto-print queue unavailable, order not queued");
        }
    }

    /// Start the auto-print worker and the periodic retry sweep
    ///
    /// The worker can only be started once per state.
    pub async fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        match self.order_rx.lock().await.take() {
            Some(order_rx) => {
                let worker = AutoPrintWorker::new(self.service.clone());
                let shutdown = tasks.shutdown_token();
                tasks.spawn(
                    "auto_print_worker",
                    TaskKind::Worker,
                    worker.run(order_rx, shutdown),
                );
            }
            None => tracing::warn!("Auto-print worker already started"),
        }

        match self.config.retry_interval() {
            Some(interval) => {
                let shutdown = tasks.shutdown_token();
                tasks.spawn(
                    "print_retry",
                    TaskKind::Periodic,
                    self.retry.clone().run_periodic(interval, shutdown),
                );
            }
            None => tracing::info!("Periodic print retry disabled"),
        }

        tasks.log_summary();
        tasks
    }
}
