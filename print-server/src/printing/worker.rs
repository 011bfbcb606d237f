//! Auto-print worker
//!
//! Listens on the order intake channel and prints each new order. Order
//! intake only enqueues the id, so creating an order never waits on a
//! printer and never fails because of one.

use super::service::PrintService;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Capacity of the order intake channel
pub const ORDER_QUEUE_CAPACITY: usize = 256;

/// Auto-print worker
pub struct AutoPrintWorker {
    service: Arc<PrintService>,
}

impl AutoPrintWorker {
    pub fn new(service: Arc<PrintService>) -> Self {
        Self { service }
    }

    /// Run until the channel closes or shutdown is signalled
    pub async fn run(self, mut order_rx: mpsc::Receiver<i64>, shutdown: CancellationToken) {
        tracing::info!("Auto-print worker started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Auto-print worker received shutdown signal");
                    break;
                }
                order_id = order_rx.recv() => {
                    let Some(order_id) = order_id else {
                        tracing::info!("Order channel closed, auto-print worker stopping");
                        break;
                    };
                    self.handle_order(order_id).await;
                }
            }
        }
    }

    async fn handle_order(&self, order_id: i64) {
        tracing::debug!(order_id, "Auto-printing order");

        match self.service.on_order_created(order_id).await {
            Ok(jobs) if jobs.is_empty() => {
                tracing::debug!(order_id, "No kitchen printer configured for auto-print");
            }
            Ok(jobs) => {
                tracing::info!(order_id, jobs = jobs.len(), "Auto-print finished");
            }
            Err(e) => {
                tracing::error!(order_id, error = %e, "Auto-print failed");
            }
        }
    }
}
