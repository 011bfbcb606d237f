//! Kitchen ticket printing
//!
//! - [`station`] - routes line items to kitchen stations
//! - [`renderer`] - renders ESC/POS ticket text
//! - [`registry`] - printer lookup and administration
//! - [`dispatcher`] - delivers tickets over network, USB or Bluetooth
//! - [`service`] - order → ticket → job → dispatch pipeline
//! - [`retry`] - re-dispatches failed jobs
//! - [`worker`] - background auto-print on new orders

pub mod dispatcher;
pub mod registry;
pub mod renderer;
pub mod retry;
pub mod service;
pub mod station;
pub mod worker;

pub use dispatcher::{DEFAULT_DISPATCH_TIMEOUT, DispatchError, DispatchResult, PrintDispatcher};
pub use registry::PrinterRegistry;
pub use renderer::TicketRenderer;
pub use retry::RetryCoordinator;
pub use service::{PrintService, PrintServiceError, PrintServiceResult};
pub use station::{classify, group_by_station};
pub use worker::{AutoPrintWorker, ORDER_QUEUE_CAPACITY};
