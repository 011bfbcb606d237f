//! Print dispatcher
//!
//! Delivers rendered ticket text to a physical printer. Text is transcoded
//! to Windows-1252 here, then handed to the transport matching the
//! printer's type. Sends to one printer are serialized so two tickets never
//! interleave on the same device.

use dashmap::DashMap;
use shared::models::{Printer, PrinterType};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use ticket_printer::{
    BluetoothPrinter, NetworkPrinter, PrintError, PrintResult, Printer as _, UsbPrinter,
    UsbTarget, encode_cp1252,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};

/// Default bound on one whole send
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Print(#[from] PrintError),

    #[error("Printer {printer_id} did not finish within {timeout_ms}ms")]
    Timeout { printer_id: i64, timeout_ms: u128 },

    #[error("Printer {printer_id} is misconfigured: {reason}")]
    InvalidConfig { printer_id: i64, reason: String },
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Print dispatcher
pub struct PrintDispatcher {
    timeout: Duration,
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl PrintDispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            locks: DashMap::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send ticket text to a printer
    ///
    /// Waits for any in-flight send to the same printer first; the timeout
    /// starts once this send owns the device. A device write that outlives
    /// the timeout keeps the printer locked until the write returns.
    #[instrument(skip(self, printer, content), fields(printer_id = printer.id, printer_type = %printer.printer_type, bytes = content.len()))]
    pub async fn send(&self, printer: &Printer, content: &str) -> DispatchResult<()> {
        let guard = self.lock_for(printer.id).lock_owned().await;

        let data = encode_cp1252(content);

        match tokio::time::timeout(self.timeout, self.deliver(printer, data, guard)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!(error = %e, "Print dispatch failed");
                Err(e)
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis(), "Print dispatch timed out");
                Err(DispatchError::Timeout {
                    printer_id: printer.id,
                    timeout_ms: self.timeout.as_millis(),
                })
            }
        }
    }

    /// Whether the printer currently accepts connections
    ///
    /// Simulated printers are always online; misconfigured ones never are.
    pub async fn is_online(&self, printer: &Printer) -> bool {
        match &printer.printer_type {
            PrinterType::Network => match network_printer(printer, self.timeout) {
                Ok(p) => p.is_online().await,
                Err(_) => false,
            },
            PrinterType::Usb => match device_path(printer).and_then(|d| Ok(UsbPrinter::new(d)?)) {
                Ok(p) => p.is_online().await,
                Err(_) => false,
            },
            PrinterType::Bluetooth => {
                match device_path(printer).and_then(|d| Ok(BluetoothPrinter::new(d)?)) {
                    Ok(p) => p.is_online().await,
                    Err(_) => false,
                }
            }
            PrinterType::Other(_) => true,
        }
    }

    /// Hand the bytes to the transport
    ///
    /// `guard` is held for as long as the device can still receive bytes.
    /// Async transports stop when this future is dropped; blocking device
    /// writes carry the guard onto their thread.
    async fn deliver(
        &self,
        printer: &Printer,
        data: Vec<u8>,
        guard: OwnedMutexGuard<()>,
    ) -> DispatchResult<()> {
        let bytes = data.len();
        match &printer.printer_type {
            PrinterType::Network => {
                network_printer(printer, self.timeout)?.print(&data).await?;
            }
            PrinterType::Usb => {
                let usb = UsbPrinter::new(device_path(printer)?)?;
                if matches!(usb.target(), UsbTarget::Device(_)) {
                    write_blocking(guard, move || usb.print_blocking(&data)).await?;
                } else {
                    // lp is killed if the send is abandoned
                    usb.print(&data).await?;
                }
            }
            PrinterType::Bluetooth => {
                let bt = BluetoothPrinter::new(device_path(printer)?)?;
                write_blocking(guard, move || bt.print_blocking(&data)).await?;
            }
            PrinterType::Other(kind) => {
                info!(kind = %kind, bytes, "Simulated print for unrecognized printer type");
                return Ok(());
            }
        }

        info!(bytes, "Ticket delivered");
        Ok(())
    }

    fn lock_for(&self, printer_id: i64) -> Arc<Mutex<()>> {
        self.locks
            .entry(printer_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for PrintDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DISPATCH_TIMEOUT)
    }
}

/// Run a device write on the blocking pool, releasing `guard` only when
/// the write itself returns
async fn write_blocking<F>(guard: OwnedMutexGuard<()>, write: F) -> DispatchResult<()>
where
    F: FnOnce() -> PrintResult<()> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let _guard = guard;
        write()
    })
    .await
    .map_err(|e| PrintError::Device(format!("Print task failed: {}", e)))??;
    Ok(())
}

fn network_printer(printer: &Printer, timeout: Duration) -> DispatchResult<NetworkPrinter> {
    let ip = printer
        .ip_address
        .as_deref()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .ok_or_else(|| DispatchError::InvalidConfig {
            printer_id: printer.id,
            reason: "network printer has no IP address".to_string(),
        })?;

    Ok(NetworkPrinter::new(ip, printer.port_or_default())?.with_timeout(timeout))
}

fn device_path(printer: &Printer) -> DispatchResult<&str> {
    printer
        .device_path
        .as_deref()
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .ok_or_else(|| DispatchError::InvalidConfig {
            printer_id: printer.id,
            reason: format!("{} printer has no device path", printer.printer_type),
        })
}
