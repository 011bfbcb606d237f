//! Printer registry
//!
//! Read side used by the print pipeline (active printers, auto-print
//! printers, single active printer) plus the administrative surface the
//! ordering platform replicates printers through.

use super::service::{PrintServiceError, PrintServiceResult};
use crate::db::Storage;
use shared::models::{Printer, PrinterCreate, PrinterPurpose, PrinterType, PrinterUpdate};
use std::net::IpAddr;
use ticket_printer::is_valid_mac;

/// Printer registry
#[derive(Clone)]
pub struct PrinterRegistry {
    storage: Storage,
}

impl PrinterRegistry {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Active printers at a location, optionally narrowed to one purpose
    pub fn active_printers(
        &self,
        location_id: &str,
        purpose: Option<PrinterPurpose>,
    ) -> PrintServiceResult<Vec<Printer>> {
        Ok(self
            .storage
            .list_printers()?
            .into_iter()
            .filter(|p| p.is_active && p.location_id == location_id)
            .filter(|p| purpose.is_none_or(|purpose| p.purpose == purpose))
            .collect())
    }

    /// Active auto-print printers for a purpose, at any location
    pub fn auto_print_printers(&self, purpose: PrinterPurpose) -> PrintServiceResult<Vec<Printer>> {
        Ok(self
            .storage
            .list_printers()?
            .into_iter()
            .filter(|p| p.is_active && p.auto_print && p.purpose == purpose)
            .collect())
    }

    /// A printer that exists and is active
    pub fn require_active(&self, printer_id: i64) -> PrintServiceResult<Printer> {
        match self.storage.get_printer(printer_id)? {
            Some(printer) if printer.is_active => Ok(printer),
            _ => Err(PrintServiceError::PrinterNotFound(printer_id)),
        }
    }

    pub fn get(&self, printer_id: i64) -> PrintServiceResult<Printer> {
        self.storage
            .get_printer(printer_id)?
            .ok_or(PrintServiceError::PrinterNotFound(printer_id))
    }

    /// Every printer, active or not
    pub fn list(&self) -> PrintServiceResult<Vec<Printer>> {
        Ok(self.storage.list_printers()?)
    }

    pub fn create(&self, data: PrinterCreate) -> PrintServiceResult<Printer> {
        validate_transport(
            &data.printer_type,
            data.ip_address.as_deref(),
            data.port,
            data.device_path.as_deref(),
        )?;
        let printer = self.storage.create_printer(data)?;
        tracing::info!(printer_id = printer.id, name = %printer.name, printer_type = %printer.printer_type, "Printer created");
        Ok(printer)
    }

    /// Apply a partial update; the merged result must still be valid
    pub fn update(&self, printer_id: i64, update: PrinterUpdate) -> PrintServiceResult<Printer> {
        let mut printer = self.get(printer_id)?;
        printer.apply_update(update);
        validate_transport(
            &printer.printer_type,
            printer.ip_address.as_deref(),
            printer.port,
            printer.device_path.as_deref(),
        )?;
        self.storage.save_printer(&printer)?;
        tracing::info!(printer_id, "Printer updated");
        Ok(printer)
    }

    pub fn set_active(&self, printer_id: i64, is_active: bool) -> PrintServiceResult<Printer> {
        let mut printer = self.get(printer_id)?;
        printer.is_active = is_active;
        self.storage.save_printer(&printer)?;
        tracing::info!(printer_id, is_active, "Printer active flag changed");
        Ok(printer)
    }

    pub fn delete(&self, printer_id: i64) -> PrintServiceResult<()> {
        if !self.storage.delete_printer(printer_id)? {
            return Err(PrintServiceError::PrinterNotFound(printer_id));
        }
        tracing::info!(printer_id, "Printer deleted");
        Ok(())
    }
}

/// Check that a printer carries what its transport needs
///
/// Network printers need an IP address literal and a non-zero port (if
/// set); USB printers need a device path or queue name; Bluetooth printers
/// need an RFCOMM device path or a MAC address. Other types are simulated
/// and need nothing.
pub fn validate_transport(
    printer_type: &PrinterType,
    ip_address: Option<&str>,
    port: Option<u16>,
    device_path: Option<&str>,
) -> PrintServiceResult<()> {
    match printer_type {
        PrinterType::Network => {
            let ip = non_empty(ip_address).ok_or_else(|| {
                PrintServiceError::Validation("network printer requires ip_address".to_string())
            })?;
            if ip.parse::<IpAddr>().is_err() {
                return Err(PrintServiceError::Validation(format!(
                    "ip_address '{}' is not a valid IP address",
                    ip
                )));
            }
            if port == Some(0) {
                return Err(PrintServiceError::Validation(
                    "port must be between 1 and 65535".to_string(),
                ));
            }
        }
        PrinterType::Usb => {
            non_empty(device_path).ok_or_else(|| {
                PrintServiceError::Validation("usb printer requires device_path".to_string())
            })?;
        }
        PrinterType::Bluetooth => {
            let device = non_empty(device_path).ok_or_else(|| {
                PrintServiceError::Validation("bluetooth printer requires device_path".to_string())
            })?;
            if !device.starts_with('/') && !is_valid_mac(device) {
                return Err(PrintServiceError::Validation(format!(
                    "device_path '{}' is neither a device path nor a MAC address",
                    device
                )));
            }
        }
        PrinterType::Other(_) => {}
    }
    Ok(())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
