//! Printer registry rows

use super::{PRINTERS_TABLE, Storage, StorageResult, next_id};
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};
use shared::models::{Printer, PrinterCreate};

const PRINTER_SEQUENCE: &str = "printers";

impl Storage {
    /// Insert a new printer, assigning its id
    pub fn create_printer(&self, data: PrinterCreate) -> StorageResult<Printer> {
        let txn = self.begin_write()?;
        let printer = {
            let id = next_id(&txn, PRINTER_SEQUENCE)? as i64;
            let printer = Printer {
                id,
                name: data.name,
                printer_type: data.printer_type,
                ip_address: data.ip_address,
                port: data.port,
                device_path: data.device_path,
                paper_width: data.paper_width,
                is_active: data.is_active,
                auto_print: data.auto_print,
                location_id: data.location_id,
                purpose: data.purpose,
                created_at: Utc::now(),
            };

            let mut table = txn.open_table(PRINTERS_TABLE)?;
            let value = serde_json::to_vec(&printer)?;
            table.insert(printer.id, value.as_slice())?;
            printer
        };
        txn.commit()?;

        Ok(printer)
    }

    /// Overwrite an existing printer row
    pub fn save_printer(&self, printer: &Printer) -> StorageResult<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(PRINTERS_TABLE)?;
            let value = serde_json::to_vec(printer)?;
            table.insert(printer.id, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Get a printer by ID
    pub fn get_printer(&self, id: i64) -> StorageResult<Option<Printer>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRINTERS_TABLE)?;

        match table.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All printers in id order
    pub fn list_printers(&self) -> StorageResult<Vec<Printer>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRINTERS_TABLE)?;

        let mut printers = Vec::new();
        for result in table.iter()? {
            let (_, guard) = result?;
            printers.push(serde_json::from_slice(guard.value())?);
        }
        Ok(printers)
    }

    /// Delete a printer, returning whether it existed
    ///
    /// Print jobs keep their `printer_id`; history shows no printer name.
    pub fn delete_printer(&self, id: i64) -> StorageResult<bool> {
        let txn = self.begin_write()?;
        let existed = {
            let mut table = txn.open_table(PRINTERS_TABLE)?;
            let removed = table.remove(id)?.is_some();
            removed
        };
        txn.commit()?;
        Ok(existed)
    }
}
