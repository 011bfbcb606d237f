//! # ticket-printer
//!
//! ESC/POS thermal printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building (text based, so tickets can be stored as-is)
//! - Windows-1252 encoding for Portuguese text
//! - Network printing (raw TCP, port 9100)
//! - USB printing (device file or OS print queue)
//! - Bluetooth printing (RFCOMM serial device)
//!
//! Business logic (WHAT to print) stays in `print-server`.
//!
//! ## Example
//!
//! ```ignore
//! use ticket_printer::{EscPosBuilder, NetworkPrinter, Printer, encode_cp1252};
//!
//! let mut b = EscPosBuilder::new(48);
//! b.init();
//! b.center().bold().double_size();
//! b.line("LAS TORTILLAS");
//! b.reset_size().bold_off().left();
//! b.separator();
//! b.line("PEDIDO #42");
//! b.cut();
//!
//! let printer = NetworkPrinter::new("192.168.1.100", 9100)?;
//! printer.print(&encode_cp1252(&b.build())).await?;
//! ```

mod bluetooth;
mod encoding;
mod error;
mod escpos;
mod printer;

// Re-exports
pub use bluetooth::{BluetoothPrinter, is_valid_mac};
pub use encoding::encode_cp1252;
pub use error::{PrintError, PrintResult};
pub use escpos::{EscPosBuilder, cmd};
pub use printer::{NetworkPrinter, Printer, UsbPrinter, UsbTarget};
