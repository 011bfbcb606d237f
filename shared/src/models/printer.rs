//! Printer Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default raw TCP port for network printers
pub const DEFAULT_PRINTER_PORT: u16 = 9100;

/// Physical transport of a printer
///
/// Unknown values are preserved and treated as simulated printers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PrinterType {
    Network,
    Usb,
    Bluetooth,
    Other(String),
}

impl PrinterType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Network => "network",
            Self::Usb => "usb",
            Self::Bluetooth => "bluetooth",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for PrinterType {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "network" => Self::Network,
            "usb" => Self::Usb,
            "bluetooth" => Self::Bluetooth,
            _ => Self::Other(value),
        }
    }
}

impl From<PrinterType> for String {
    fn from(value: PrinterType) -> Self {
        match value {
            PrinterType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PrinterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paper roll width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum PaperWidth {
    Mm58,
    #[default]
    Mm80,
}

impl PaperWidth {
    /// Millimetres
    pub const fn mm(&self) -> u16 {
        match self {
            Self::Mm58 => 58,
            Self::Mm80 => 80,
        }
    }

    /// Printable characters per line in the default font
    pub const fn chars_per_line(&self) -> usize {
        match self {
            Self::Mm58 => 32,
            Self::Mm80 => 48,
        }
    }
}

impl TryFrom<u16> for PaperWidth {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            58 => Ok(Self::Mm58),
            80 => Ok(Self::Mm80),
            other => Err(format!("unsupported paper width: {}mm (expected 58 or 80)", other)),
        }
    }
}

impl From<PaperWidth> for u16 {
    fn from(value: PaperWidth) -> Self {
        value.mm()
    }
}

/// What a printer is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrinterPurpose {
    #[default]
    Kitchen,
    Bar,
    Expedite,
    Receipt,
}

impl PrinterPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kitchen => "kitchen",
            Self::Bar => "bar",
            Self::Expedite => "expedite",
            Self::Receipt => "receipt",
        }
    }
}

/// Printer entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Printer {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub printer_type: PrinterType,
    /// Network printers only
    pub ip_address: Option<String>,
    pub port: Option<u16>,
    /// USB device file or print queue; Bluetooth RFCOMM path or MAC
    pub device_path: Option<String>,
    #[serde(default)]
    pub paper_width: PaperWidth,
    pub is_active: bool,
    #[serde(alias = "autoprint")]
    pub auto_print: bool,
    pub location_id: String,
    #[serde(alias = "printer_for")]
    pub purpose: PrinterPurpose,
    pub created_at: DateTime<Utc>,
}

impl Printer {
    /// Network port, falling back to the raw printing default
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PRINTER_PORT)
    }

    /// Apply the fields present in an update payload
    pub fn apply_update(&mut self, update: PrinterUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(printer_type) = update.printer_type {
            self.printer_type = printer_type;
        }
        if let Some(ip_address) = update.ip_address {
            self.ip_address = Some(ip_address);
        }
        if let Some(port) = update.port {
            self.port = Some(port);
        }
        if let Some(device_path) = update.device_path {
            self.device_path = Some(device_path);
        }
        if let Some(paper_width) = update.paper_width {
            self.paper_width = paper_width;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        if let Some(auto_print) = update.auto_print {
            self.auto_print = auto_print;
        }
        if let Some(location_id) = update.location_id {
            self.location_id = location_id;
        }
        if let Some(purpose) = update.purpose {
            self.purpose = purpose;
        }
    }
}

fn default_true() -> bool {
    true
}

/// Create printer payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub printer_type: PrinterType,
    pub ip_address: Option<String>,
    pub port: Option<u16>,
    pub device_path: Option<String>,
    #[serde(default)]
    pub paper_width: PaperWidth,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, alias = "autoprint")]
    pub auto_print: bool,
    pub location_id: String,
    #[serde(alias = "printer_for")]
    pub purpose: PrinterPurpose,
}

/// Update printer payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrinterUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub printer_type: Option<PrinterType>,
    pub ip_address: Option<String>,
    pub port: Option<u16>,
    pub device_path: Option<String>,
    pub paper_width: Option<PaperWidth>,
    pub is_active: Option<bool>,
    #[serde(alias = "autoprint")]
    pub auto_print: Option<bool>,
    pub location_id: Option<String>,
    #[serde(alias = "printer_for")]
    pub purpose: Option<PrinterPurpose>,
}
