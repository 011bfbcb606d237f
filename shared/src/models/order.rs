//! Order, line item and menu item models
//!
//! The print service only reads these; they are replicated from the
//! ordering platform through the intake endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kitchen preparation area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Station {
    Grill,
    Fryer,
    Assembly,
    Beverages,
}

impl Station {
    /// Ticket order of the stations
    pub const ALL: [Station; 4] = [
        Station::Grill,
        Station::Fryer,
        Station::Assembly,
        Station::Beverages,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grill => "grill",
            Self::Fryer => "fryer",
            Self::Assembly => "assembly",
            Self::Beverages => "beverages",
        }
    }

    /// Heading printed above the station's items
    pub fn ticket_label(&self) -> &'static str {
        match self {
            Self::Grill => "GRILL",
            Self::Fryer => "FRITURA",
            Self::Assembly => "MONTAGEM",
            Self::Beverages => "BEBIDAS",
        }
    }
}

fn default_order_status() -> String {
    "received".to_string()
}

fn default_payment_status() -> String {
    "pending".to_string()
}

/// Order record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_address: Option<String>,
    /// "delivery" | "takeaway" | "dine-in"
    pub order_type: String,
    /// "ilha" | "talatona" | "movel"
    pub location_id: String,
    pub table_id: Option<i64>,
    #[serde(default = "default_order_status")]
    pub status: String,
    /// "cash" | "card" | "transfer"
    pub payment_method: String,
    #[serde(default = "default_payment_status")]
    pub payment_status: String,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub estimated_delivery_time: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Order line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: i32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub customizations: Vec<String>,
}

/// Menu item (only the fields printing needs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// Explicit routing; category keywords are used when absent
    #[serde(default)]
    pub station: Option<Station>,
}

/// Order with its line items, as received from the ordering platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order: Order,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Line item resolved against the menu
#[derive(Debug, Clone, PartialEq)]
pub struct TicketLine {
    pub item: OrderItem,
    /// `None` when the menu item no longer exists
    pub menu_item: Option<MenuItem>,
}
