//! Kitchen ticket renderer
//!
//! Renders an order and its resolved line items into ESC/POS ticket text.
//! Rendering is pure: the same order, lines and paper width always yield
//! the same ticket. The text stays UTF-8 here and is transcoded at dispatch.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use shared::models::{Order, PaperWidth, Printer, TicketLine};
use ticket_printer::EscPosBuilder;

use super::station::group_by_station;

/// Business name lines printed at the top of every ticket
pub const DEFAULT_HEADER_LINES: [&str; 2] = ["LAS TORTILLAS", "MEXICAN GRILL"];

/// Luanda time
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 60;

pub const DEFAULT_CURRENCY: &str = "Kz";

/// Name printed for line items whose menu entry is gone
pub const UNKNOWN_ITEM_NAME: &str = "Item desconhecido";

/// Kitchen ticket renderer
#[derive(Debug, Clone)]
pub struct TicketRenderer {
    header_lines: Vec<String>,
    offset: FixedOffset,
    currency: String,
}

impl TicketRenderer {
    /// Create a renderer
    ///
    /// An out-of-range offset falls back to UTC.
    pub fn new(header_lines: Vec<String>, utc_offset_minutes: i32, currency: &str) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());
        Self {
            header_lines,
            offset,
            currency: currency.to_string(),
        }
    }

    /// Render a kitchen ticket for an order
    pub fn format_ticket(&self, order: &Order, lines: &[TicketLine], paper_width: PaperWidth) -> String {
        let mut b = EscPosBuilder::new(paper_width.chars_per_line());
        b.init();

        self.render_header(&mut b);
        self.render_order_info(&mut b, order);
        render_customer(&mut b, order);
        render_stations(&mut b, lines);

        if let Some(notes) = order.notes.as_deref()
            && !notes.is_empty()
        {
            b.bold_line("OBSERVAÇÕES:");
            b.line(notes);
            b.separator();
        }

        self.render_summary(&mut b, order, lines);
        render_footer(&mut b);

        b.build()
    }

    /// Render a self-test ticket for a printer
    pub fn format_test_ticket(&self, printer: &Printer, now: DateTime<Utc>) -> String {
        let mut b = EscPosBuilder::new(printer.paper_width.chars_per_line());
        b.init();

        b.center();
        b.bold().double_size();
        b.line("TESTE DE IMPRESSÃO");
        b.reset_size().bold_off();
        b.left();
        b.separator();

        let local = now.with_timezone(&self.offset);
        b.line(&format!("Impressora: {}", printer.name));
        b.line(&format!("Tipo: {}", printer.printer_type.as_str().to_uppercase()));
        b.line(&format!("Papel: {}mm", printer.paper_width.mm()));
        b.line(&format!("Data: {}", local.format("%d/%m/%Y")));
        b.line(&format!("Hora: {}", local.format("%H:%M:%S")));
        b.separator();

        b.center();
        b.bold_line("IMPRESSORA FUNCIONANDO!");
        b.left();
        b.blank_lines(3);
        b.cut();

        b.build()
    }

    fn render_header(&self, b: &mut EscPosBuilder) {
        b.center();
        b.bold().double_size();
        for line in &self.header_lines {
            b.line(line);
        }
        b.reset_size().bold_off();
        b.line("Cozinha - Ticket");
        b.left();
        b.separator();
    }

    fn render_order_info(&self, b: &mut EscPosBuilder, order: &Order) {
        let created = order.created_at.with_timezone(&self.offset);

        b.bold_line(&format!("PEDIDO #{}", order.id));
        b.line(&format!("Data: {}", created.format("%d/%m/%Y")));
        b.line(&format!("Hora: {}", created.format("%H:%M:%S")));
        b.line(&format!("Tipo: {}", order_type_label(&order.order_type)));

        if order.order_type == "dine-in"
            && let Some(table_id) = order.table_id
        {
            b.line(&format!("Mesa: {}", table_id));
        }

        b.line(&format!("Local: {}", location_label(&order.location_id)));
        b.separator();
    }

    fn render_summary(&self, b: &mut EscPosBuilder, order: &Order, lines: &[TicketLine]) {
        let total_items: i64 = lines.iter().map(|l| i64::from(l.item.quantity)).sum();

        b.bold_line("RESUMO:");
        b.line(&format!("Total de itens: {}", total_items));
        b.line(&format!(
            "Valor total: {:.2} {}",
            order.total_amount, self.currency
        ));
        b.line(&format!(
            "Pagamento: {}",
            payment_method_label(&order.payment_method)
        ));

        if let Some(estimate) = order.estimated_delivery_time.as_deref()
            && !estimate.is_empty()
        {
            b.line(&format!("Estimativa: {}", estimate));
        }
    }
}

impl Default for TicketRenderer {
    fn default() -> Self {
        Self::new(
            DEFAULT_HEADER_LINES.iter().map(|s| s.to_string()).collect(),
            DEFAULT_UTC_OFFSET_MINUTES,
            DEFAULT_CURRENCY,
        )
    }
}

fn render_customer(b: &mut EscPosBuilder, order: &Order) {
    b.bold_line("CLIENTE:");
    b.line(&order.customer_name);
    b.line(&order.customer_phone);

    if order.order_type == "delivery"
        && let Some(address) = order.delivery_address.as_deref()
        && !address.is_empty()
    {
        b.line(&format!("Endereço: {}", address));
    }
    b.separator();
}

fn render_stations(b: &mut EscPosBuilder, lines: &[TicketLine]) {
    for (station, group) in group_by_station(lines) {
        b.bold_line(&format!("=== {} ===", station.ticket_label()));

        for line in group {
            let name = line
                .menu_item
                .as_ref()
                .map(|m| m.name.as_str())
                .unwrap_or(UNKNOWN_ITEM_NAME);
            b.line(&format!("{}x {}", line.item.quantity, name));

            for custom in &line.item.customizations {
                b.line(&format!("  - {}", custom));
            }
            b.newline();
        }
    }
    b.separator();
}

fn render_footer(b: &mut EscPosBuilder) {
    b.separator();
    b.center();
    b.line("Obrigado!");
    b.left();
    b.blank_lines(3);
    b.cut();
}

/// Ticket label for an order type
pub fn order_type_label(order_type: &str) -> String {
    match order_type {
        "delivery" => "ENTREGA".to_string(),
        "takeaway" => "BALCÃO".to_string(),
        "dine-in" => "MESA".to_string(),
        other => other.to_uppercase(),
    }
}

/// Ticket label for a restaurant location
pub fn location_label(location_id: &str) -> &str {
    match location_id {
        "ilha" => "Ilha de Luanda",
        "talatona" => "Talatona",
        "movel" => "Food Truck",
        other => other,
    }
}

/// Ticket label for a payment method
pub fn payment_method_label(method: &str) -> &str {
    match method {
        "cash" => "Dinheiro",
        "card" => "Cartão",
        "transfer" => "Transferência",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use shared::models::{MenuItem, OrderItem, PrinterPurpose, PrinterType};
    use ticket_printer::cmd;

    fn order() -> Order {
        Order {
            id: 42,
            customer_name: "Ana Silva".to_string(),
            customer_phone: "923456789".to_string(),
            customer_email: None,
            delivery_address: Some("Rua 1, Ilha".to_string()),
            order_type: "takeaway".to_string(),
            location_id: "ilha".to_string(),
            table_id: Some(5),
            status: "received".to_string(),
            payment_method: "cash".to_string(),
            payment_status: "pending".to_string(),
            total_amount: Decimal::new(500000, 2),
            notes: None,
            estimated_delivery_time: None,
            // 13:30:00 in Luanda
            created_at: Utc.with_ymd_and_hms(2025, 3, 9, 12, 30, 0).unwrap(),
        }
    }

    fn line(id: i64, quantity: i32, name: Option<&str>, category: &str, custom: &[&str]) -> TicketLine {
        TicketLine {
            item: OrderItem {
                id,
                order_id: 42,
                menu_item_id: id,
                quantity,
                unit_price: Decimal::new(250000, 2),
                customizations: custom.iter().map(|s| s.to_string()).collect(),
            },
            menu_item: name.map(|name| MenuItem {
                id,
                name: name.to_string(),
                category: category.to_string(),
                station: None,
            }),
        }
    }

    fn printable_lines(ticket: &str) -> Vec<String> {
        // Strip the escape sequences this renderer emits
        let mut text = ticket.to_string();
        for seq in [
            cmd::INIT,
            cmd::ALIGN_LEFT,
            cmd::ALIGN_CENTER,
            cmd::BOLD_ON,
            cmd::BOLD_OFF,
            cmd::SIZE_DOUBLE,
            cmd::SIZE_NORMAL,
            cmd::CUT_PARTIAL,
        ] {
            text = text.replace(seq, "");
        }
        text.lines().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ticket_for_takeaway_taco_order() {
        let renderer = TicketRenderer::default();
        let lines = vec![line(1, 2, Some("Taco de Carne"), "Tacos", &[])];

        let ticket = renderer.format_ticket(&order(), &lines, PaperWidth::Mm80);
        let text = printable_lines(&ticket);

        assert!(ticket.starts_with(cmd::INIT));
        assert!(ticket.ends_with(cmd::CUT_PARTIAL));

        assert!(text.contains(&"LAS TORTILLAS".to_string()));
        assert!(text.contains(&"Cozinha - Ticket".to_string()));
        assert!(text.contains(&"PEDIDO #42".to_string()));
        assert!(text.contains(&"Data: 09/03/2025".to_string()));
        assert!(text.contains(&"Hora: 13:30:00".to_string()));
        assert!(text.contains(&"Tipo: BALCÃO".to_string()));
        assert!(text.contains(&"Local: Ilha de Luanda".to_string()));
        assert!(text.contains(&"=== GRILL ===".to_string()));
        assert!(text.contains(&"2x Taco de Carne".to_string()));
        assert!(text.contains(&"Total de itens: 2".to_string()));
        assert!(text.contains(&"Valor total: 5000.00 Kz".to_string()));
        assert!(text.contains(&"Pagamento: Dinheiro".to_string()));
        assert!(text.contains(&"Obrigado!".to_string()));

        // Not dine-in, not delivery
        assert!(!text.iter().any(|l| l.starts_with("Mesa:")));
        assert!(!text.iter().any(|l| l.starts_with("Endereço:")));
        assert!(!text.iter().any(|l| l.starts_with("Estimativa:")));
        assert!(!text.contains(&"OBSERVAÇÕES:".to_string()));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let renderer = TicketRenderer::default();
        let lines = vec![line(1, 1, Some("Nachos"), "Nachos", &["sem queijo"])];

        let a = renderer.format_ticket(&order(), &lines, PaperWidth::Mm58);
        let b = renderer.format_ticket(&order(), &lines, PaperWidth::Mm58);
        assert_eq!(a, b);
    }

    #[test]
    fn test_separator_follows_paper_width() {
        let renderer = TicketRenderer::default();
        let lines = vec![line(1, 1, Some("Suco"), "Bebidas", &[])];

        let narrow = printable_lines(&renderer.format_ticket(&order(), &lines, PaperWidth::Mm58));
        let wide = printable_lines(&renderer.format_ticket(&order(), &lines, PaperWidth::Mm80));

        assert!(narrow.contains(&"-".repeat(32)));
        assert!(!narrow.contains(&"-".repeat(48)));
        assert!(wide.contains(&"-".repeat(48)));
    }

    #[test]
    fn test_conditional_blocks() {
        let renderer = TicketRenderer::default();

        let mut dine_in = order();
        dine_in.order_type = "dine-in".to_string();
        dine_in.notes = Some("Sem cebola".to_string());
        dine_in.estimated_delivery_time = Some("20 min".to_string());
        let text = printable_lines(&renderer.format_ticket(&dine_in, &[], PaperWidth::Mm80));
        assert!(text.contains(&"Tipo: MESA".to_string()));
        assert!(text.contains(&"Mesa: 5".to_string()));
        assert!(text.contains(&"OBSERVAÇÕES:".to_string()));
        assert!(text.contains(&"Sem cebola".to_string()));
        assert!(text.contains(&"Estimativa: 20 min".to_string()));
        assert!(text.contains(&"Total de itens: 0".to_string()));

        let mut delivery = order();
        delivery.order_type = "delivery".to_string();
        let text = printable_lines(&renderer.format_ticket(&delivery, &[], PaperWidth::Mm80));
        assert!(text.contains(&"Tipo: ENTREGA".to_string()));
        assert!(text.contains(&"Endereço: Rua 1, Ilha".to_string()));
        assert!(!text.iter().any(|l| l.starts_with("Mesa:")));
    }

    #[test]
    fn test_items_grouped_with_customizations() {
        let renderer = TicketRenderer::default();
        let lines = vec![
            line(1, 1, Some("Suco de Manga"), "Bebidas", &[]),
            line(2, 2, Some("Taco de Frango"), "Tacos", &["sem picante", "extra queijo"]),
            line(3, 1, None, "", &[]),
        ];

        let text = printable_lines(&renderer.format_ticket(&order(), &lines, PaperWidth::Mm80));
        let pos = |needle: &str| text.iter().position(|l| l == needle).unwrap();

        assert!(pos("=== GRILL ===") < pos("=== MONTAGEM ==="));
        assert!(pos("=== MONTAGEM ===") < pos("=== BEBIDAS ==="));
        assert!(!text.contains(&"=== FRITURA ===".to_string()));

        let taco = pos("2x Taco de Frango");
        assert_eq!(text[taco + 1], "  - sem picante");
        assert_eq!(text[taco + 2], "  - extra queijo");
        assert_eq!(text[taco + 3], "");

        assert!(pos("1x Item desconhecido") > pos("=== MONTAGEM ==="));
        assert!(text.contains(&"Total de itens: 4".to_string()));
    }

    #[test]
    fn test_labels() {
        assert_eq!(order_type_label("pickup"), "PICKUP");
        assert_eq!(location_label("movel"), "Food Truck");
        assert_eq!(location_label("benfica"), "benfica");
        assert_eq!(payment_method_label("transfer"), "Transferência");
        assert_eq!(payment_method_label("crypto"), "crypto");
    }

    #[test]
    fn test_custom_header_offset_and_currency() {
        let renderer = TicketRenderer::new(vec!["CASA".to_string()], 0, "AOA");
        let text = printable_lines(&renderer.format_ticket(&order(), &[], PaperWidth::Mm80));

        assert_eq!(text[0], "CASA");
        assert!(text.contains(&"Hora: 12:30:00".to_string()));
        assert!(text.contains(&"Valor total: 5000.00 AOA".to_string()));
    }

    #[test]
    fn test_test_ticket() {
        let renderer = TicketRenderer::default();
        let printer = Printer {
            id: 3,
            name: "Bar".to_string(),
            printer_type: PrinterType::Usb,
            ip_address: None,
            port: None,
            device_path: Some("/dev/usb/lp0".to_string()),
            paper_width: PaperWidth::Mm58,
            is_active: true,
            auto_print: false,
            location_id: "talatona".to_string(),
            purpose: PrinterPurpose::Bar,
            created_at: Utc::now(),
        };
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 8, 0, 0).unwrap();

        let ticket = renderer.format_test_ticket(&printer, now);
        let text = printable_lines(&ticket);

        assert!(text.contains(&"TESTE DE IMPRESSÃO".to_string()));
        assert!(text.contains(&"Impressora: Bar".to_string()));
        assert!(text.contains(&"Tipo: USB".to_string()));
        assert!(text.contains(&"Papel: 58mm".to_string()));
        assert!(text.contains(&"Data: 02/01/2025".to_string()));
        assert!(text.contains(&"Hora: 09:00:00".to_string()));
        assert!(text.contains(&"IMPRESSORA FUNCIONANDO!".to_string()));
        assert!(ticket.ends_with(cmd::CUT_PARTIAL));
    }
}
