//! Order audit log rows.
//!
//! Mapping an order event to rows is stateless: a book download becomes one
//! row per order, every other event becomes a single row.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::domain::{Order, OrderEvent, OrderEventKind};

/// Audit log columns, in display order.
pub const AUDIT_COLUMNS: [&str; 10] = [
    "Event",
    "Account",
    "Order Status",
    "Order Action",
    "Buy/Sell",
    "Order Qty",
    "Working Qty",
    "Price",
    "SiteOrderKey",
    "Order#",
];

/// One rendered audit log entry.
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct AuditRow {
    #[tabled(rename = "Event")]
    pub event: String,
    #[tabled(rename = "Account")]
    pub account: String,
    #[tabled(rename = "Order Status")]
    pub status: String,
    #[tabled(rename = "Order Action")]
    pub action: String,
    #[tabled(rename = "Buy/Sell")]
    pub side: String,
    #[tabled(rename = "Order Qty")]
    pub order_quantity: String,
    #[tabled(rename = "Working Qty")]
    pub working_quantity: String,
    #[tabled(rename = "Price")]
    pub price: String,
    #[tabled(rename = "SiteOrderKey")]
    pub site_order_key: String,
    #[tabled(rename = "Order#")]
    pub order_number: String,
}

impl AuditRow {
    pub fn new(kind: OrderEventKind, order: &Order) -> Self {
        Self {
            event: kind.to_string(),
            account: order.account.clone(),
            status: order.status.to_string(),
            action: order.action.to_string(),
            side: order.side.to_string(),
            order_quantity: order.order_quantity.to_string(),
            working_quantity: order.working_quantity.to_string(),
            price: order.limit_price.to_string(),
            site_order_key: order.site_order_key.to_string(),
            order_number: order.order_number.clone(),
        }
    }

    /// Cell values in [`AUDIT_COLUMNS`] order.
    #[must_use]
    pub fn cells(&self) -> [&str; 10] {
        [
            &self.event,
            &self.account,
            &self.status,
            &self.action,
            &self.side,
            &self.order_quantity,
            &self.working_quantity,
            &self.price,
            &self.site_order_key,
            &self.order_number,
        ]
    }
}

/// Rows for one order event, in delivery order.
#[must_use]
pub fn rows_for(event: &OrderEvent) -> Vec<AuditRow> {
    let kind = event.kind();
    event
        .orders()
        .iter()
        .map(|order| AuditRow::new(kind, order))
        .collect()
}

/// Append-only audit log.
#[derive(Debug, Default, Clone)]
pub struct AuditLog {
    rows: Vec<AuditRow>,
}

impl AuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, row: AuditRow) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn rows(&self) -> &[AuditRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the whole log as a table.
    #[must_use]
    pub fn render(&self) -> String {
        let mut table = Table::new(&self.rows);
        table.with(Style::sharp());
        table.to_string()
    }
}
