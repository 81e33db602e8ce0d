//! Order snapshots and the lifecycle events that carry them.

use std::fmt;
use std::slice;

use serde::{Deserialize, Serialize};

use super::id::SiteOrderKey;
use super::money::{Price, Quantity};

/// Server-side order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Working,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    Hold,
    Unknown,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Working => "Working",
            Self::PartiallyFilled => "PartiallyFilled",
            Self::Filled => "Filled",
            Self::Cancelled => "Cancelled",
            Self::Rejected => "Rejected",
            Self::Hold => "Hold",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Last action applied to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Add,
    Change,
    Delete,
    Hold,
    Replace,
    Resubmit,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "Add",
            Self::Change => "Change",
            Self::Delete => "Delete",
            Self::Hold => "Hold",
            Self::Replace => "Replace",
            Self::Resubmit => "Resubmit",
        };
        f.write_str(s)
    }
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuySell {
    Buy,
    Sell,
}

impl fmt::Display for BuySell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
        })
    }
}

/// Snapshot of an order as delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub account: String,
    pub status: OrderStatus,
    pub action: OrderAction,
    pub side: BuySell,
    pub order_quantity: Quantity,
    pub working_quantity: Quantity,
    pub limit_price: Price,
    pub site_order_key: SiteOrderKey,
    pub order_number: String,
}

/// Kind of order lifecycle event, named the way the audit log shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderEventKind {
    BookDownload,
    Added,
    Updated,
    Filled,
    Rejected,
    Deleted,
    StatusUnknown,
}

impl OrderEventKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BookDownload => "OrderBookDownload",
            Self::Added => "OrderAdded",
            Self::Updated => "OrderUpdated",
            Self::Filled => "OrderFilled",
            Self::Rejected => "OrderRejected",
            Self::Deleted => "OrderDeleted",
            Self::StatusUnknown => "OrderStatusUnknown",
        }
    }
}

impl fmt::Display for OrderEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One order lifecycle event.
///
/// Updates and fills carry the order's new state. A book download is the
/// batch of existing orders delivered when the order subscription starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEvent {
    BookDownload(Vec<Order>),
    Added(Order),
    Updated(Order),
    Filled(Order),
    Rejected(Order),
    Deleted(Order),
    StatusUnknown(Order),
}

impl OrderEvent {
    /// Build a single-order event of the given kind.
    ///
    /// `BookDownload` wraps the order in a one-element batch.
    pub fn single(kind: OrderEventKind, order: Order) -> Self {
        match kind {
            OrderEventKind::BookDownload => Self::BookDownload(vec![order]),
            OrderEventKind::Added => Self::Added(order),
            OrderEventKind::Updated => Self::Updated(order),
            OrderEventKind::Filled => Self::Filled(order),
            OrderEventKind::Rejected => Self::Rejected(order),
            OrderEventKind::Deleted => Self::Deleted(order),
            OrderEventKind::StatusUnknown => Self::StatusUnknown(order),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> OrderEventKind {
        match self {
            Self::BookDownload(_) => OrderEventKind::BookDownload,
            Self::Added(_) => OrderEventKind::Added,
            Self::Updated(_) => OrderEventKind::Updated,
            Self::Filled(_) => OrderEventKind::Filled,
            Self::Rejected(_) => OrderEventKind::Rejected,
            Self::Deleted(_) => OrderEventKind::Deleted,
            Self::StatusUnknown(_) => OrderEventKind::StatusUnknown,
        }
    }

    /// Orders carried by this event, in delivery order.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        match self {
            Self::BookDownload(orders) => orders,
            Self::Added(order)
            | Self::Updated(order)
            | Self::Filled(order)
            | Self::Rejected(order)
            | Self::Deleted(order)
            | Self::StatusUnknown(order) => slice::from_ref(order),
        }
    }
}
