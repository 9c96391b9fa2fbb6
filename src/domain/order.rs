use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Canceled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        };
        f.write_str(name)
    }
}

/// Something that happens to an order and may move it to another status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    /// Payment went through; the voucher reservation becomes a final usage.
    ConfirmPayment,
    /// The order was fulfilled.
    Complete,
    /// The order will not proceed; stock and voucher usage are given back.
    RollbackInventory,
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderEvent::ConfirmPayment => "confirm_payment",
            OrderEvent::Complete => "complete",
            OrderEvent::RollbackInventory => "rollback_inventory",
        };
        f.write_str(name)
    }
}

/// Every legal `(from, event) -> to` move. Anything absent is rejected.
pub const TRANSITIONS: &[(OrderStatus, OrderEvent, OrderStatus)] = &[
    (OrderStatus::Pending, OrderEvent::ConfirmPayment, OrderStatus::Confirmed),
    (OrderStatus::Pending, OrderEvent::RollbackInventory, OrderStatus::Canceled),
    (OrderStatus::Confirmed, OrderEvent::Complete, OrderStatus::Completed),
];

impl OrderStatus {
    /// Looks up the status reached from `self` on `event`.
    pub fn next(self, event: OrderEvent) -> Option<OrderStatus> {
        TRANSITIONS
            .iter()
            .find(|(from, on, _)| *from == self && *on == event)
            .map(|(_, _, to)| *to)
    }

    pub fn accepts(self, event: OrderEvent) -> bool {
        self.next(event).is_some()
    }
}

/// One product line of an order, with name and price captured at checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: u64,
}

impl LineItem {
    /// `None` when price times quantity does not fit in a `u64`.
    pub fn total(&self) -> Option<u64> {
        self.price.checked_mul(u64::from(self.quantity))
    }
}

/// Sum of the line totals, `None` on overflow.
pub fn subtotal_of(items: &[LineItem]) -> Option<u64> {
    items.iter().try_fold(0u64, |sum, item| sum.checked_add(item.total()?))
}

/// Represents a customer order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<LineItem>,
    pub status: OrderStatus,
    pub payment_ref: String,
    pub subtotal: u64,
    pub discount: u64,
    pub amount: u64,
    pub voucher_id: Option<String>,
    pub cancel_reason: Option<String>,
    pub cancel_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a new order.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub user_id: String,
    pub items: Vec<LineItem>,
    pub payment_ref: String,
    pub discount: u64,
    pub voucher_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
