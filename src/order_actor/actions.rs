use chrono::{DateTime, Utc};

use crate::domain::{OrderEvent, OrderStatus};

/// Custom actions for Order entities.
///
/// Both variants are conditional writes: they only apply when the order's
/// current status accepts the event in the transition table.
#[derive(Debug, Clone)]
pub enum OrderAction {
    Advance(OrderEvent),
    /// `RollbackInventory` transition that also records why and when.
    Cancel { reason: String, at: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderActionResult {
    Transitioned { from: OrderStatus, to: OrderStatus },
}
