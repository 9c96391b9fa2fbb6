use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::{Caller, LineItem, Order, OrderEvent, Product, UserVoucher, Voucher};
use crate::error::StoreError;
use crate::product_actor::ProductAction;
use crate::store::Transaction;
use crate::voucher_actor::VoucherAction;
use super::{OrderAction, OrderError, OrderServiceError};

pub const DEFAULT_CANCEL_REASON: &str = "Payment failed - inventory restored";

/// What to do when a line item points at a product that no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingProductPolicy {
    /// Abort the rollback; the order stays pending.
    #[default]
    Fail,
    /// Log the line and restore the others.
    Skip,
}

impl FromStr for MissingProductPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(MissingProductPolicy::Fail),
            "skip" => Ok(MissingProductPolicy::Skip),
            other => Err(format!("expected `fail` or `skip`, got `{other}`")),
        }
    }
}

impl fmt::Display for MissingProductPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingProductPolicy::Fail => f.write_str("fail"),
            MissingProductPolicy::Skip => f.write_str("skip"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollbackSettings {
    pub missing_product_policy: MissingProductPolicy,
    pub default_reason: String,
}

impl Default for RollbackSettings {
    fn default() -> Self {
        Self {
            missing_product_policy: MissingProductPolicy::default(),
            default_reason: DEFAULT_CANCEL_REASON.to_string(),
        }
    }
}

impl RollbackSettings {
    pub fn reason_or_default(&self, reason: Option<String>) -> String {
        reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| self.default_reason.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollbackOutcome {
    pub order: Order,
    /// Lines whose quantity went back into stock.
    pub restored_items: Vec<LineItem>,
    pub skipped_products: Vec<String>,
    pub voucher_rolled_back: bool,
}

/// Result of putting an order's lines back into stock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoredInventory {
    pub restored: Vec<LineItem>,
    pub skipped: Vec<String>,
}

/// Checks made before the transaction: caller, ownership, and whether the
/// transition table lets the order roll back at all. The transaction checks
/// the status again as part of its write.
pub fn check_rollback_allowed(caller: Option<&Caller>, order: &Order) -> Result<(), OrderServiceError> {
    let caller = caller.ok_or(OrderServiceError::Unauthorized)?;
    if !caller.may_act_for(&order.user_id) {
        return Err(OrderServiceError::Forbidden);
    }
    if !order.status.accepts(OrderEvent::RollbackInventory) {
        return Err(OrderServiceError::InvalidState {
            order_id: order.id.clone(),
            status: order.status,
            event: OrderEvent::RollbackInventory,
        });
    }
    Ok(())
}

/// Cancels a pending order and gives back its stock and voucher usage.
///
/// The cancel transition runs first and fails unless the order is still
/// pending at this point, so of two concurrent rollbacks only one commits.
pub fn rollback_tx(
    tx: &mut Transaction<'_>,
    order_id: &str,
    reason: String,
    policy: MissingProductPolicy,
    at: DateTime<Utc>,
) -> Result<RollbackOutcome, StoreError> {
    tx.apply::<Order>(order_id, OrderAction::Cancel { reason, at })?;
    let order = tx.get::<Order>(order_id)?;

    let inventory = restore_inventory(tx, &order.items, policy)?;
    let voucher_rolled_back = unwind_voucher_reservation(tx, &order.user_id, &order.payment_ref)?;

    Ok(RollbackOutcome {
        order,
        restored_items: inventory.restored,
        skipped_products: inventory.skipped,
        voucher_rolled_back,
    })
}

/// Products missing under [`MissingProductPolicy::Skip`] land in
/// `skipped` instead of `restored`.
pub fn restore_inventory(
    tx: &mut Transaction<'_>,
    items: &[LineItem],
    policy: MissingProductPolicy,
) -> Result<RestoredInventory, StoreError> {
    let mut inventory = RestoredInventory::default();
    for item in items {
        match tx.apply::<Product>(&item.product_id, ProductAction::RestoreStock(item.quantity)) {
            Ok(_) => {
                debug!(product_id = %item.product_id, quantity = item.quantity, "Stock restored");
                inventory.restored.push(item.clone());
            }
            Err(StoreError::NotFound { .. }) if policy == MissingProductPolicy::Skip => {
                warn!(product_id = %item.product_id, quantity = item.quantity, "Product gone, stock not restored");
                inventory.skipped.push(item.product_id.clone());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(inventory)
}

/// Deletes the active reservation made for `payment_ref` and releases its
/// unit of quota. Returns whether there was one.
pub fn unwind_voucher_reservation(
    tx: &mut Transaction<'_>,
    user_id: &str,
    payment_ref: &str,
) -> Result<bool, StoreError> {
    let Some(reservation) = tx.find_first::<UserVoucher>(|r| r.is_active_for(user_id, payment_ref)) else {
        return Ok(false);
    };
    tx.delete::<UserVoucher>(&reservation.id)?;
    tx.apply::<Voucher>(&reservation.voucher_id, VoucherAction::Release)?;
    debug!(voucher_id = %reservation.voucher_id, "Voucher reservation rolled back");
    Ok(true)
}

/// Maps a failed rollback transaction onto the caller-facing taxonomy. Only
/// a lost race on the status is a state error; everything else is internal.
pub fn classify_rollback_failure(err: StoreError) -> OrderServiceError {
    match err {
        StoreError::Order(OrderError::InvalidTransition { order_id, status, event }) => {
            OrderServiceError::InvalidState { order_id, status, event }
        }
        other => OrderServiceError::Transaction(other),
    }
}
