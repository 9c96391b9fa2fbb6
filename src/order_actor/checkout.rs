use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{
    subtotal_of, LineItem, Order, OrderCreate, OrderEvent, Product, UserVoucher, UserVoucherCreate, UserVoucherPatch, Voucher,
};
use crate::error::StoreError;
use crate::product_actor::ProductAction;
use crate::store::Transaction;
use crate::voucher_actor::{UserVoucherAction, VoucherAction, VoucherActionResult, VoucherError};
use super::{OrderAction, OrderError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<LineRequest>,
    #[serde(default)]
    pub voucher_code: Option<String>,
}

/// Reference the payment provider will report back with.
pub fn new_payment_ref() -> String {
    format!("pi_{}", Uuid::new_v4().simple())
}

/// Reserves stock for every line, claims the voucher if one is given, and
/// creates the pending order. Any failure aborts all of it.
pub fn place_order_tx(
    tx: &mut Transaction<'_>,
    user_id: String,
    request: CheckoutRequest,
    payment_ref: String,
    now: DateTime<Utc>,
) -> Result<Order, StoreError> {
    if request.items.is_empty() {
        return Err(OrderError::EmptyOrder.into());
    }

    let mut items = Vec::with_capacity(request.items.len());
    for line in request.items {
        if line.quantity == 0 {
            return Err(OrderError::InvalidQuantity { product_id: line.product_id, quantity: 0 }.into());
        }
        let product = tx.get::<Product>(&line.product_id)?;
        tx.apply::<Product>(&product.id, ProductAction::ReserveStock(line.quantity))?;
        debug!(product_id = %product.id, quantity = line.quantity, "Stock reserved");
        items.push(LineItem {
            product_id: product.id,
            name: product.name,
            quantity: line.quantity,
            price: product.price,
        });
    }

    let subtotal = subtotal_of(&items).ok_or(OrderError::AmountOverflow)?;
    let (discount, voucher_id) = match request.voucher_code {
        Some(code) => {
            let (discount, voucher_id) = reserve_voucher(tx, &user_id, &code, subtotal, &payment_ref, now)?;
            (discount, Some(voucher_id))
        }
        None => (0, None),
    };

    let order_id = tx.create::<Order>(OrderCreate {
        user_id,
        items,
        payment_ref,
        discount,
        voucher_id,
        created_at: now,
    })?;
    tx.get::<Order>(&order_id)
}

/// Claims one unit of the voucher quota for this order and records the
/// reservation. A user holds at most one reservation per voucher; an active
/// one is moved to the new order instead of claiming a second unit.
fn reserve_voucher(
    tx: &mut Transaction<'_>,
    user_id: &str,
    code: &str,
    subtotal: u64,
    payment_ref: &str,
    now: DateTime<Utc>,
) -> Result<(u64, String), StoreError> {
    let voucher = tx
        .find_first::<Voucher>(|v| v.code == code)
        .ok_or_else(|| StoreError::NotFound { collection: "voucher", id: code.to_string() })?;
    let existing = tx.find_first::<UserVoucher>(|r| r.user_id == user_id && r.voucher_id == voucher.id);

    if let Some(reservation) = &existing {
        if reservation.used_at.is_some() {
            return Err(VoucherError::AlreadyUsed(code.to_string()).into());
        }
        // Hand the held unit back so the claim below re-validates without
        // counting this user twice.
        tx.apply::<Voucher>(&voucher.id, VoucherAction::Release)?;
    }

    let discount = match tx.apply::<Voucher>(&voucher.id, VoucherAction::Claim { subtotal, at: now })? {
        VoucherActionResult::Claimed { discount, .. } => discount,
        other => return Err(StoreError::Internal(format!("unexpected voucher result: {other:?}"))),
    };

    match existing {
        Some(reservation) => {
            tx.update::<UserVoucher>(
                &reservation.id,
                UserVoucherPatch { reserved_for: payment_ref.to_string(), reserved_at: now },
            )?;
        }
        None => {
            tx.create::<UserVoucher>(UserVoucherCreate {
                user_id: user_id.to_string(),
                voucher_id: voucher.id.clone(),
                reserved_for: payment_ref.to_string(),
                reserved_at: now,
            })?;
        }
    }
    Ok((discount, voucher.id))
}

/// Moves the order to `confirmed` and turns its voucher reservation into a
/// final usage.
pub fn confirm_payment_tx(tx: &mut Transaction<'_>, order_id: &str, now: DateTime<Utc>) -> Result<Order, StoreError> {
    let order = tx.get::<Order>(order_id)?;
    tx.apply::<Order>(order_id, OrderAction::Advance(OrderEvent::ConfirmPayment))?;

    if let Some(reservation) = tx.find_first::<UserVoucher>(|r| r.is_active_for(&order.user_id, &order.payment_ref)) {
        tx.apply::<UserVoucher>(&reservation.id, UserVoucherAction::Finalize { at: now })?;
        debug!(reservation_id = %reservation.id, "Voucher usage finalized");
    }
    tx.get::<Order>(order_id)
}

pub fn advance_tx(tx: &mut Transaction<'_>, order_id: &str, event: OrderEvent) -> Result<Order, StoreError> {
    tx.apply::<Order>(order_id, OrderAction::Advance(event))?;
    tx.get::<Order>(order_id)
}
