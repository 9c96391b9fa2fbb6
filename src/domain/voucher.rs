use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// A discount rule with a global usage quota.
///
/// `used_count` counts both reservations and final usages and never exceeds
/// `quantity`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: String,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: u64,
    pub max_discount: Option<u64>,
    pub min_order_value: Option<u64>,
    pub quantity: u32,
    pub used_count: u32,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct VoucherCreate {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: u64,
    pub max_discount: Option<u64>,
    pub min_order_value: Option<u64>,
    pub quantity: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct VoucherPatch {
    pub is_active: Option<bool>,
    pub quantity: Option<u32>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Voucher {
    /// Discount granted on an order subtotal. Never larger than the subtotal.
    pub fn discount_for(&self, subtotal: u64) -> u64 {
        let raw = match self.discount_type {
            DiscountType::Percentage => {
                let pct = subtotal.saturating_mul(self.discount_value) / 100;
                match self.max_discount {
                    Some(cap) => pct.min(cap),
                    None => pct,
                }
            }
            DiscountType::Fixed => self.discount_value,
        };
        raw.min(subtotal)
    }
}

/// Links a user, a voucher and the order it was reserved for.
///
/// `used_at == None` means the reservation is still active.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserVoucher {
    pub id: String,
    pub user_id: String,
    pub voucher_id: String,
    pub reserved_for: Option<String>,
    pub reserved_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
}

impl UserVoucher {
    pub fn is_active_for(&self, user_id: &str, payment_ref: &str) -> bool {
        self.used_at.is_none()
            && self.user_id == user_id
            && self.reserved_for.as_deref() == Some(payment_ref)
    }
}

#[derive(Debug, Clone)]
pub struct UserVoucherCreate {
    pub user_id: String,
    pub voucher_id: String,
    pub reserved_for: String,
    pub reserved_at: DateTime<Utc>,
}

/// Re-points an active reservation at another order.
#[derive(Debug, Clone)]
pub struct UserVoucherPatch {
    pub reserved_for: String,
    pub reserved_at: DateTime<Utc>,
}
