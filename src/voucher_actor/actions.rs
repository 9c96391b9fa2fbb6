use chrono::{DateTime, Utc};

/// Custom actions for Voucher entities.
#[derive(Debug, Clone)]
pub enum VoucherAction {
    /// Validates the voucher for a subtotal and reports the discount.
    Quote { subtotal: u64, at: DateTime<Utc> },
    /// Same checks as `Quote`, then takes one unit of the usage quota.
    Claim { subtotal: u64, at: DateTime<Utc> },
    /// Gives one unit of the usage quota back.
    Release,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoucherActionResult {
    Quoted { discount: u64 },
    Claimed { discount: u64, used_count: u32 },
    Released { used_count: u32 },
}

/// Custom actions for reservation records.
#[derive(Debug, Clone)]
pub enum UserVoucherAction {
    /// Turns an active reservation into a final usage.
    Finalize { at: DateTime<Utc> },
}
