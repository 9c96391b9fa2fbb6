use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum VoucherError {
    #[error("Voucher {0} is not active")]
    Inactive(String),
    #[error("Voucher {0} has not started yet")]
    NotStarted(String),
    #[error("Voucher {0} has expired")]
    Expired(String),
    #[error("Voucher {0} is out of stock")]
    OutOfStock(String),
    #[error("Minimum order value is {minimum}, got {subtotal}")]
    BelowMinimum { minimum: u64, subtotal: u64 },
    #[error("Voucher {0} already used by this user")]
    AlreadyUsed(String),
    #[error("Voucher {0} has no claimed usage to release")]
    NotClaimed(String),
    #[error("Reservation {0} is already finalized")]
    AlreadyFinalized(String),
    #[error("Voucher validation error: {0}")]
    ValidationError(String),
}
