use thiserror::Error;

use crate::order_actor::OrderError;
use crate::product_actor::ProductError;
use crate::user_actor::UserError;
use crate::voucher_actor::VoucherError;

/// Errors raised by the document store and by the entities it holds.
///
/// Entity errors keep their own type so callers can match on the domain
/// reason (for instance an illegal order transition) after the store has
/// already rolled the transaction back.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{collection} not found: {id}")]
    NotFound { collection: &'static str, id: String },
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Product(#[from] ProductError),
    #[error(transparent)]
    Voucher(#[from] VoucherError),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Store internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// True when the failure comes from a domain rule rather than from the
    /// store itself.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::User(_) | StoreError::Product(_) | StoreError::Voucher(_) | StoreError::Order(_)
        )
    }
}
