use thiserror::Error;

use crate::domain::{OrderEvent, OrderStatus};
use crate::error::StoreError;

/// Errors raised by the Order entity itself.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order {order_id} cannot {event} from status: {status}")]
    InvalidTransition { order_id: String, status: OrderStatus, event: OrderEvent },
    #[error("Order has no line items")]
    EmptyOrder,
    #[error("Invalid quantity {quantity} for {product_id}")]
    InvalidQuantity { product_id: String, quantity: u32 },
    #[error("Discount {discount} exceeds subtotal {subtotal}")]
    DiscountTooLarge { discount: u64, subtotal: u64 },
    #[error("Order amount overflows")]
    AmountOverflow,
}

/// Failure kinds surfaced to callers of the order operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    Forbidden,
    InvalidState,
    BadRequest,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Errors returned by checkout, lifecycle and rollback operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderServiceError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{collection} not found: {id}")]
    NotFound { collection: &'static str, id: String },
    #[error("Forbidden")]
    Forbidden,
    #[error("Cannot {event} order {order_id} with status: {status}")]
    InvalidState { order_id: String, status: OrderStatus, event: OrderEvent },
    #[error("{0}")]
    Rejected(StoreError),
    #[error("Transaction failed: {0}")]
    Transaction(StoreError),
}

impl OrderServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderServiceError::Unauthorized => ErrorKind::Unauthorized,
            OrderServiceError::NotFound { .. } => ErrorKind::NotFound,
            OrderServiceError::Forbidden => ErrorKind::Forbidden,
            OrderServiceError::InvalidState { .. } => ErrorKind::InvalidState,
            OrderServiceError::Rejected(_) => ErrorKind::BadRequest,
            OrderServiceError::Transaction(_) => ErrorKind::Internal,
        }
    }

    pub fn order_not_found(id: impl Into<String>) -> Self {
        OrderServiceError::NotFound { collection: "order", id: id.into() }
    }

    /// Classifies a store failure from a request-validating operation such
    /// as checkout: domain rejections are the caller's fault, missing rows
    /// are reported as such, everything else is internal.
    pub fn from_request(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => OrderServiceError::NotFound { collection, id },
            StoreError::Order(OrderError::InvalidTransition { order_id, status, event }) => {
                OrderServiceError::InvalidState { order_id, status, event }
            }
            other if other.is_rejection() => OrderServiceError::Rejected(other),
            other => OrderServiceError::Transaction(other),
        }
    }
}
