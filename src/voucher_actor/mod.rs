//! Voucher quota accounting and the reservation records that hold it.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
