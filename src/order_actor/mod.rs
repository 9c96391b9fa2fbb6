//! Order entity, its lifecycle actions, and the multi-entity transaction
//! bodies for checkout, payment confirmation and inventory rollback.

mod actions;
pub mod checkout;
pub mod entity;
pub mod error;
pub mod rollback;

pub use actions::*;
pub use checkout::*;
pub use error::*;
pub use rollback::*;
