//! Typed, cloneable handles over the store channel, one per domain.

mod macros;
pub mod order_client;
pub mod product_client;
pub mod user_client;
pub mod voucher_client;

pub use order_client::*;
pub use product_client::*;
pub use user_client::*;
pub use voucher_client::*;
