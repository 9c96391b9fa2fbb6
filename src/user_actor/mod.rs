//! User entity: profile updates and validation.

pub mod entity;
pub mod error;

pub use error::*;
