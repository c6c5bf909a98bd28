//! Domain module
//!
//! Core domain types and business rules.

pub mod error;
pub mod money;

pub use error::TransferError;
pub use money::{is_valid_minor_amount, to_major_units, to_minor_units, AmountError, TransferAmount};
