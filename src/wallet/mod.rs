//! Wallet identity helpers
//!
//! Address parsing and display, plus hashing for the legacy username/password
//! credentials some users still carry.

mod address;
mod password;

pub use address::{is_wallet_address, normalize_address, shorten_address};
pub use password::{hash_password, verify_password};
