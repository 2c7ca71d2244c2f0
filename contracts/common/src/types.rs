//! Core Types for the WAI Basket Vault
//!
//! Fundamental aliases and small value types shared by every crate.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Type alias for account addresses (32-byte hash)
pub type Address = [u8; 32];

/// Type alias for asset identifiers (address-equivalent)
pub type AssetId = [u8; 32];

/// Quantity of an asset in its native decimals, or of WAI shares
pub type Amount = u128;

/// 18-decimal fixed-point price in the reference unit
pub type Price = u128;

/// The all-zero address, never a valid account
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Who is calling and when
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CallContext {
    /// Account whose funds move
    pub caller: Address,
    /// Unix timestamp (seconds) stamped on emitted events
    pub timestamp: u64,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }
}

/// One `(asset, amount)` leg of a deposit or payout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AssetAmount {
    pub asset: AssetId,
    pub amount: Amount,
}

impl AssetAmount {
    pub fn new(asset: AssetId, amount: Amount) -> Self {
        Self { asset, amount }
    }
}

/// Returns the short hex form of an id, used in log fields
pub fn short_hex(id: &[u8; 32]) -> String {
    hex::encode(&id[..4])
}
