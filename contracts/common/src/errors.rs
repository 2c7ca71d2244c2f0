//! Error Types for the WAI Basket Vault
//!
//! Every rejected call maps to one stable variant. Variants carry the
//! offending values so callers can adjust and retry.

use thiserror::Error;

use crate::types::{Address, Amount, AssetId, Price};

/// Result type alias for WAI operations
pub type WaiResult<T> = Result<T, WaiError>;

/// Main error enum for all WAI basket errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaiError {
    // ============ Registry Errors ============
    /// Asset is already part of the basket
    #[error("asset {} is already supported", hex::encode(.asset))]
    DuplicateAsset { asset: AssetId },

    /// Asset is not part of the basket
    #[error("asset {} is not supported", hex::encode(.asset))]
    UnknownAsset { asset: AssetId },

    /// Ratio bounds are malformed (min > max or max > 10000)
    #[error("invalid ratio bounds: min {min_ratio} bps, max {max_ratio} bps")]
    InvalidRatioBounds { min_ratio: u64, max_ratio: u64 },

    /// Joint ratio bounds of the enabled assets cannot be satisfied
    #[error("ratio invariant violated: sum of min {sum_min} bps, sum of max {sum_max} bps")]
    RatioInvariantViolated { sum_min: u64, sum_max: u64 },

    /// Source and destination of a removal are the same asset
    #[error("cannot move asset {} into itself", hex::encode(.asset))]
    SameAsset { asset: AssetId },

    /// Asset precision outside the supported range
    #[error("unsupported decimals {decimals} (maximum {maximum})")]
    InvalidDecimals { decimals: u8, maximum: u8 },

    /// Basket holds the maximum number of assets
    #[error("basket is full ({maximum} assets)")]
    TooManyAssets { maximum: usize },

    // ============ Input Errors ============
    /// The same asset appears twice in one call
    #[error("asset {} appears more than once in the call", hex::encode(.asset))]
    DuplicateInCall { asset: AssetId },

    /// Parallel input arrays differ in length
    #[error("length mismatch: {assets} assets, {amounts} amounts")]
    LengthMismatch { assets: usize, amounts: usize },

    /// No assets were provided
    #[error("empty input")]
    EmptyInput,

    /// Zero amount not allowed
    #[error("zero amount")]
    ZeroAmount,

    /// Fee outside 0..=10000 bps
    #[error("invalid fee {fee_bps} bps")]
    InvalidFee { fee_bps: u64 },

    /// Configuration rejected
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },

    // ============ Economic Guards ============
    /// Initial mint already happened
    #[error("basket already initialized")]
    AlreadyInitialized,

    /// Initial mint has not happened yet
    #[error("basket not initialized")]
    NotInitialized,

    /// Asset is disabled or otherwise not accepted for deposits
    #[error("asset {} is not mintable", hex::encode(.asset))]
    NotMintable { asset: AssetId },

    /// A deposited asset would exceed its maximum share
    #[error("asset {} over ratio: {ratio_bps} bps > max {max_ratio} bps", hex::encode(.asset))]
    OverRatio { asset: AssetId, ratio_bps: u64, max_ratio: u64 },

    /// An untouched asset would sit below its minimum share
    #[error("asset {} under ratio: {ratio_bps} bps < min {min_ratio} bps", hex::encode(.asset))]
    UnderRatio { asset: AssetId, ratio_bps: u64, min_ratio: u64 },

    /// Price per share moved past the caller's limit
    #[error("target price moved: current {current}, limit {limit}")]
    TargetPriceMoved { current: Price, limit: Price },

    /// Basket value is zero, ratios and share price are undefined
    #[error("basket holds no value")]
    EmptyBasket,

    // ============ Collaborator Errors ============
    /// Account balance too low for a transfer or burn
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: Amount, requested: Amount },

    /// Spender allowance too low for a pull
    #[error("insufficient allowance: available {available}, requested {requested}")]
    InsufficientAllowance { available: Amount, requested: Amount },

    /// Oracle has no price for the asset
    #[error("no price available for asset {}", hex::encode(.asset))]
    NoPriceAvailable { asset: AssetId },

    /// Caller may not mint or burn shares
    #[error("account {} is not the authorized minter", hex::encode(.caller))]
    MintUnauthorized { caller: Address },

    /// Signer is not the account allowed to perform the update
    #[error("unauthorized: expected {}, got {}", hex::encode(.expected), hex::encode(.actual))]
    Unauthorized { expected: Address, actual: Address },

    /// Ledger holds less than the engine tracks
    #[error("ledger desync for asset {}: tracked {tracked}, held {held}", hex::encode(.asset))]
    LedgerDesync { asset: AssetId, tracked: Amount, held: Amount },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow occurred
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,
}

impl WaiError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateAsset { .. } => "E001_DUPLICATE_ASSET",
            Self::UnknownAsset { .. } => "E002_UNKNOWN_ASSET",
            Self::InvalidRatioBounds { .. } => "E003_INVALID_RATIO_BOUNDS",
            Self::RatioInvariantViolated { .. } => "E004_RATIO_INVARIANT",
            Self::SameAsset { .. } => "E005_SAME_ASSET",
            Self::InvalidDecimals { .. } => "E006_INVALID_DECIMALS",
            Self::TooManyAssets { .. } => "E007_TOO_MANY_ASSETS",
            Self::DuplicateInCall { .. } => "E010_DUPLICATE_IN_CALL",
            Self::LengthMismatch { .. } => "E011_LENGTH_MISMATCH",
            Self::EmptyInput => "E012_EMPTY_INPUT",
            Self::ZeroAmount => "E013_ZERO_AMOUNT",
            Self::InvalidFee { .. } => "E014_INVALID_FEE",
            Self::InvalidConfig { .. } => "E015_INVALID_CONFIG",
            Self::AlreadyInitialized => "E020_ALREADY_INITIALIZED",
            Self::NotInitialized => "E021_NOT_INITIALIZED",
            Self::NotMintable { .. } => "E022_NOT_MINTABLE",
            Self::OverRatio { .. } => "E023_OVER_RATIO",
            Self::UnderRatio { .. } => "E024_UNDER_RATIO",
            Self::TargetPriceMoved { .. } => "E025_TARGET_PRICE_MOVED",
            Self::EmptyBasket => "E026_EMPTY_BASKET",
            Self::InsufficientBalance { .. } => "E030_INSUFFICIENT_BALANCE",
            Self::InsufficientAllowance { .. } => "E031_INSUFFICIENT_ALLOWANCE",
            Self::NoPriceAvailable { .. } => "E032_NO_PRICE",
            Self::MintUnauthorized { .. } => "E033_MINT_UNAUTH",
            Self::LedgerDesync { .. } => "E034_LEDGER_DESYNC",
            Self::Unauthorized { .. } => "E035_UNAUTHORIZED",
            Self::Overflow => "E080_OVERFLOW",
            Self::Underflow => "E081_UNDERFLOW",
            Self::DivisionByZero => "E082_DIV_ZERO",
        }
    }

    /// Returns true if this error is an expected economic guard
    /// the caller can resolve by retrying with adjusted parameters
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::OverRatio { .. }
                | Self::UnderRatio { .. }
                | Self::TargetPriceMoved { .. }
                | Self::AlreadyInitialized
                | Self::NotInitialized
                | Self::NotMintable { .. }
                | Self::InsufficientBalance { .. }
                | Self::InsufficientAllowance { .. }
        )
    }

    /// Returns true if the error was raised before any state was touched
    /// because the request itself is malformed
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateAsset { .. }
                | Self::UnknownAsset { .. }
                | Self::InvalidRatioBounds { .. }
                | Self::SameAsset { .. }
                | Self::InvalidDecimals { .. }
                | Self::DuplicateInCall { .. }
                | Self::LengthMismatch { .. }
                | Self::EmptyInput
                | Self::ZeroAmount
                | Self::InvalidFee { .. }
                | Self::InvalidConfig { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let errors = [
            WaiError::DuplicateAsset { asset: [0u8; 32] },
            WaiError::UnknownAsset { asset: [0u8; 32] },
            WaiError::OverRatio {
                asset: [1u8; 32],
                ratio_bps: 7100,
                max_ratio: 7000,
            },
            WaiError::UnderRatio {
                asset: [1u8; 32],
                ratio_bps: 900,
                min_ratio: 1000,
            },
            WaiError::TargetPriceMoved { current: 10, limit: 9 },
            WaiError::ZeroAmount,
            WaiError::Overflow,
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_economic_guards_are_recoverable() {
        assert!(WaiError::AlreadyInitialized.is_recoverable());
        assert!(WaiError::TargetPriceMoved { current: 10, limit: 9 }.is_recoverable());
        assert!(!WaiError::LedgerDesync {
            asset: [2u8; 32],
            tracked: 10,
            held: 9
        }
        .is_recoverable());
        assert!(!WaiError::Overflow.is_recoverable());
    }

    #[test]
    fn test_validation_errors_are_not_guards() {
        let validation = [
            WaiError::DuplicateAsset { asset: [0u8; 32] },
            WaiError::SameAsset { asset: [0u8; 32] },
            WaiError::DuplicateInCall { asset: [0u8; 32] },
            WaiError::LengthMismatch { assets: 2, amounts: 1 },
            WaiError::EmptyInput,
            WaiError::ZeroAmount,
        ];
        for err in &validation {
            assert!(err.is_validation(), "{:?}", err);
            assert!(!err.is_recoverable(), "{:?}", err);
        }

        assert!(!WaiError::OverRatio {
            asset: [1u8; 32],
            ratio_bps: 7100,
            max_ratio: 7000
        }
        .is_validation());
        assert!(!WaiError::NotInitialized.is_validation());
        assert!(!WaiError::NoPriceAvailable { asset: [1u8; 32] }.is_validation());
    }

    #[test]
    fn test_display_includes_hex_asset() {
        let err = WaiError::UnknownAsset { asset: [0xabu8; 32] };
        let msg = err.to_string();
        assert!(msg.starts_with("asset abab"));
        assert!(msg.ends_with("is not supported"));
    }
}
