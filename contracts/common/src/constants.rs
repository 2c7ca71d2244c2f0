//! Protocol Constants
//!
//! All magic numbers for the WAI basket vault, grouped by concern.

/// Share token metadata
pub mod token {
    /// Token name
    pub const NAME: &str = "WAI Basket Share";
    /// Token symbol
    pub const SYMBOL: &str = "WAI";
    /// Decimal places of the share token
    pub const DECIMALS: u8 = 18;
}

/// Fixed-point precision
pub mod precision {
    /// One unit in the 18-decimal reference unit (prices, values, shares)
    pub const ONE: u128 = 1_000_000_000_000_000_000;

    /// Decimals of the reference unit
    pub const REFERENCE_DECIMALS: u8 = 18;

    /// Largest asset precision accepted by the registry.
    /// 10^36 still leaves room for a u128 balance inside a 256-bit product.
    pub const MAX_DECIMALS: u8 = 36;
}

/// Ratio configuration (basis points, 10000 = 100%)
pub mod ratios {
    /// Basis points denominator
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Upper bound for any ratio bound and for the joint sums
    pub const MAX_RATIO_BPS: u64 = BPS_DENOMINATOR;
}

/// Fee configuration (basis points, 100 = 1%)
pub mod fees {
    /// Basis points denominator
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Highest fee accepted for issuance or redemption
    pub const MAX_FEE_BPS: u64 = BPS_DENOMINATOR;

    /// Default issuance fee (0.01%)
    pub const DEFAULT_MINT_FEE_BPS: u64 = 1;

    /// Default redemption fee (0.01%)
    pub const DEFAULT_BURN_FEE_BPS: u64 = 1;
}

/// Registry limits
pub mod limits {
    /// Maximum number of assets a basket can hold
    pub const MAX_ASSETS: usize = 32;
}
