//! Basket Registry
//!
//! Ordered set of supported assets with their ratio bounds, enabled flags
//! and tracked balances, plus the per-basket accounts and fee schedule.
//!
//! ## Joint ratio bounds
//!
//! Across enabled assets the sum of `min_ratio` may never exceed 10000 bps,
//! and the sum of `max_ratio` may never be pushed below 10000 bps by a
//! mutation that lowers it. Growing mutations (support, enable) are
//! accepted while the basket is still being assembled and its max sum has
//! not reached 10000 yet.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use wai_common::{
    config::VaultConfig,
    constants::{fees, limits, precision, ratios},
    errors::{WaiError, WaiResult},
    types::{Address, Amount, AssetId, Price},
};

// ============ Asset Entry ============

/// One supported collateral asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AssetEntry {
    pub asset_id: AssetId,
    /// Precision of the asset's ledger balance
    pub decimals: u8,
    /// Lower bound of the asset's share of basket value (bps)
    pub min_ratio: u64,
    /// Upper bound of the asset's share of basket value (bps)
    pub max_ratio: u64,
    /// Disabled assets reject deposits but are still redeemed and removable
    pub enabled: bool,
    /// Quantity the engine believes the vault account holds, native decimals
    pub tracked_balance: Amount,
}

impl AssetEntry {
    pub fn new(asset_id: AssetId, decimals: u8, min_ratio: u64, max_ratio: u64) -> Self {
        Self {
            asset_id,
            decimals,
            min_ratio,
            max_ratio,
            enabled: true,
            tracked_balance: 0,
        }
    }
}

/// Sums of the ratio bounds of the enabled assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RatioSums {
    pub sum_min: u64,
    pub sum_max: u64,
}

impl RatioSums {
    fn of(assets: &[AssetEntry]) -> Self {
        assets
            .iter()
            .filter(|a| a.enabled)
            .fold(Self::default(), |acc, a| Self {
                sum_min: acc.sum_min.saturating_add(a.min_ratio),
                sum_max: acc.sum_max.saturating_add(a.max_ratio),
            })
    }
}

/// Reject malformed per-asset bounds
pub fn validate_ratio_bounds(min_ratio: u64, max_ratio: u64) -> WaiResult<()> {
    if min_ratio > max_ratio || max_ratio > ratios::MAX_RATIO_BPS {
        return Err(WaiError::InvalidRatioBounds {
            min_ratio,
            max_ratio,
        });
    }
    Ok(())
}

/// Check the joint bounds after a mutation moved the sums from `before` to `after`
pub fn check_joint_bounds(before: RatioSums, after: RatioSums) -> WaiResult<()> {
    let min_broken = after.sum_min > ratios::MAX_RATIO_BPS;
    let max_broken = after.sum_max < ratios::MAX_RATIO_BPS && after.sum_max < before.sum_max;
    if min_broken || max_broken {
        return Err(WaiError::RatioInvariantViolated {
            sum_min: after.sum_min,
            sum_max: after.sum_max,
        });
    }
    Ok(())
}

// ============ Basket State ============

/// State of one basket, passed explicitly to every operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct BasketState {
    /// Account holding the collateral on the asset ledger
    pub vault_account: Address,
    /// Receives the initial mint and removed collateral
    pub treasury: Address,
    /// Receives issuance and redemption fees
    pub fee_sink: Address,
    /// Issuance fee (bps of minted shares)
    pub fee_mint_bps: u64,
    /// Redemption fee (bps of each payout leg)
    pub fee_burn_bps: u64,
    /// Whether the one-time initial mint happened
    pub initialized: bool,
    /// Price per share fixed by the initial mint
    pub genesis_price: Price,
    /// Supported assets in insertion order
    assets: Vec<AssetEntry>,
}

impl BasketState {
    /// Create an empty, uninitialized basket
    pub fn new(config: &VaultConfig) -> WaiResult<Self> {
        config.validate()?;
        Ok(Self {
            vault_account: config.vault_account,
            treasury: config.treasury,
            fee_sink: config.fee_sink,
            fee_mint_bps: config.fee_mint_bps,
            fee_burn_bps: config.fee_burn_bps,
            initialized: false,
            genesis_price: 0,
            assets: Vec::new(),
        })
    }

    // ============ Queries ============

    /// Supported assets in registry order
    pub fn assets(&self) -> &[AssetEntry] {
        &self.assets
    }

    /// Identifiers in registry order
    pub fn asset_ids(&self) -> Vec<AssetId> {
        self.assets.iter().map(|a| a.asset_id).collect()
    }

    pub fn entry(&self, asset: &AssetId) -> Option<&AssetEntry> {
        self.assets.iter().find(|a| a.asset_id == *asset)
    }

    /// Entry of a supported asset or `UnknownAsset`
    pub fn require(&self, asset: &AssetId) -> WaiResult<&AssetEntry> {
        self.entry(asset)
            .ok_or(WaiError::UnknownAsset { asset: *asset })
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.entry(asset).is_some()
    }

    /// Tracked balance of an asset, 0 when unknown
    pub fn token_balance(&self, asset: &AssetId) -> Amount {
        self.entry(asset).map(|a| a.tracked_balance).unwrap_or(0)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// `(fee_mint_bps, fee_burn_bps)`
    pub fn fee_ratios(&self) -> (u64, u64) {
        (self.fee_mint_bps, self.fee_burn_bps)
    }

    /// Current sums of the enabled assets' bounds
    pub fn ratio_sums(&self) -> RatioSums {
        RatioSums::of(&self.assets)
    }

    /// SHA-256 over the borsh encoding of the whole state
    pub fn digest(&self) -> [u8; 32] {
        let bytes = borsh::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let result = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result);
        digest
    }

    // ============ Registry Mutations ============

    /// Append a new enabled asset with a zero tracked balance
    pub fn insert_asset(
        &mut self,
        asset: AssetId,
        decimals: u8,
        min_ratio: u64,
        max_ratio: u64,
    ) -> WaiResult<()> {
        // 1. Validation before any state is touched
        if self.contains(&asset) {
            return Err(WaiError::DuplicateAsset { asset });
        }
        validate_ratio_bounds(min_ratio, max_ratio)?;
        if decimals > precision::MAX_DECIMALS {
            return Err(WaiError::InvalidDecimals {
                decimals,
                maximum: precision::MAX_DECIMALS,
            });
        }
        if self.assets.len() >= limits::MAX_ASSETS {
            return Err(WaiError::TooManyAssets {
                maximum: limits::MAX_ASSETS,
            });
        }

        // 2. Apply under the joint bounds
        self.apply(|assets| {
            assets.push(AssetEntry::new(asset, decimals, min_ratio, max_ratio));
            Ok(())
        })
    }

    /// Toggle the enabled flag. Returns the previous value.
    pub fn set_enabled(&mut self, asset: &AssetId, enabled: bool) -> WaiResult<bool> {
        let previous = self.require(asset)?.enabled;
        self.apply(|assets| {
            entry_mut(assets, asset)?.enabled = enabled;
            Ok(())
        })?;
        Ok(previous)
    }

    /// Replace the bounds of an asset. Returns the previous `(min, max)`.
    pub fn set_ratio_bounds(
        &mut self,
        asset: &AssetId,
        min_ratio: u64,
        max_ratio: u64,
    ) -> WaiResult<(u64, u64)> {
        let entry = self.require(asset)?;
        let previous = (entry.min_ratio, entry.max_ratio);
        validate_ratio_bounds(min_ratio, max_ratio)?;

        self.apply(|assets| {
            let entry = entry_mut(assets, asset)?;
            entry.min_ratio = min_ratio;
            entry.max_ratio = max_ratio;
            Ok(())
        })?;
        Ok(previous)
    }

    /// Delete an entry, keeping the order of the others. Returns it.
    pub fn remove_asset(&mut self, asset: &AssetId) -> WaiResult<AssetEntry> {
        let index = self
            .position(asset)
            .ok_or(WaiError::UnknownAsset { asset: *asset })?;
        let mut removed = None;
        self.apply(|assets| {
            removed = Some(assets.remove(index));
            Ok(())
        })?;
        removed.ok_or(WaiError::UnknownAsset { asset: *asset })
    }

    /// Overwrite the tracked balance of an asset
    pub fn set_tracked_balance(&mut self, asset: &AssetId, amount: Amount) -> WaiResult<()> {
        entry_mut(&mut self.assets, asset)?.tracked_balance = amount;
        Ok(())
    }

    /// Add to the tracked balance of an asset
    pub fn credit(&mut self, asset: &AssetId, amount: Amount) -> WaiResult<()> {
        let entry = entry_mut(&mut self.assets, asset)?;
        entry.tracked_balance = entry
            .tracked_balance
            .checked_add(amount)
            .ok_or(WaiError::Overflow)?;
        Ok(())
    }

    /// Subtract from the tracked balance of an asset
    pub fn debit(&mut self, asset: &AssetId, amount: Amount) -> WaiResult<()> {
        let entry = entry_mut(&mut self.assets, asset)?;
        entry.tracked_balance = entry
            .tracked_balance
            .checked_sub(amount)
            .ok_or(WaiError::Underflow)?;
        Ok(())
    }

    /// Replace the fee schedule
    pub fn set_fees(&mut self, fee_mint_bps: u64, fee_burn_bps: u64) -> WaiResult<()> {
        for fee_bps in [fee_mint_bps, fee_burn_bps] {
            if fee_bps > fees::MAX_FEE_BPS {
                return Err(WaiError::InvalidFee { fee_bps });
            }
        }
        self.fee_mint_bps = fee_mint_bps;
        self.fee_burn_bps = fee_burn_bps;
        Ok(())
    }

    fn position(&self, asset: &AssetId) -> Option<usize> {
        self.assets.iter().position(|a| a.asset_id == *asset)
    }

    /// Run `mutate` on a copy of the entries and keep it only if the
    /// joint bounds still hold
    fn apply<F>(&mut self, mutate: F) -> WaiResult<()>
    where
        F: FnOnce(&mut Vec<AssetEntry>) -> WaiResult<()>,
    {
        let before = RatioSums::of(&self.assets);
        let mut assets = self.assets.clone();
        mutate(&mut assets)?;
        check_joint_bounds(before, RatioSums::of(&assets))?;
        self.assets = assets;
        Ok(())
    }
}

fn entry_mut<'a>(assets: &'a mut [AssetEntry], asset: &AssetId) -> WaiResult<&'a mut AssetEntry> {
    assets
        .iter_mut()
        .find(|a| a.asset_id == *asset)
        .ok_or(WaiError::UnknownAsset { asset: *asset })
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    const A: AssetId = [0xa1; 32];
    const B: AssetId = [0xb2; 32];
    const C: AssetId = [0xc3; 32];

    fn basket() -> BasketState {
        BasketState::new(&VaultConfig::new([1u8; 32], [2u8; 32], [3u8; 32])).unwrap()
    }

    fn three_assets() -> BasketState {
        let mut state = basket();
        state.insert_asset(A, 18, 1000, 7000).unwrap();
        state.insert_asset(B, 8, 1000, 7000).unwrap();
        state.insert_asset(C, 8, 1000, 7000).unwrap();
        state
    }

    #[test]
    fn test_insert_preserves_order() {
        let state = three_assets();
        assert_eq!(state.asset_ids(), vec![A, B, C]);
        assert!(state.assets().iter().all(|a| a.enabled && a.tracked_balance == 0));
        assert_eq!(
            state.ratio_sums(),
            RatioSums {
                sum_min: 3000,
                sum_max: 21000
            }
        );
    }

    #[test]
    fn test_insert_duplicate() {
        let mut state = three_assets();
        assert_eq!(
            state.insert_asset(A, 18, 0, 100),
            Err(WaiError::DuplicateAsset { asset: A })
        );
    }

    #[test_case(5000, 4000 ; "min above max")]
    #[test_case(0, 10_001 ; "max above denominator")]
    fn test_invalid_bounds(min_ratio: u64, max_ratio: u64) {
        let mut state = basket();
        assert_eq!(
            state.insert_asset(A, 18, min_ratio, max_ratio),
            Err(WaiError::InvalidRatioBounds {
                min_ratio,
                max_ratio
            })
        );
        assert!(state.assets().is_empty());
    }

    #[test]
    fn test_insert_rejects_huge_decimals() {
        let mut state = basket();
        assert!(matches!(
            state.insert_asset(A, 40, 0, 100),
            Err(WaiError::InvalidDecimals { .. })
        ));
    }

    #[test]
    fn test_min_sum_cannot_exceed_denominator() {
        let mut state = basket();
        state.insert_asset(A, 18, 6000, 10_000).unwrap();
        let before = state.digest();

        assert_eq!(
            state.insert_asset(B, 18, 5000, 10_000),
            Err(WaiError::RatioInvariantViolated {
                sum_min: 11_000,
                sum_max: 20_000
            })
        );
        assert_eq!(state.digest(), before);
    }

    #[test]
    fn test_max_sum_cannot_drop_below_denominator() {
        let mut state = three_assets();
        state.set_ratio_bounds(&A, 1000, 3000).unwrap();
        state.set_ratio_bounds(&B, 1000, 3000).unwrap();

        // 3000 + 3000 + 3000 < 10000
        let result = state.set_ratio_bounds(&C, 1000, 3000);
        assert!(matches!(result, Err(WaiError::RatioInvariantViolated { .. })));
        assert_eq!(state.entry(&C).map(|e| e.max_ratio), Some(7000));
    }

    #[test]
    fn test_disable_counts_against_sums() {
        let mut state = basket();
        state.insert_asset(A, 18, 1000, 5000).unwrap();
        state.insert_asset(B, 18, 1000, 5000).unwrap();

        // Dropping B leaves sum_max at 5000
        assert!(state.set_enabled(&B, false).is_err());
        assert!(state.entry(&B).map(|e| e.enabled).unwrap_or(false));
    }

    #[test]
    fn test_enable_disable_toggle() {
        let mut state = three_assets();
        assert_eq!(state.set_enabled(&C, false).unwrap(), true);
        assert_eq!(state.set_enabled(&C, true).unwrap(), false);
        assert_eq!(
            state.set_enabled(&[9u8; 32], true),
            Err(WaiError::UnknownAsset { asset: [9u8; 32] })
        );
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut state = three_assets();
        state.credit(&B, 500).unwrap();

        let removed = state.remove_asset(&B).unwrap();
        assert_eq!(removed.tracked_balance, 500);
        assert_eq!(state.asset_ids(), vec![A, C]);
        assert_eq!(state.token_balance(&B), 0);
    }

    #[test]
    fn test_tracked_balance_arithmetic() {
        let mut state = three_assets();
        state.credit(&A, 100).unwrap();
        state.debit(&A, 40).unwrap();
        assert_eq!(state.token_balance(&A), 60);
        assert_eq!(state.debit(&A, 61), Err(WaiError::Underflow));
    }

    #[test]
    fn test_set_fees_bounds() {
        let mut state = basket();
        state.set_fees(0, 10_000).unwrap();
        assert_eq!(state.fee_ratios(), (0, 10_000));
        assert_eq!(state.set_fees(10_001, 0), Err(WaiError::InvalidFee { fee_bps: 10_001 }));
        assert_eq!(state.fee_ratios(), (0, 10_000));
    }

    #[test]
    fn test_digest_tracks_state() {
        let mut state = three_assets();
        let before = state.digest();
        assert_eq!(before, state.clone().digest());

        state.credit(&A, 1).unwrap();
        assert_ne!(before, state.digest());
    }
}
