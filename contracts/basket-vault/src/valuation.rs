//! Valuation Engine
//!
//! Values the basket from tracked balances and oracle prices. Pure: the
//! same state and prices always give the same snapshot, byte for byte.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use wai_common::{
    errors::{WaiError, WaiResult},
    interfaces::PriceOracle,
    math::{asset_value, checked_sum, ratio_bps},
    types::{AssetId, Price},
};

use crate::registry::BasketState;

// ============ Price Cache ============

/// Reads each asset price at most once for the lifetime of one call
pub struct PriceCache<'a> {
    oracle: &'a dyn PriceOracle,
    prices: BTreeMap<AssetId, Price>,
}

impl<'a> PriceCache<'a> {
    pub fn new(oracle: &'a dyn PriceOracle) -> Self {
        Self {
            oracle,
            prices: BTreeMap::new(),
        }
    }

    /// Price of `asset`, from the cache or the oracle
    pub fn get(&mut self, asset: &AssetId) -> WaiResult<Price> {
        if let Some(price) = self.prices.get(asset) {
            return Ok(*price);
        }
        let price = self.oracle.get_price(asset)?;
        self.prices.insert(*asset, price);
        Ok(price)
    }

    /// Number of distinct assets priced so far
    pub fn reads(&self) -> usize {
        self.prices.len()
    }
}

// ============ Snapshot ============

/// Valuation of one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AssetValuation {
    pub asset: AssetId,
    pub tracked_balance: u128,
    /// Zero when the balance is zero; such assets are not priced
    pub price: Price,
    /// Value in the 18-decimal reference unit
    pub value: u128,
}

/// Basket valuation for one call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ValuationSnapshot {
    pub total_value: u128,
    /// Every registered asset, in registry order
    pub assets: Vec<AssetValuation>,
}

impl ValuationSnapshot {
    pub fn value_of(&self, asset: &AssetId) -> Option<u128> {
        self.assets.iter().find(|a| a.asset == *asset).map(|a| a.value)
    }

    /// Truncated share of `asset` in basket value.
    ///
    /// Undefined (`EmptyBasket`) while the basket holds no value.
    pub fn ratio_bps(&self, asset: &AssetId) -> WaiResult<u64> {
        let value = self
            .value_of(asset)
            .ok_or(WaiError::UnknownAsset { asset: *asset })?;
        ratio_bps(value, self.total_value)
    }

    /// Ratios of every asset in registry order
    pub fn ratios(&self) -> WaiResult<Vec<u64>> {
        self.assets
            .iter()
            .map(|a| ratio_bps(a.value, self.total_value))
            .collect()
    }

    /// SHA-256 over the borsh encoding
    pub fn digest(&self) -> [u8; 32] {
        let bytes = borsh::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let result = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result);
        digest
    }
}

/// Value every asset with a non-zero tracked balance
pub fn compute_snapshot(state: &BasketState, prices: &mut PriceCache<'_>) -> WaiResult<ValuationSnapshot> {
    let mut assets = Vec::with_capacity(state.assets().len());
    for entry in state.assets() {
        let (price, value) = if entry.tracked_balance == 0 {
            (0, 0)
        } else {
            let price = prices.get(&entry.asset_id)?;
            (price, asset_value(entry.tracked_balance, price, entry.decimals)?)
        };
        assets.push(AssetValuation {
            asset: entry.asset_id,
            tracked_balance: entry.tracked_balance,
            price,
            value,
        });
    }

    let total_value = checked_sum(assets.iter().map(|a| a.value))?;
    let snapshot = ValuationSnapshot { total_value, assets };

    tracing::debug!(
        total_value,
        assets = snapshot.assets.len(),
        digest = %hex::encode(&snapshot.digest()[..8]),
        "valuation snapshot"
    );
    Ok(snapshot)
}

// ============ Ratio Report ============

/// Answer of `get_current_token_ratio`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRatioReport {
    pub total_value: u128,
    /// Every registered asset, in registry order
    pub assets: Vec<AssetId>,
    /// Truncated ratios, parallel to `assets`
    pub ratios_bps: Vec<u64>,
    /// Sum of the ratios of the enabled assets
    pub sum_of_valid_ratios: u64,
}

/// Current composition of the basket
pub fn current_token_ratio(state: &BasketState, oracle: &dyn PriceOracle) -> WaiResult<TokenRatioReport> {
    let mut prices = PriceCache::new(oracle);
    let snapshot = compute_snapshot(state, &mut prices)?;
    if snapshot.total_value == 0 {
        return Err(WaiError::EmptyBasket);
    }
    let ratios_bps = snapshot.ratios()?;

    let sum_of_valid_ratios = state
        .assets()
        .iter()
        .zip(&ratios_bps)
        .filter(|(entry, _)| entry.enabled)
        .map(|(_, ratio)| *ratio)
        .sum();

    Ok(TokenRatioReport {
        total_value: snapshot.total_value,
        assets: state.asset_ids(),
        ratios_bps,
        sum_of_valid_ratios,
    })
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use wai_common::{config::VaultConfig, constants::precision::ONE};

    const PLA: AssetId = [0xa1; 32];
    const MLK: AssetId = [0xb2; 32];
    const PCI: AssetId = [0xc3; 32];

    /// Fixed prices that count how often they are read
    struct CountingOracle {
        reads: Cell<usize>,
    }

    impl PriceOracle for CountingOracle {
        fn get_price(&self, asset: &AssetId) -> WaiResult<Price> {
            self.reads.set(self.reads.get() + 1);
            match *asset {
                PLA => Ok(15 * ONE / 10),
                MLK => Ok(2 * ONE),
                PCI => Ok(ONE),
                _ => Err(WaiError::NoPriceAvailable { asset: *asset }),
            }
        }
    }

    fn oracle() -> CountingOracle {
        CountingOracle { reads: Cell::new(0) }
    }

    fn seeded() -> BasketState {
        let mut state =
            BasketState::new(&VaultConfig::new([1u8; 32], [2u8; 32], [3u8; 32])).unwrap();
        state.insert_asset(PLA, 18, 1000, 7000).unwrap();
        state.insert_asset(MLK, 8, 1000, 7000).unwrap();
        state.insert_asset(PCI, 8, 1000, 7000).unwrap();
        state.set_tracked_balance(&PLA, 20_000 * ONE).unwrap();
        state.set_tracked_balance(&MLK, 15_000 * 100_000_000).unwrap();
        state.set_tracked_balance(&PCI, 30_000 * 100_000_000).unwrap();
        state
    }

    #[test]
    fn test_snapshot_values_mixed_decimals() {
        let oracle = oracle();
        let mut cache = PriceCache::new(&oracle);
        let snapshot = compute_snapshot(&seeded(), &mut cache).unwrap();

        assert_eq!(snapshot.total_value, 90_000 * ONE);
        assert_eq!(snapshot.value_of(&MLK), Some(30_000 * ONE));
        assert_eq!(snapshot.ratios().unwrap(), vec![3333, 3333, 3333]);
    }

    #[test]
    fn test_prices_read_once_per_call() {
        let oracle = oracle();
        let state = seeded();
        let mut cache = PriceCache::new(&oracle);

        compute_snapshot(&state, &mut cache).unwrap();
        compute_snapshot(&state, &mut cache).unwrap();

        assert_eq!(oracle.reads.get(), 3);
        assert_eq!(cache.reads(), 3);
    }

    #[test]
    fn test_zero_balance_not_priced() {
        let oracle = oracle();
        let mut state = seeded();
        let unpriced = [0xdd; 32];
        state.insert_asset(unpriced, 6, 0, 1000).unwrap();

        let mut cache = PriceCache::new(&oracle);
        let snapshot = compute_snapshot(&state, &mut cache).unwrap();
        assert_eq!(snapshot.value_of(&unpriced), Some(0));
        assert_eq!(snapshot.ratio_bps(&unpriced).unwrap(), 0);
    }

    #[test]
    fn test_missing_price_propagates() {
        let oracle = oracle();
        let mut state = seeded();
        let unpriced = [0xdd; 32];
        state.insert_asset(unpriced, 6, 0, 1000).unwrap();
        state.set_tracked_balance(&unpriced, 1).unwrap();

        let mut cache = PriceCache::new(&oracle);
        assert_eq!(
            compute_snapshot(&state, &mut cache),
            Err(WaiError::NoPriceAvailable { asset: unpriced })
        );
    }

    #[test]
    fn test_empty_basket_ratio_undefined() {
        let oracle = oracle();
        let state =
            BasketState::new(&VaultConfig::new([1u8; 32], [2u8; 32], [3u8; 32])).unwrap();
        let mut cache = PriceCache::new(&oracle);
        let snapshot = compute_snapshot(&state, &mut cache).unwrap();

        assert_eq!(snapshot.total_value, 0);
        assert_eq!(snapshot.ratio_bps(&PLA), Err(WaiError::UnknownAsset { asset: PLA }));
        assert_eq!(current_token_ratio(&state, &oracle), Err(WaiError::EmptyBasket));
    }

    #[test]
    fn test_snapshot_digest_reproducible() {
        let state = seeded();
        let first = {
            let oracle = oracle();
            let mut cache = PriceCache::new(&oracle);
            compute_snapshot(&state, &mut cache).unwrap()
        };
        let second = {
            let oracle = oracle();
            let mut cache = PriceCache::new(&oracle);
            compute_snapshot(&state, &mut cache).unwrap()
        };
        assert_eq!(first.digest(), second.digest());
    }

    #[test]
    fn test_ratio_report_sums_enabled_only() {
        let oracle = oracle();
        let mut state = seeded();
        state.set_enabled(&PCI, false).unwrap();

        let report = current_token_ratio(&state, &oracle).unwrap();
        assert_eq!(report.assets, vec![PLA, MLK, PCI]);
        assert_eq!(report.ratios_bps, vec![3333, 3333, 3333]);
        assert_eq!(report.sum_of_valid_ratios, 6666);
    }
}
