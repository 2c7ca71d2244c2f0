//! Price Oracle
//!
//! Provides per-asset prices for the WAI basket vault in the 18-decimal
//! reference unit. Uses a trusted operator model: one operator writes
//! prices, one admin may replace the operator.
//!
//! Feeds quoted with another precision (e.g. 8-decimal feeds) are
//! normalized on write, so readers always see 18 decimals.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use wai_common::{
    constants::precision::{MAX_DECIMALS, REFERENCE_DECIMALS},
    errors::{WaiError, WaiResult},
    interfaces::PriceOracle,
    math::pow10,
    types::{short_hex, Address, AssetId, Price},
};

// ============ Oracle State ============

/// Last price written for one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PriceData {
    /// Price of one whole unit (18 decimals)
    pub price: Price,
    /// Timestamp of the update
    pub updated_at: u64,
}

/// Oracle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct OracleState {
    /// Authorized operator (can update prices)
    pub operator: Address,
    /// Admin (can change operator)
    pub admin: Address,
    /// Current prices by asset
    pub prices: BTreeMap<AssetId, PriceData>,
}

impl OracleState {
    /// Create an oracle with no prices
    pub fn new(admin: Address, operator: Address) -> Self {
        Self {
            operator,
            admin,
            prices: BTreeMap::new(),
        }
    }
}

// ============ Oracle ============

/// Operator-maintained price table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplePriceOracle {
    state: OracleState,
}

impl SimplePriceOracle {
    pub fn new(admin: Address, operator: Address) -> Self {
        Self {
            state: OracleState::new(admin, operator),
        }
    }

    /// Restore from persisted state
    pub fn from_state(state: OracleState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &OracleState {
        &self.state
    }

    /// Write an 18-decimal price
    pub fn set_price(
        &mut self,
        signer: &Address,
        asset: &AssetId,
        price: Price,
        timestamp: u64,
    ) -> WaiResult<()> {
        // 1. Only operator can update prices
        if *signer != self.state.operator {
            return Err(WaiError::Unauthorized {
                expected: self.state.operator,
                actual: *signer,
            });
        }

        // 2. Price must be positive
        if price == 0 {
            return Err(WaiError::ZeroAmount);
        }

        let old_price = self.state.prices.get(asset).map(|p| p.price);
        self.state.prices.insert(
            *asset,
            PriceData {
                price,
                updated_at: timestamp,
            },
        );

        tracing::info!(
            asset = %short_hex(asset),
            ?old_price,
            new_price = price,
            "price updated"
        );
        Ok(())
    }

    /// Write a price quoted with `feed_decimals`, normalized to 18 decimals
    pub fn set_feed_price(
        &mut self,
        signer: &Address,
        asset: &AssetId,
        raw_price: u128,
        feed_decimals: u8,
        timestamp: u64,
    ) -> WaiResult<()> {
        let price = convert_price_decimals(raw_price, feed_decimals, REFERENCE_DECIMALS)?;
        self.set_price(signer, asset, price, timestamp)
    }

    /// Drop the feed of an asset
    pub fn remove_price(&mut self, signer: &Address, asset: &AssetId) -> WaiResult<()> {
        if *signer != self.state.operator {
            return Err(WaiError::Unauthorized {
                expected: self.state.operator,
                actual: *signer,
            });
        }
        if self.state.prices.remove(asset).is_none() {
            return Err(WaiError::NoPriceAvailable { asset: *asset });
        }
        Ok(())
    }

    /// Replace the operator (admin only)
    pub fn set_operator(&mut self, signer: &Address, new_operator: &Address) -> WaiResult<()> {
        // 1. Only admin can change operator
        if *signer != self.state.admin {
            return Err(WaiError::Unauthorized {
                expected: self.state.admin,
                actual: *signer,
            });
        }

        // 2. New operator must be different
        if *new_operator == self.state.operator {
            return Err(WaiError::InvalidConfig {
                reason: "operator unchanged",
            });
        }

        tracing::info!(
            old_operator = %short_hex(&self.state.operator),
            new_operator = %short_hex(new_operator),
            "oracle operator changed"
        );
        self.state.operator = *new_operator;
        Ok(())
    }

    /// Full price record of an asset
    pub fn price_data(&self, asset: &AssetId) -> Option<&PriceData> {
        self.state.prices.get(asset)
    }
}

impl PriceOracle for SimplePriceOracle {
    fn get_price(&self, asset: &AssetId) -> WaiResult<Price> {
        self.state
            .prices
            .get(asset)
            .map(|p| p.price)
            .ok_or(WaiError::NoPriceAvailable { asset: *asset })
    }
}

// ============ Helper Functions ============

/// Convert price to different decimal precision
///
/// Scaling down truncates; scaling up fails with `Overflow` rather than
/// saturating.
pub fn convert_price_decimals(price: u128, from_decimals: u8, to_decimals: u8) -> WaiResult<u128> {
    if from_decimals > MAX_DECIMALS || to_decimals > MAX_DECIMALS {
        return Err(WaiError::InvalidDecimals {
            decimals: from_decimals.max(to_decimals),
            maximum: MAX_DECIMALS,
        });
    }

    if from_decimals == to_decimals {
        return Ok(price);
    }

    if from_decimals > to_decimals {
        Ok(price / pow10(from_decimals - to_decimals)?)
    } else {
        price
            .checked_mul(pow10(to_decimals - from_decimals)?)
            .ok_or(WaiError::Overflow)
    }
}

// ============ Tests ============
