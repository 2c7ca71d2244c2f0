//! Vault Configuration
//!
//! Deployment parameters of one basket: the accounts it moves funds
//! between and its fee schedule. Loaded from JSON with addresses written
//! as `0x`-prefixed hex.

use serde::{Deserialize, Serialize};

use crate::constants::fees;
use crate::errors::{WaiError, WaiResult};
use crate::types::{Address, ZERO_ADDRESS};

/// Configuration of a single basket vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Account that holds the basket collateral on the asset ledger
    #[serde(with = "hex_address")]
    pub vault_account: Address,
    /// Receives the initial mint and removed collateral
    #[serde(with = "hex_address")]
    pub treasury: Address,
    /// Receives issuance and redemption fees
    #[serde(with = "hex_address")]
    pub fee_sink: Address,
    /// Issuance fee in basis points
    #[serde(default = "default_mint_fee")]
    pub fee_mint_bps: u64,
    /// Redemption fee in basis points
    #[serde(default = "default_burn_fee")]
    pub fee_burn_bps: u64,
}

fn default_mint_fee() -> u64 {
    fees::DEFAULT_MINT_FEE_BPS
}

fn default_burn_fee() -> u64 {
    fees::DEFAULT_BURN_FEE_BPS
}

impl VaultConfig {
    /// Create a config with the default fee schedule
    pub fn new(vault_account: Address, treasury: Address, fee_sink: Address) -> Self {
        Self {
            vault_account,
            treasury,
            fee_sink,
            fee_mint_bps: fees::DEFAULT_MINT_FEE_BPS,
            fee_burn_bps: fees::DEFAULT_BURN_FEE_BPS,
        }
    }

    /// Override the fee schedule
    pub fn with_fees(mut self, fee_mint_bps: u64, fee_burn_bps: u64) -> Self {
        self.fee_mint_bps = fee_mint_bps;
        self.fee_burn_bps = fee_burn_bps;
        self
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> WaiResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            tracing::warn!(error = %e, "rejecting malformed vault config");
            WaiError::InvalidConfig {
                reason: "malformed json",
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> WaiResult<String> {
        serde_json::to_string_pretty(self).map_err(|_| WaiError::InvalidConfig {
            reason: "unserializable config",
        })
    }

    /// Check fee bounds and account sanity
    pub fn validate(&self) -> WaiResult<()> {
        if self.fee_mint_bps > fees::MAX_FEE_BPS {
            return Err(WaiError::InvalidFee {
                fee_bps: self.fee_mint_bps,
            });
        }
        if self.fee_burn_bps > fees::MAX_FEE_BPS {
            return Err(WaiError::InvalidFee {
                fee_bps: self.fee_burn_bps,
            });
        }
        if self.vault_account == ZERO_ADDRESS
            || self.treasury == ZERO_ADDRESS
            || self.fee_sink == ZERO_ADDRESS
        {
            return Err(WaiError::InvalidConfig {
                reason: "zero address",
            });
        }
        if self.vault_account == self.treasury || self.vault_account == self.fee_sink {
            return Err(WaiError::InvalidConfig {
                reason: "vault account must be distinct from treasury and fee sink",
            });
        }
        Ok(())
    }
}

/// Serde adapter for `0x`-prefixed 32-byte hex addresses
pub mod hex_address {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::types::Address;

    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(address)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let digits = raw.strip_prefix("0x").unwrap_or(&raw);
        let mut out = [0u8; 32];
        hex::decode_to_slice(digits, &mut out).map_err(D::Error::custom)?;
        Ok(out)
    }
}
