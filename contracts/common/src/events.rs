//! Basket Events
//!
//! Events are appended once a call commits and can be indexed off-chain
//! for auditing. Every event carries the timestamp of its call.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, AssetAmount, AssetId, Price};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Registry Events (0x01 - 0x1F)
    TokenSupported = 0x01,
    TokenEnabled = 0x02,
    TokenDisabled = 0x03,
    TokenRatioChanged = 0x04,
    TokenRemoved = 0x05,
    FeeRatioChanged = 0x06,
    SurplusSwept = 0x07,

    // Issuance Events (0x20 - 0x3F)
    InitialMint = 0x20,
    Minted = 0x21,
    Burned = 0x22,
}

/// Main event enum containing all basket events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum WaiEvent {
    // ============ Registry Events ============

    /// Emitted when a new asset joins the basket
    TokenSupported {
        asset: AssetId,
        decimals: u8,
        min_ratio: u64,
        max_ratio: u64,
        timestamp: u64,
    },

    /// Emitted when an asset accepts deposits again
    TokenEnabled { asset: AssetId, timestamp: u64 },

    /// Emitted when an asset stops accepting deposits
    TokenDisabled { asset: AssetId, timestamp: u64 },

    /// Emitted when an asset's ratio bounds change
    TokenRatioChanged {
        asset: AssetId,
        old_min_ratio: u64,
        old_max_ratio: u64,
        new_min_ratio: u64,
        new_max_ratio: u64,
        timestamp: u64,
    },

    /// Emitted when an asset is evacuated into another and deleted
    TokenRemoved {
        from_asset: AssetId,
        from_amount: Amount,
        to_asset: AssetId,
        to_amount: Amount,
        timestamp: u64,
    },

    /// Emitted when issuance/redemption fees change
    FeeRatioChanged {
        fee_mint_bps: u64,
        fee_burn_bps: u64,
        timestamp: u64,
    },

    /// Emitted when untracked ledger surplus is returned to the treasury
    SurplusSwept {
        asset: AssetId,
        amount: Amount,
        treasury: Address,
        timestamp: u64,
    },

    // ============ Issuance Events ============

    /// Emitted once, when the seed collateral is converted into shares
    InitialMint {
        treasury: Address,
        total_value: u128,
        target_price: Price,
        shares: Amount,
        timestamp: u64,
    },

    /// Emitted on every mint
    Minted {
        caller: Address,
        deposits: Vec<AssetAmount>,
        shares: Amount,
        fee: Amount,
        price_per_share: Price,
        timestamp: u64,
    },

    /// Emitted on every burn
    Burned {
        caller: Address,
        shares: Amount,
        payouts: Vec<AssetAmount>,
        fees: Vec<AssetAmount>,
        price_per_share: Price,
        timestamp: u64,
    },
}

impl WaiEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::TokenSupported { .. } => EventType::TokenSupported,
            Self::TokenEnabled { .. } => EventType::TokenEnabled,
            Self::TokenDisabled { .. } => EventType::TokenDisabled,
            Self::TokenRatioChanged { .. } => EventType::TokenRatioChanged,
            Self::TokenRemoved { .. } => EventType::TokenRemoved,
            Self::FeeRatioChanged { .. } => EventType::FeeRatioChanged,
            Self::SurplusSwept { .. } => EventType::SurplusSwept,
            Self::InitialMint { .. } => EventType::InitialMint,
            Self::Minted { .. } => EventType::Minted,
            Self::Burned { .. } => EventType::Burned,
        }
    }

    /// Get the timestamp of the call that emitted the event
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::TokenSupported { timestamp, .. }
            | Self::TokenEnabled { timestamp, .. }
            | Self::TokenDisabled { timestamp, .. }
            | Self::TokenRatioChanged { timestamp, .. }
            | Self::TokenRemoved { timestamp, .. }
            | Self::FeeRatioChanged { timestamp, .. }
            | Self::SurplusSwept { timestamp, .. }
            | Self::InitialMint { timestamp, .. }
            | Self::Minted { timestamp, .. }
            | Self::Burned { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting events across calls
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<WaiEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: WaiEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[WaiEvent] {
        &self.events
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&WaiEvent> {
        self.events.last()
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<WaiEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&WaiEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing was emitted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = WaiEvent::TokenRemoved {
            from_asset: [1u8; 32],
            from_amount: 30_000_00000000,
            to_asset: [2u8; 32],
            to_amount: 3_000_000000,
            timestamp: 1_700_000_000,
        };

        assert_eq!(event.event_type(), EventType::TokenRemoved);
        assert_eq!(event.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_event_serialization() {
        let event = WaiEvent::Burned {
            caller: [3u8; 32],
            shares: 100,
            payouts: vec![AssetAmount::new([1u8; 32], 50)],
            fees: vec![AssetAmount::new([1u8; 32], 0)],
            price_per_share: 10,
            timestamp: 200,
        };

        let bytes = event.to_bytes();
        let restored = WaiEvent::from_bytes(&bytes).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.emit(WaiEvent::TokenSupported {
            asset: [1u8; 32],
            decimals: 18,
            min_ratio: 1000,
            max_ratio: 7000,
            timestamp: 100,
        });
        log.emit(WaiEvent::TokenDisabled {
            asset: [1u8; 32],
            timestamp: 101,
        });

        assert_eq!(log.len(), 2);
        assert!(log.has_events());
        assert_eq!(log.filter_by_type(EventType::TokenDisabled).len(), 1);
        assert_eq!(log.last().map(|e| e.timestamp()), Some(101));
    }
}
