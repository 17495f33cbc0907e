use alloy::primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which way value moves across the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeDirection {
    /// Deposit: origin chain -> destination rollup.
    OriginToDestination,
    /// Withdrawal: destination rollup -> origin chain.
    DestinationToOrigin,
}

impl BridgeDirection {
    pub fn code(self) -> i64 {
        match self {
            BridgeDirection::OriginToDestination => 1,
            BridgeDirection::DestinationToOrigin => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(BridgeDirection::OriginToDestination),
            2 => Some(BridgeDirection::DestinationToOrigin),
            _ => None,
        }
    }
}

/// Success flag taken from a mined receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxOutcome {
    Success,
    Failure,
}

impl TxOutcome {
    pub fn from_receipt_status(status: bool) -> Self {
        if status {
            TxOutcome::Success
        } else {
            TxOutcome::Failure
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, TxOutcome::Success)
    }
}

/// Lifecycle of a tracked transfer. Only ever moves forward:
/// `Submitted -> Mined(_) -> Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "outcome", rename_all = "snake_case")]
pub enum LifecycleStatus {
    Submitted,
    Mined(TxOutcome),
    Finalized,
}

impl LifecycleStatus {
    fn rank(self) -> u8 {
        match self {
            LifecycleStatus::Submitted => 0,
            LifecycleStatus::Mined(_) => 1,
            LifecycleStatus::Finalized => 2,
        }
    }

    /// True when moving from `current` to `self` is a forward transition.
    pub fn is_forward_of(self, current: LifecycleStatus) -> bool {
        self.rank() > current.rank()
    }

    /// Column encoding used by the store: `(stage, outcome)`.
    pub fn to_columns(self) -> (i64, Option<i64>) {
        match self {
            LifecycleStatus::Submitted => (0, None),
            LifecycleStatus::Mined(outcome) => (1, Some(outcome.is_success() as i64)),
            LifecycleStatus::Finalized => (2, None),
        }
    }

    pub fn from_columns(stage: i64, outcome: Option<i64>) -> Option<Self> {
        match (stage, outcome) {
            (0, _) => Some(LifecycleStatus::Submitted),
            (1, Some(flag)) => Some(LifecycleStatus::Mined(TxOutcome::from_receipt_status(
                flag != 0,
            ))),
            (2, _) => Some(LifecycleStatus::Finalized),
            _ => None,
        }
    }

    pub(crate) fn stage(self) -> i64 {
        self.rank() as i64
    }
}

/// One persisted row per submitted transfer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeTransaction {
    pub id: i64,
    pub tx_hash: B256,
    pub direction: BridgeDirection,
    pub status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-facing deposit request. `token` is a symbol looked up in the
/// deposit token table; `recipient` defaults to the operator.
#[derive(Debug, Clone)]
pub struct DepositRequest {
    pub token: String,
    pub amount: U256,
    pub recipient: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTransaction {
    pub hash: B256,
    pub gas_limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReceipt {
    pub hash: B256,
    pub block_number: u64,
    pub gas_used: u64,
    pub outcome: TxOutcome,
}

/// A `DepositFinalized` event observed on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizationEvent {
    pub origin_token: Address,
    pub destination_token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub tx_hash: Option<B256>,
    pub block_number: Option<u64>,
}

/// What a deposit submission hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedDeposit {
    pub tx_hash: B256,
    pub gas_limit: u64,
    pub origin_token: Address,
    pub destination_token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

/// Receipt view returned by the resolver. `status` is the persisted lifecycle
/// status when the store has one, otherwise the freshly observed chain value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedReceipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub outcome: TxOutcome,
    pub status: LifecycleStatus,
    pub persisted: bool,
}
