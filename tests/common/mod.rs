//! Scripted in-process chain used by the integration tests.

#![allow(dead_code)]

use alloy::primitives::{address, Address, B256, U256};
use anyhow::Result;
use async_trait::async_trait;
use bridge_relayer::config::GasSettings;
use bridge_relayer::connector::{ChainConnector, ContractCall};
use bridge_relayer::types::{ChainReceipt, ChainTransaction, FinalizationEvent, TxOutcome};
use bridge_relayer::{BridgeRelayer, RelayerSettings, RetryConfig, TokenRegistry, TransactionStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const OPERATOR: Address = address!("1111111111111111111111111111111111111111");
pub const RECIPIENT: Address = address!("0000000000000000000000000000000000000abc");
pub const ORIGIN_BRIDGE: Address = address!("21f308067241b2028503c07bd7cb3751ffab0fb2");
pub const DESTINATION_BRIDGE: Address = address!("4200000000000000000000000000000000000010");

pub const ETH_L1: Address = Address::ZERO;
pub const MNT_L1: Address = address!("65e37B558F64E2Be5768DB46DF22F93d85741A9E");
pub const USDC_L1: Address = address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238");
pub const ETH_L2: Address = address!("dEAddEaDdeadDEadDEADDEAddEADDEAddead1111");
pub const MNT_L2: Address = address!("DeadDeAddeAddEAddeadDEaDDEAdDeaDDeAD0000");
pub const USDC_L2: Address = address!("09Bc4E0D864854c6aFB6eB9A9cdF58aC190D0dF9");

pub const MIN_GAS_LIMIT: u32 = 200_000;
pub const MIN_GAS_LIMIT_TO: u32 = 250_000;

pub fn hash_of(n: u64) -> B256 {
    B256::from(U256::from(n).to_be_bytes::<32>())
}

pub fn ether(whole: u64) -> U256 {
    U256::from(whole) * U256::from(1_000_000_000_000_000_000u128)
}

#[derive(Default)]
struct ChainState {
    balances: HashMap<Option<Address>, U256>,
    gas_estimate: u64,
    gas_used: u64,
    outcome: Option<TxOutcome>,
    /// Receipt lookups that report "pending" before a receipt shows up.
    pending_polls: u32,
    sent: Vec<ContractCall>,
    estimated: Vec<ContractCall>,
    balance_queries: u32,
    transactions: HashMap<B256, ChainTransaction>,
    receipts: HashMap<B256, ChainReceipt>,
    polls: HashMap<B256, u32>,
    block_number: u64,
    events: Vec<FinalizationEvent>,
    event_queries: Vec<(u64, u64)>,
    fail_event_queries: u32,
}

/// In-memory [`ChainConnector`] whose answers the test scripts up front.
#[derive(Clone)]
pub struct MockChain {
    operator: Address,
    state: Arc<Mutex<ChainState>>,
}

impl MockChain {
    pub fn new() -> Self {
        let state = ChainState {
            gas_estimate: 150_000,
            gas_used: 120_000,
            block_number: 100,
            ..Default::default()
        };
        Self {
            operator: OPERATOR,
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn set_balance(&self, token: Option<Address>, balance: U256) {
        self.state.lock().unwrap().balances.insert(token, balance);
    }

    pub fn set_gas_estimate(&self, estimate: u64) {
        self.state.lock().unwrap().gas_estimate = estimate;
    }

    pub fn set_gas_used(&self, gas_used: u64) {
        self.state.lock().unwrap().gas_used = gas_used;
    }

    pub fn set_outcome(&self, outcome: TxOutcome) {
        self.state.lock().unwrap().outcome = Some(outcome);
    }

    pub fn set_pending_polls(&self, polls: u32) {
        self.state.lock().unwrap().pending_polls = polls;
    }

    pub fn sent(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn estimated(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().estimated.clone()
    }

    pub fn balance_queries(&self) -> u32 {
        self.state.lock().unwrap().balance_queries
    }

    pub fn receipt_polls(&self, tx_hash: B256) -> u32 {
        self.state.lock().unwrap().polls.get(&tx_hash).copied().unwrap_or(0)
    }

    /// Registers a transaction that was not sent through this chain.
    pub fn add_transaction(&self, tx_hash: B256, gas_limit: u64, receipt: Option<ChainReceipt>) {
        let mut state = self.state.lock().unwrap();
        state.transactions.insert(
            tx_hash,
            ChainTransaction {
                hash: tx_hash,
                gas_limit,
            },
        );
        if let Some(receipt) = receipt {
            state.receipts.insert(tx_hash, receipt);
        }
    }

    pub fn set_block_number(&self, block_number: u64) {
        self.state.lock().unwrap().block_number = block_number;
    }

    pub fn push_event(&self, event: FinalizationEvent) {
        self.state.lock().unwrap().events.push(event);
    }

    pub fn event_queries(&self) -> Vec<(u64, u64)> {
        self.state.lock().unwrap().event_queries.clone()
    }

    pub fn fail_next_event_queries(&self, count: u32) {
        self.state.lock().unwrap().fail_event_queries = count;
    }
}

#[async_trait]
impl ChainConnector for MockChain {
    fn operator(&self) -> Address {
        self.operator
    }

    async fn get_balance(&self, _owner: Address, token: Option<Address>) -> Result<U256> {
        let mut state = self.state.lock().unwrap();
        state.balance_queries += 1;
        Ok(state.balances.get(&token).copied().unwrap_or_default())
    }

    async fn get_transaction(&self, tx_hash: B256) -> Result<Option<ChainTransaction>> {
        Ok(self.state.lock().unwrap().transactions.get(&tx_hash).cloned())
    }

    async fn get_receipt(&self, tx_hash: B256) -> Result<Option<ChainReceipt>> {
        let mut state = self.state.lock().unwrap();
        let pending_polls = state.pending_polls;
        let polls = state.polls.entry(tx_hash).or_insert(0);
        *polls += 1;
        if *polls <= pending_polls {
            return Ok(None);
        }
        Ok(state.receipts.get(&tx_hash).cloned())
    }

    async fn estimate_gas(&self, call: &ContractCall) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.estimated.push(call.clone());
        Ok(state.gas_estimate)
    }

    async fn send(&self, call: &ContractCall) -> Result<B256> {
        let mut state = self.state.lock().unwrap();
        state.sent.push(call.clone());

        let nonce = state.sent.len() as u64;
        let tx_hash = hash_of(0xd3_0000 + nonce);
        let gas_limit = call.gas_limit.unwrap_or(state.gas_estimate);
        let gas_used = state.gas_used;
        let outcome = state.outcome.unwrap_or(TxOutcome::Success);
        let block_number = state.block_number;

        state.transactions.insert(
            tx_hash,
            ChainTransaction {
                hash: tx_hash,
                gas_limit,
            },
        );
        state.receipts.insert(
            tx_hash,
            ChainReceipt {
                hash: tx_hash,
                block_number,
                gas_used,
                outcome,
            },
        );
        Ok(tx_hash)
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.state.lock().unwrap().block_number)
    }

    async fn deposit_finalized_events(
        &self,
        bridge: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<FinalizationEvent>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_event_queries > 0 {
            state.fail_event_queries -= 1;
            anyhow::bail!("rpc timeout");
        }
        assert_eq!(bridge, DESTINATION_BRIDGE);
        state.event_queries.push((from_block, to_block));
        Ok(state
            .events
            .iter()
            .filter(|e| {
                e.block_number
                    .is_some_and(|block| block >= from_block && block <= to_block)
            })
            .cloned()
            .collect())
    }
}

pub fn tokens() -> TokenRegistry {
    TokenRegistry::new(
        ETH_L1,
        MNT_L1,
        [
            ("ETH".to_string(), ETH_L1),
            ("MNT".to_string(), MNT_L1),
            ("USDC".to_string(), USDC_L1),
        ],
        [
            ("ETH".to_string(), ETH_L2),
            ("MNT".to_string(), MNT_L2),
            ("USDC".to_string(), USDC_L2),
        ],
    )
}

pub fn settings() -> RelayerSettings {
    RelayerSettings {
        origin_bridge: ORIGIN_BRIDGE,
        destination_bridge: DESTINATION_BRIDGE,
        gas: GasSettings {
            min_gas_limit: MIN_GAS_LIMIT,
            min_gas_limit_to: MIN_GAS_LIMIT_TO,
        },
        transaction_timeout: Duration::from_millis(200),
        poll_interval: Duration::from_millis(5),
        event_poll_interval: Duration::from_millis(10),
        event_lookback_blocks: 0,
        retry: RetryConfig::new(2, Duration::from_millis(5), Duration::from_millis(20), 2.0),
    }
}

pub struct Harness {
    pub origin: MockChain,
    pub destination: MockChain,
    pub store: TransactionStore,
    pub relayer: BridgeRelayer,
}

pub async fn harness() -> Harness {
    let origin = MockChain::new();
    let destination = MockChain::new();
    let store = TransactionStore::in_memory().await.unwrap();
    let relayer = BridgeRelayer::new(
        Arc::new(origin.clone()),
        Arc::new(destination.clone()),
        store.clone(),
        tokens(),
        settings(),
    );
    Harness {
        origin,
        destination,
        store,
        relayer,
    }
}

pub fn finalization(
    origin_token: Address,
    from: Address,
    to: Address,
    amount: U256,
    block_number: u64,
) -> FinalizationEvent {
    FinalizationEvent {
        origin_token,
        destination_token: ETH_L2,
        from,
        to,
        amount,
        tx_hash: Some(hash_of(0xf1_0000 + block_number)),
        block_number: Some(block_number),
    }
}
