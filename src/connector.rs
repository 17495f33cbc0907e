use alloy::primitives::{Address, Bytes, B256, U256};
use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ChainReceipt, ChainTransaction, FinalizationEvent};

/// An encoded contract invocation, ready for estimation or submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub contract: Address,
    pub method: &'static str,
    pub input: Bytes,
    pub value: U256,
    pub gas_limit: Option<u64>,
}

impl ContractCall {
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// JSON-RPC access to one chain, as the bridge core sees it.
#[async_trait]
pub trait ChainConnector: Send + Sync {
    /// Address transactions are sent from.
    fn operator(&self) -> Address;

    /// Balance of `owner`; `token = None` means the chain's native coin.
    async fn get_balance(&self, owner: Address, token: Option<Address>) -> Result<U256>;

    async fn get_transaction(&self, tx_hash: B256) -> Result<Option<ChainTransaction>>;

    /// `Ok(None)` while the transaction is still pending.
    async fn get_receipt(&self, tx_hash: B256) -> Result<Option<ChainReceipt>>;

    async fn estimate_gas(&self, call: &ContractCall) -> Result<u64>;

    /// Signs and broadcasts `call`; does not wait for it to be mined.
    async fn send(&self, call: &ContractCall) -> Result<B256>;

    async fn block_number(&self) -> Result<u64>;

    /// `DepositFinalized` events emitted by `bridge` within the inclusive block range.
    async fn deposit_finalized_events(
        &self,
        bridge: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<FinalizationEvent>>;
}
