use alloy::consensus::Transaction as _;
use alloy::network::{Ethereum, EthereumWallet};
use alloy::primitives::{Address, TxKind, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, TransactionInput, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolEvent;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::config::{BridgeConfig, ChainEndpoint};
use crate::connector::{ChainConnector, ContractCall};
use crate::contracts::erc20::ERC20Contract;
use crate::contracts::standard_bridge::DepositFinalized;
use crate::kms_signer::KmsSigner;
use crate::types::{ChainReceipt, ChainTransaction, FinalizationEvent, TxOutcome};

/// alloy-backed connection to one chain, signing as the operator.
pub struct BlockchainClient {
    provider: Arc<dyn Provider<Ethereum>>,
    operator: Address,
}

impl BlockchainClient {
    pub async fn new(
        rpc_url: &str,
        expected_chain_id: u64,
        wallet: EthereumWallet,
        operator: Address,
    ) -> Result<Self> {
        info!("🔗 Connecting to RPC: {}", rpc_url);

        let url = Url::parse(rpc_url)?;
        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

        let chain_id = provider.get_chain_id().await?;
        if chain_id != expected_chain_id {
            return Err(anyhow::anyhow!(
                "Chain ID mismatch: expected {}, got {}",
                expected_chain_id,
                chain_id
            ));
        }

        info!("✅ Connected to chain {} as {}", chain_id, operator);

        Ok(Self {
            provider: Arc::new(provider),
            operator,
        })
    }

    /// Connects to `endpoint` with the operator key from `config`: the KMS key
    /// when one is configured, the local private key otherwise.
    pub async fn connect(endpoint: &ChainEndpoint, config: &BridgeConfig) -> Result<Self> {
        let (wallet, operator) = match (&config.kms, &config.operator.private_key) {
            (Some(kms), _) => {
                let signer =
                    KmsSigner::new(kms.key_id.clone(), kms.region.clone(), endpoint.chain_id)
                        .await?;
                let operator = signer.address();
                (signer.into_wallet(), operator)
            }
            (None, Some(private_key)) => {
                let signer = PrivateKeySigner::from_str(private_key.trim())
                    .context("invalid operator private key")?;
                let operator = signer.address();
                (EthereumWallet::from(signer), operator)
            }
            (None, None) => {
                return Err(anyhow::anyhow!(
                    "no operator key configured: set [operator].private_key or [kms]"
                ))
            }
        };

        Self::new(&endpoint.rpc_url, endpoint.chain_id, wallet, operator).await
    }

    fn request(&self, call: &ContractCall) -> TransactionRequest {
        TransactionRequest {
            from: Some(self.operator),
            to: Some(TxKind::Call(call.contract)),
            input: TransactionInput::new(call.input.clone()),
            value: Some(call.value),
            gas: call.gas_limit,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ChainConnector for BlockchainClient {
    fn operator(&self) -> Address {
        self.operator
    }

    async fn get_balance(&self, owner: Address, token: Option<Address>) -> Result<U256> {
        match token {
            None => Ok(self.provider.get_balance(owner).await?),
            Some(token) => {
                ERC20Contract::new(token, self.provider.clone())
                    .balance_of(owner)
                    .await
            }
        }
    }

    async fn get_transaction(&self, tx_hash: B256) -> Result<Option<ChainTransaction>> {
        let tx = self.provider.get_transaction_by_hash(tx_hash).await?;
        Ok(tx.map(|tx| ChainTransaction {
            hash: tx_hash,
            gas_limit: tx.gas_limit(),
        }))
    }

    async fn get_receipt(&self, tx_hash: B256) -> Result<Option<ChainReceipt>> {
        let receipt = self.provider.get_transaction_receipt(tx_hash).await?;
        Ok(receipt.map(|receipt| ChainReceipt {
            hash: tx_hash,
            block_number: receipt.block_number.unwrap_or(0),
            gas_used: receipt.gas_used,
            outcome: TxOutcome::from_receipt_status(receipt.status()),
        }))
    }

    async fn estimate_gas(&self, call: &ContractCall) -> Result<u64> {
        let estimate = self
            .provider
            .estimate_gas(self.request(call))
            .await
            .with_context(|| format!("estimating gas for {}", call.method))?;
        Ok(estimate)
    }

    async fn send(&self, call: &ContractCall) -> Result<B256> {
        let pending = self
            .provider
            .send_transaction(self.request(call))
            .await
            .with_context(|| format!("sending {}", call.method))?;
        Ok(*pending.tx_hash())
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn deposit_finalized_events(
        &self,
        bridge: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<FinalizationEvent>> {
        let filter = Filter::new()
            .address(bridge)
            .event_signature(DepositFinalized::SIGNATURE_HASH)
            .from_block(from_block)
            .to_block(to_block);

        let logs = self.provider.get_logs(&filter).await?;

        let mut events = Vec::with_capacity(logs.len());
        for log in logs {
            match log.log_decode::<DepositFinalized>() {
                Ok(decoded) => {
                    let event = decoded.inner.data;
                    events.push(FinalizationEvent {
                        origin_token: event.l1Token,
                        destination_token: event.l2Token,
                        from: event.from,
                        to: event.to,
                        amount: event.amount,
                        tx_hash: log.transaction_hash,
                        block_number: log.block_number,
                    });
                }
                Err(e) => {
                    warn!(
                        tx_hash = ?log.transaction_hash,
                        error = %e,
                        "Skipping undecodable DepositFinalized log"
                    );
                }
            }
        }
        Ok(events)
    }
}
