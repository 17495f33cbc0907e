use alloy::primitives::{Address, B256, U256};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::blockchain::BlockchainClient;
use crate::config::{BridgeConfig, GasSettings};
use crate::connector::ChainConnector;
use crate::error::BridgeResult;
use crate::event_bus::{EventBus, EventKind};
use crate::resolver::TransactionStatusResolver;
use crate::retry::{execute_with_retry, RetryConfig};
use crate::store::TransactionStore;
use crate::submitter::DepositSubmitter;
use crate::tokens::{parse_address, TokenRegistry};
use crate::transaction_monitor::TransactionMonitor;
use crate::types::{BridgeDirection, DepositRequest, ResolvedReceipt, SubmittedDeposit};
use crate::watcher::{FinalizationRecorder, FinalizationWatcher, WatchHandle};

#[derive(Debug, Clone)]
pub struct RelayerSettings {
    pub origin_bridge: Address,
    pub destination_bridge: Address,
    pub gas: GasSettings,
    pub transaction_timeout: Duration,
    pub poll_interval: Duration,
    pub event_poll_interval: Duration,
    pub event_lookback_blocks: u64,
    pub retry: RetryConfig,
}

impl RelayerSettings {
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Ok(Self {
            origin_bridge: parse_address(&config.origin.bridge_address)?,
            destination_bridge: parse_address(&config.destination.bridge_address)?,
            gas: config.gas.clone(),
            transaction_timeout: config.monitoring.transaction_timeout(),
            poll_interval: config.monitoring.poll_interval(),
            event_poll_interval: config.monitoring.event_poll_interval(),
            event_lookback_blocks: config.monitoring.event_lookback_blocks,
            retry: config.retry_config(),
        })
    }
}

/// The bridge core for one operator wallet: one store, one event bus and one
/// finalization watcher shared by every request.
pub struct BridgeRelayer {
    tokens: Arc<TokenRegistry>,
    store: TransactionStore,
    bus: Arc<EventBus>,
    submitter: DepositSubmitter,
    watcher: Arc<FinalizationWatcher>,
    resolver: TransactionStatusResolver,
}

impl BridgeRelayer {
    pub fn new(
        origin: Arc<dyn ChainConnector>,
        destination: Arc<dyn ChainConnector>,
        store: TransactionStore,
        tokens: TokenRegistry,
        settings: RelayerSettings,
    ) -> Self {
        let tokens = Arc::new(tokens);
        let bus = Arc::new(EventBus::new());
        bus.subscribe(
            EventKind::DepositFinalized,
            Arc::new(FinalizationRecorder::new(store.clone())),
        );

        let submitter = DepositSubmitter::new(
            origin.clone(),
            store.clone(),
            tokens.clone(),
            settings.origin_bridge,
            settings.gas.clone(),
        );
        let watcher = Arc::new(FinalizationWatcher::new(
            destination,
            settings.destination_bridge,
            bus.clone(),
            settings.event_poll_interval,
            settings.event_lookback_blocks,
            settings.retry.clone(),
        ));
        let monitor = TransactionMonitor::new(
            origin.clone(),
            settings.transaction_timeout,
            settings.poll_interval,
        );
        let resolver = TransactionStatusResolver::new(origin, store.clone(), monitor);

        Self {
            tokens,
            store,
            bus,
            submitter,
            watcher,
            resolver,
        }
    }

    pub async fn from_config(config: &BridgeConfig) -> Result<Self> {
        let retry = config.retry_config();

        let origin = execute_with_retry(
            || BlockchainClient::connect(&config.origin, config),
            &retry,
            "Origin chain connection",
        )
        .await?;
        let destination = execute_with_retry(
            || BlockchainClient::connect(&config.destination, config),
            &retry,
            "Destination chain connection",
        )
        .await?;

        let store = TransactionStore::connect(&config.database.url).await?;
        let tokens = TokenRegistry::from_settings(&config.tokens)?;
        let settings = RelayerSettings::from_config(config)?;

        info!(
            "🌉 Relayer ready on {} (origin {}, destination {})",
            config.network.name, config.origin.chain_id, config.destination.chain_id
        );

        Ok(Self::new(
            Arc::new(origin),
            Arc::new(destination),
            store,
            tokens,
            settings,
        ))
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    pub fn store(&self) -> &TransactionStore {
        &self.store
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn watcher(&self) -> &Arc<FinalizationWatcher> {
        &self.watcher
    }

    pub async fn submit_deposit(
        &self,
        token: Address,
        amount: U256,
        to: Option<Address>,
    ) -> BridgeResult<SubmittedDeposit> {
        self.submitter.submit_deposit(token, amount, to).await
    }

    pub fn register_finalization_watch(&self, deposit: &SubmittedDeposit) -> WatchHandle {
        self.watcher.register_watch(
            deposit.origin_token,
            deposit.destination_token,
            deposit.from,
            deposit.to,
            deposit.amount,
            deposit.tx_hash,
        )
    }

    pub async fn resolve_status(&self, tx_hash: B256) -> BridgeResult<ResolvedReceipt> {
        self.resolver.resolve(tx_hash).await
    }

    pub async fn resolve_status_with_cancel(
        &self,
        tx_hash: B256,
        cancel: &CancellationToken,
    ) -> BridgeResult<ResolvedReceipt> {
        self.resolver.resolve_with_cancel(tx_hash, cancel).await
    }

    /// Resolves the token symbol, submits the deposit and starts watching for
    /// its finalization.
    pub async fn deposit(
        &self,
        request: DepositRequest,
    ) -> BridgeResult<(SubmittedDeposit, WatchHandle)> {
        let token = self
            .tokens
            .resolve(&request.token, BridgeDirection::OriginToDestination)?;
        let deposit = self
            .submit_deposit(token, request.amount, request.recipient)
            .await?;
        let handle = self.register_finalization_watch(&deposit);
        Ok((deposit, handle))
    }

    pub fn spawn_watcher(&self, cancel: CancellationToken) -> JoinHandle<Result<()>> {
        let watcher = self.watcher.clone();
        tokio::spawn(async move { watcher.run(cancel).await })
    }
}
