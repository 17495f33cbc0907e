pub mod api;
pub mod blockchain;
pub mod config;
pub mod connector;
pub mod contracts;
pub mod error;
pub mod event_bus;
pub mod kms_signer;
pub mod relayer;
pub mod resolver;
pub mod retry;
pub mod store;
pub mod submitter;
pub mod tokens;
pub mod transaction_monitor;
pub mod types;
pub mod watcher;

pub use blockchain::BlockchainClient;
pub use config::BridgeConfig;
pub use connector::{ChainConnector, ContractCall};
pub use error::{BridgeError, BridgeResult, StoreError};
pub use event_bus::{BridgeEvent, EventBus, EventKind, EventListener};
pub use relayer::{BridgeRelayer, RelayerSettings};
pub use resolver::TransactionStatusResolver;
pub use retry::{execute_with_retry, RetryConfig};
pub use store::TransactionStore;
pub use submitter::DepositSubmitter;
pub use tokens::{DepositRoute, TokenRegistry};
pub use transaction_monitor::{MonitorOutcome, TransactionMonitor};
pub use types::{
    BridgeDirection, BridgeTransaction, LifecycleStatus, ResolvedReceipt, SubmittedDeposit,
    TxOutcome,
};
pub use watcher::{FinalizationRecorder, FinalizationWatcher, WatchHandle};
