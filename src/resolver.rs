use alloy::primitives::B256;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connector::ChainConnector;
use crate::error::{BridgeError, BridgeResult};
use crate::store::TransactionStore;
use crate::transaction_monitor::{MonitorOutcome, TransactionMonitor};
use crate::types::{LifecycleStatus, ResolvedReceipt};

/// Waits for an origin-chain transaction to be mined and reconciles the
/// stored lifecycle status with its receipt. Safe to call any number of times.
pub struct TransactionStatusResolver {
    origin: Arc<dyn ChainConnector>,
    store: TransactionStore,
    monitor: TransactionMonitor,
}

impl TransactionStatusResolver {
    pub fn new(
        origin: Arc<dyn ChainConnector>,
        store: TransactionStore,
        monitor: TransactionMonitor,
    ) -> Self {
        Self {
            origin,
            store,
            monitor,
        }
    }

    pub async fn resolve(&self, tx_hash: B256) -> BridgeResult<ResolvedReceipt> {
        self.resolve_with_cancel(tx_hash, &CancellationToken::new())
            .await
    }

    pub async fn resolve_with_cancel(
        &self,
        tx_hash: B256,
        cancel: &CancellationToken,
    ) -> BridgeResult<ResolvedReceipt> {
        let tx = self
            .origin
            .get_transaction(tx_hash)
            .await?
            .ok_or(BridgeError::TransactionNotFound(tx_hash))?;

        let receipt = match self.monitor.monitor_transaction(tx_hash, cancel).await {
            MonitorOutcome::Mined(receipt) => receipt,
            MonitorOutcome::Timeout { attempts } => {
                return Err(BridgeError::ReceiptTimeout { tx_hash, attempts })
            }
            MonitorOutcome::Cancelled => return Err(BridgeError::ReceiptCancelled { tx_hash }),
        };
        info!(
            "gas limit: {}, gas used: {}",
            tx.gas_limit, receipt.gas_used
        );

        let observed = LifecycleStatus::Mined(receipt.outcome);
        let (status, persisted) = match self.store.get_by_tx_hash(tx_hash).await {
            Ok(Some(row)) if !observed.is_forward_of(row.status) => {
                debug!(%tx_hash, status = ?row.status, "Status already recorded");
                (row.status, true)
            }
            Ok(Some(_)) => match self.store.update_status(tx_hash, observed).await {
                Ok(_) => (observed, true),
                Err(e) => {
                    warn!(%tx_hash, error = %e, "Failed to record mined status");
                    (observed, false)
                }
            },
            Ok(None) => {
                debug!(%tx_hash, "Transaction is not tracked by the store");
                (observed, false)
            }
            Err(e) => {
                warn!(%tx_hash, error = %e, "Store read failed, returning chain receipt as-is");
                (observed, false)
            }
        };

        if receipt.gas_used > tx.gas_limit {
            warn!(
                %tx_hash,
                gas_limit = tx.gas_limit,
                gas_used = receipt.gas_used,
                "Gas limit too low"
            );
            return Err(BridgeError::GasLimitTooLow {
                gas_limit: tx.gas_limit,
                gas_used: receipt.gas_used,
            });
        }

        Ok(ResolvedReceipt {
            tx_hash,
            block_number: receipt.block_number,
            gas_limit: tx.gas_limit,
            gas_used: receipt.gas_used,
            outcome: receipt.outcome,
            status,
            persisted,
        })
    }
}
