use alloy::primitives::B256;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connector::ChainConnector;
use crate::types::ChainReceipt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    Mined(ChainReceipt),
    /// No receipt after `attempts` checks within the wait budget.
    Timeout { attempts: u32 },
    Cancelled,
}

/// Polls for a receipt until it appears, the wait budget runs out, or the
/// caller cancels.
pub struct TransactionMonitor {
    connector: Arc<dyn ChainConnector>,
    max_wait_time: Duration,
    poll_interval: Duration,
}

impl TransactionMonitor {
    pub fn new(
        connector: Arc<dyn ChainConnector>,
        max_wait_time: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            connector,
            max_wait_time,
            poll_interval,
        }
    }

    pub async fn monitor_transaction(
        &self,
        tx_hash: B256,
        cancel: &CancellationToken,
    ) -> MonitorOutcome {
        info!("🔍 Waiting for transaction to be mined: {}", tx_hash);

        let start_time = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.connector.get_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    info!(
                        "✅ Transaction mined: {} (block {}, outcome {:?})",
                        tx_hash, receipt.block_number, receipt.outcome
                    );
                    return MonitorOutcome::Mined(receipt);
                }
                Ok(None) => {
                    debug!("⏳ Transaction {} pending (check {})", tx_hash, attempts);
                }
                Err(e) => {
                    warn!("❌ Error checking receipt for {}: {}", tx_hash, e);
                }
            }

            if start_time.elapsed() >= self.max_wait_time {
                warn!(
                    "⏰ Transaction {} still pending after {} checks ({:?})",
                    tx_hash, attempts, self.max_wait_time
                );
                return MonitorOutcome::Timeout { attempts };
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Stopped waiting for {}", tx_hash);
                    return MonitorOutcome::Cancelled;
                }
                _ = sleep(self.poll_interval) => {}
            }
        }
    }
}
