use alloy::primitives::{Address, B256, U256};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connector::ChainConnector;
use crate::event_bus::{BridgeEvent, EventBus, EventListener};
use crate::retry::{execute_with_retry, RetryConfig};
use crate::store::TransactionStore;
use crate::types::{FinalizationEvent, LifecycleStatus};

/// Fields a destination-chain event must carry, exactly, to match a watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchKey {
    pub origin_token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

impl WatchKey {
    fn of_event(event: &FinalizationEvent) -> Self {
        Self {
            origin_token: event.origin_token,
            from: event.from,
            to: event.to,
            amount: event.amount,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingWatch {
    id: u64,
    tx_hash: B256,
    destination_token: Address,
}

/// Outstanding watches per key, oldest first.
type WatchTable = Mutex<HashMap<WatchKey, VecDeque<PendingWatch>>>;

/// Returned by [`FinalizationWatcher::register_watch`]. Dropping the handle
/// leaves the watch in place; call [`WatchHandle::cancel`] to withdraw it.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    id: u64,
    key: WatchKey,
    tx_hash: B256,
    table: Weak<WatchTable>,
}

impl WatchHandle {
    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    pub fn key(&self) -> WatchKey {
        self.key
    }

    /// Still waiting for its event.
    pub fn is_active(&self) -> bool {
        self.table.upgrade().is_some_and(|table| {
            let watches = table.lock().unwrap_or_else(|e| e.into_inner());
            watches
                .get(&self.key)
                .is_some_and(|queue| queue.iter().any(|w| w.id == self.id))
        })
    }

    /// Removes the watch. Returns false when it already matched or was cancelled.
    pub fn cancel(&self) -> bool {
        let Some(table) = self.table.upgrade() else {
            return false;
        };
        let mut watches = table.lock().unwrap_or_else(|e| e.into_inner());
        let Some(queue) = watches.get_mut(&self.key) else {
            return false;
        };

        let before = queue.len();
        queue.retain(|w| w.id != self.id);
        let removed = queue.len() != before;
        if queue.is_empty() {
            watches.remove(&self.key);
        }
        if removed {
            debug!(tx_hash = %self.tx_hash, "Finalization watch cancelled");
        }
        removed
    }
}

/// Correlates destination-chain `DepositFinalized` events with pending
/// deposits and publishes [`BridgeEvent::DepositFinalized`] on a match.
///
/// A watch is consumed by the first event that matches it. When several
/// watches share a key, each event consumes the oldest one.
pub struct FinalizationWatcher {
    destination: Arc<dyn ChainConnector>,
    bridge: Address,
    bus: Arc<EventBus>,
    watches: Arc<WatchTable>,
    next_id: AtomicU64,
    poll_interval: Duration,
    lookback_blocks: u64,
    retry: RetryConfig,
}

impl FinalizationWatcher {
    pub fn new(
        destination: Arc<dyn ChainConnector>,
        bridge: Address,
        bus: Arc<EventBus>,
        poll_interval: Duration,
        lookback_blocks: u64,
        retry: RetryConfig,
    ) -> Self {
        Self {
            destination,
            bridge,
            bus,
            watches: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            poll_interval,
            lookback_blocks,
            retry,
        }
    }

    pub fn register_watch(
        &self,
        origin_token: Address,
        destination_token: Address,
        from: Address,
        to: Address,
        amount: U256,
        tx_hash: B256,
    ) -> WatchHandle {
        let key = WatchKey {
            origin_token,
            from,
            to,
            amount,
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut watches = self.watches.lock().unwrap_or_else(|e| e.into_inner());
        let queue = watches.entry(key).or_default();
        if !queue.is_empty() {
            warn!(
                %tx_hash,
                outstanding = queue.len(),
                "Another deposit with the same token/from/to/amount is already awaiting finalization"
            );
        }
        queue.push_back(PendingWatch {
            id,
            tx_hash,
            destination_token,
        });
        info!("👀 Watching for finalization of {} ({} -> {}, {})", tx_hash, from, to, amount);

        WatchHandle {
            id,
            key,
            tx_hash,
            table: Arc::downgrade(&self.watches),
        }
    }

    pub fn active_watches(&self) -> usize {
        let watches = self.watches.lock().unwrap_or_else(|e| e.into_inner());
        watches.values().map(VecDeque::len).sum()
    }

    fn take_match(&self, event: &FinalizationEvent) -> Option<PendingWatch> {
        let key = WatchKey::of_event(event);
        let mut watches = self.watches.lock().unwrap_or_else(|e| e.into_inner());
        let queue = watches.get_mut(&key)?;
        let watch = queue.pop_front();
        if queue.is_empty() {
            watches.remove(&key);
        }
        watch
    }

    /// Matches one observed event. Returns the deposit it finalized, if any.
    pub async fn handle_event(&self, event: &FinalizationEvent) -> Option<B256> {
        let watch = self.take_match(event)?;

        if watch.destination_token != event.destination_token {
            debug!(
                expected = %watch.destination_token,
                observed = %event.destination_token,
                "Finalized destination token differs from the mapped one"
            );
        }
        info!(
            "🎉 Deposit {} finalized (destination tx {:?})",
            watch.tx_hash, event.tx_hash
        );

        self.bus
            .emit(BridgeEvent::DepositFinalized {
                tx_hash: watch.tx_hash,
            })
            .await;
        Some(watch.tx_hash)
    }

    /// Fetches and handles events in `[from_block, to_block]`. Returns how many matched.
    pub async fn poll_range(&self, from_block: u64, to_block: u64) -> Result<usize> {
        let events = self
            .destination
            .deposit_finalized_events(self.bridge, from_block, to_block)
            .await?;

        if !events.is_empty() {
            debug!(from_block, to_block, count = events.len(), "DepositFinalized events");
        }

        let mut matched = 0;
        for event in &events {
            if self.handle_event(event).await.is_some() {
                matched += 1;
            }
        }
        Ok(matched)
    }

    /// Polls the destination chain until `cancel` fires. Query failures are
    /// logged and the same range is retried on the next tick.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let head = execute_with_retry(
            || self.destination.block_number(),
            &self.retry,
            "Destination block number",
        )
        .await?;
        let mut next_block = head.saturating_sub(self.lookback_blocks);

        info!(
            "👀 Finalization watcher started at block {} (bridge {})",
            next_block, self.bridge
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Finalization watcher stopped");
                    return Ok(());
                }
                _ = interval.tick() => {}
            }

            let latest = match self.destination.block_number().await {
                Ok(latest) => latest,
                Err(e) => {
                    warn!(error = %e, "Failed to read destination block number");
                    continue;
                }
            };

            if latest.saturating_add(1) < next_block {
                warn!(latest, next_block, "Destination chain went backwards, rescanning");
                next_block = latest;
            }
            if latest < next_block {
                continue;
            }

            if self.active_watches() == 0 {
                next_block = latest + 1;
                continue;
            }

            match self.poll_range(next_block, latest).await {
                Ok(_) => next_block = latest + 1,
                Err(e) => warn!(
                    from_block = next_block,
                    to_block = latest,
                    error = %e,
                    "Failed to query DepositFinalized events"
                ),
            }
        }
    }
}

/// Moves a deposit to `Finalized` when the watcher reports it.
pub struct FinalizationRecorder {
    store: TransactionStore,
}

impl FinalizationRecorder {
    pub fn new(store: TransactionStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventListener for FinalizationRecorder {
    async fn on_event(&self, event: &BridgeEvent) -> Result<()> {
        let BridgeEvent::DepositFinalized { tx_hash } = event;
        let changed = self
            .store
            .update_status(*tx_hash, LifecycleStatus::Finalized)
            .await?;
        if changed {
            info!("handled deposit finalised tx {}", tx_hash);
        } else {
            debug!(%tx_hash, "Finalization already recorded or deposit untracked");
        }
        Ok(())
    }
}
