use alloy::primitives::B256;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    DepositFinalized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// A destination-chain event matched the deposit sent in `tx_hash`.
    DepositFinalized { tx_hash: B256 },
}

impl BridgeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            BridgeEvent::DepositFinalized { .. } => EventKind::DepositFinalized,
        }
    }
}

#[async_trait]
pub trait EventListener: Send + Sync {
    async fn on_event(&self, event: &BridgeEvent) -> Result<()>;
}

/// Publish/subscribe channel shared by the components of one relayer.
///
/// `emit` runs every listener registered for the event's kind, one after
/// another in registration order, on the caller's task. A failing listener
/// is logged and does not stop the others.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<EventKind, Vec<Arc<dyn EventListener>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: EventKind, listener: Arc<dyn EventListener>) {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        listeners.entry(kind).or_default().push(listener);
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
        listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Returns how many listeners handled the event without error.
    pub async fn emit(&self, event: BridgeEvent) -> usize {
        let targets: Vec<Arc<dyn EventListener>> = {
            let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
            listeners.get(&event.kind()).cloned().unwrap_or_default()
        };

        debug!(?event, listeners = targets.len(), "Emitting bridge event");

        let mut handled = 0;
        for listener in targets {
            match listener.on_event(&event).await {
                Ok(()) => handled += 1,
                Err(e) => error!(?event, error = %e, "Event listener failed"),
            }
        }
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    #[async_trait]
    impl EventListener for Recorder {
        async fn on_event(&self, _event: &BridgeEvent) -> Result<()> {
            self.log.lock().unwrap().push(self.name);
            if self.fail {
                anyhow::bail!("{} failed", self.name);
            }
            Ok(())
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>, fail: bool) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            log: log.clone(),
            fail,
        })
    }

    fn finalized() -> BridgeEvent {
        BridgeEvent::DepositFinalized {
            tx_hash: B256::from([7u8; 32]),
        }
    }

    #[tokio::test]
    async fn listeners_run_in_registration_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventKind::DepositFinalized, recorder("first", &log, false));
        bus.subscribe(EventKind::DepositFinalized, recorder("second", &log, false));

        assert_eq!(bus.emit(finalized()).await, 2);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn failing_listener_does_not_stop_the_rest() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventKind::DepositFinalized, recorder("broken", &log, true));
        bus.subscribe(EventKind::DepositFinalized, recorder("healthy", &log, false));

        assert_eq!(bus.emit(finalized()).await, 1);
        assert_eq!(*log.lock().unwrap(), vec!["broken", "healthy"]);
    }

    #[tokio::test]
    async fn late_subscribers_miss_earlier_events() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        assert_eq!(bus.emit(finalized()).await, 0);
        bus.subscribe(EventKind::DepositFinalized, recorder("late", &log, false));

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(bus.listener_count(EventKind::DepositFinalized), 1);
    }
}
