use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::core::error::BootstrapResult;
use crate::core::events::ProgressEvent;

/// A component that reacts to progress events. Handlers may publish further
/// events through the bus handle they receive; the bus queues those and
/// delivers them after the active pass completes.
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    async fn update(&self, event: &ProgressEvent, bus: &EventBus) -> BootstrapResult<()>;
}

/// Serializes event delivery to registered observers.
///
/// At most one dispatch pass is active at any time. A `publish` from inside
/// an observer's handler appends to a FIFO pending queue instead of
/// dispatching immediately; once the active pass finishes, the queue drains
/// one event at a time, running a full observer pass for each. Reentrant
/// recursion therefore becomes breadth-first, order-preserving delivery.
///
/// The guard assumes a single publishing task; concurrent publishes from
/// multiple tasks are outside the contract.
#[derive(Default)]
pub struct EventBus {
    observers: Mutex<Vec<Arc<dyn ProgressObserver>>>,
    pending: Mutex<VecDeque<ProgressEvent>>,
    dispatching: AtomicBool,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer. Registration order is delivery order and
    /// duplicates are allowed.
    pub fn register(&self, observer: Arc<dyn ProgressObserver>) {
        self.observers
            .lock()
            .expect("observer list lock poisoned")
            .push(observer);
    }

    /// Deliver `event` to every observer in registration order, then drain
    /// any events the handlers raised. An observer error propagates to the
    /// caller; events still pending at that point are dropped with it.
    pub async fn publish(&self, event: ProgressEvent) -> BootstrapResult<()> {
        if self.dispatching.load(Ordering::SeqCst) {
            debug!("Queueing reentrant event: {}", event);
            self.pending
                .lock()
                .expect("pending queue lock poisoned")
                .push_back(event);
            return Ok(());
        }

        if let Err(err) = self.dispatch_pass(event).await {
            self.clear_pending();
            return Err(err);
        }
        while let Some(next) = self.pop_pending() {
            if let Err(err) = self.dispatch_pass(next).await {
                self.clear_pending();
                return Err(err);
            }
        }
        Ok(())
    }

    async fn dispatch_pass(&self, event: ProgressEvent) -> BootstrapResult<()> {
        self.dispatching.store(true, Ordering::SeqCst);
        debug!("Dispatching event: {}", event);

        let observers = self
            .observers
            .lock()
            .expect("observer list lock poisoned")
            .clone();
        for observer in observers {
            if let Err(err) = observer.update(&event, self).await {
                self.dispatching.store(false, Ordering::SeqCst);
                return Err(err);
            }
        }

        self.dispatching.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn pop_pending(&self) -> Option<ProgressEvent> {
        self.pending
            .lock()
            .expect("pending queue lock poisoned")
            .pop_front()
    }

    fn clear_pending(&self) {
        self.pending
            .lock()
            .expect("pending queue lock poisoned")
            .clear();
    }
}
