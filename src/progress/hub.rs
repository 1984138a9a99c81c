//! In-process progress hub: per-generation observer lists with best-effort fan-out.

use crate::progress::event::{ProgressEvent, ProgressSnapshot};
use crate::progress::observer::{DeliveryError, ProgressObserver};
use crate::progress::ProgressSink;
use crate::types::GenerationId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    observer: Arc<dyn ProgressObserver>,
}

/// Constructed once per process and shared by reference with every orchestrator run.
#[derive(Default)]
pub struct ProgressHub {
    observers: RwLock<HashMap<GenerationId, Vec<Subscription>>>,
    next_id: AtomicU64,
}

impl ProgressHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register `observer` for `generation_id`.
    ///
    /// When `catch_up` shows the generation has already advanced, a synthetic
    /// `progress_update` is delivered before any live event. An observer that
    /// fails the catch-up delivery is not registered.
    ///
    /// The catch-up is delivered while the observer table is locked, so its
    /// `deliver` must not call back into this hub.
    pub fn subscribe(
        &self,
        generation_id: &GenerationId,
        observer: Arc<dyn ProgressObserver>,
        catch_up: Option<ProgressSnapshot>,
    ) -> Result<SubscriptionId, DeliveryError> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut observers = self.observers.write();
        if let Some(snapshot) = catch_up.filter(|s| s.progress > 0) {
            let event = ProgressEvent::progress_update(generation_id, snapshot.progress, snapshot.step);
            observer.deliver(&event)?;
        }
        observers
            .entry(generation_id.clone())
            .or_default()
            .push(Subscription { id, observer });
        debug!(generation_id = %generation_id, subscription = id.0, "Observer subscribed");
        Ok(id)
    }

    /// Remove one subscription. Returns whether it was registered.
    pub fn unsubscribe(&self, generation_id: &GenerationId, subscription: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let Some(list) = observers.get_mut(generation_id) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| s.id != subscription);
        let removed = list.len() != before;
        if list.is_empty() {
            observers.remove(generation_id);
        }
        removed
    }

    /// Drop every observer of a finished generation. Returns how many were released.
    pub fn close(&self, generation_id: &GenerationId) -> usize {
        let released = self
            .observers
            .write()
            .remove(generation_id)
            .map(|list| list.len())
            .unwrap_or(0);
        if released > 0 {
            debug!(generation_id = %generation_id, released, "Observers released");
        }
        released
    }

    pub fn subscriber_count(&self, generation_id: &GenerationId) -> usize {
        self.observers
            .read()
            .get(generation_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Number of generations with at least one observer.
    pub fn tracked_generations(&self) -> usize {
        self.observers.read().len()
    }

    fn deregister(&self, generation_id: &GenerationId, failed: &[SubscriptionId]) {
        let mut observers = self.observers.write();
        if let Some(list) = observers.get_mut(generation_id) {
            list.retain(|s| !failed.contains(&s.id));
            if list.is_empty() {
                observers.remove(generation_id);
            }
        }
    }
}

impl ProgressSink for ProgressHub {
    fn publish(&self, generation_id: &GenerationId, event: ProgressEvent) {
        // Copy the list so observers can (un)subscribe while we deliver.
        let targets = match self.observers.read().get(generation_id) {
            Some(list) => list.clone(),
            None => return,
        };

        let mut failed = Vec::new();
        for subscription in &targets {
            if let Err(err) = subscription.observer.deliver(&event) {
                warn!(
                    generation_id = %generation_id,
                    subscription = subscription.id.0,
                    error = %err,
                    "Dropping observer after failed delivery"
                );
                failed.push(subscription.id);
            }
        }

        if !failed.is_empty() {
            self.deregister(generation_id, &failed);
        }
    }
}
