//! Progress broadcast: event schema, the sink contract, and the in-process hub.

pub mod event;
pub mod hub;
pub mod observer;

pub use event::{EventKind, ProgressEvent, ProgressSnapshot};
pub use hub::{ProgressHub, SubscriptionId};
pub use observer::{ChannelObserver, DeliveryError, ProgressObserver};

use crate::types::GenerationId;

/// Accepts progress events keyed by generation.
///
/// Publishing is best-effort and never fails the caller. With no observers
/// registered for `generation_id` it is a no-op that retains nothing.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, generation_id: &GenerationId, event: ProgressEvent);
}
