//! Observers receive events for the generations they subscribed to.

use crate::progress::event::ProgressEvent;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Observer disconnected")]
    Disconnected,

    #[error("Delivery failed: {0}")]
    Failed(String),
}

/// Delivery must not block; a failure deregisters the observer.
///
/// Live events are delivered with no hub lock held. The catch-up event sent
/// from [`ProgressHub::subscribe`](crate::progress::ProgressHub::subscribe) is
/// not, so a catch-up delivery must not re-enter the hub.
pub trait ProgressObserver: Send + Sync {
    fn deliver(&self, event: &ProgressEvent) -> Result<(), DeliveryError>;
}

/// Forwards events into a tokio channel. Dropping the receiver disconnects it.
pub struct ChannelObserver {
    sender: UnboundedSender<ProgressEvent>,
}

impl ChannelObserver {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }

    pub fn pair() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressObserver for ChannelObserver {
    fn deliver(&self, event: &ProgressEvent) -> Result<(), DeliveryError> {
        self.sender
            .send(event.clone())
            .map_err(|_| DeliveryError::Disconnected)
    }
}
