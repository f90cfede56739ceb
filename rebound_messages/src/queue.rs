//! Single-writer handoff of raw frames from the transport to the simulation thread.
//!
//! The transport delivers frames from its own callback context. Instead of touching
//! simulation state from there, it pushes the frames through an [`InboundSender`];
//! the simulation drains the matching [`InboundQueue`] once per tick.
//! Frames going the other way wait in an [`OutboundQueue`].
use crate::protocol::{InboundMessage, decode};
use alloc::string::String;
use alloc::vec::Vec;
use bevy_ecs::component::Component;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use rebound_core::time::Timestamp;
use tracing::{trace, warn};

/// Cloneable handle given to the transport to enqueue received frames.
#[derive(Clone, Debug)]
pub struct InboundSender {
    sender: Sender<String>,
}

impl InboundSender {
    /// Enqueue a text frame.
    ///
    /// Returns false if the queue has been dropped, or if it is bounded and full.
    pub fn push(&self, frame: impl Into<String>) -> bool {
        match self.sender.try_send(frame.into()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("inbound queue is full, dropping frame");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Enqueue a binary frame containing UTF-8 text
    pub fn push_bytes(&self, bytes: &[u8]) -> bool {
        self.push(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Receiving end of the inbound frame queue, owned by the simulation
#[derive(Component, Debug)]
pub struct InboundQueue {
    sender: Sender<String>,
    receiver: Receiver<String>,
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl InboundQueue {
    pub fn unbounded() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// A queue holding at most `capacity` undrained frames; extra frames are dropped
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        Self { sender, receiver }
    }

    pub fn sender(&self) -> InboundSender {
        InboundSender {
            sender: self.sender.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Take every frame currently queued, without decoding it
    pub fn drain_frames(&self) -> Vec<String> {
        self.receiver.try_iter().collect()
    }

    /// Take and decode every frame currently queued.
    ///
    /// Frames that fail to decode are logged and dropped.
    pub fn drain(&self, received_at: Timestamp) -> Vec<InboundMessage> {
        self.receiver
            .try_iter()
            .filter_map(|frame| match decode(&frame, received_at) {
                Ok(message) => {
                    trace!(?message, "decoded inbound frame");
                    Some(message)
                }
                Err(e) => {
                    warn!(error = %e, %frame, "dropping malformed inbound frame");
                    None
                }
            })
            .collect()
    }

}

/// Frames waiting for the transport to send them.
///
/// The simulation pushes encoded frames; the transport holds a clone of the queue and
/// drains it from its own context.
#[derive(Component, Debug, Clone)]
pub struct OutboundQueue {
    sender: Sender<String>,
    receiver: Receiver<String>,
}

impl Default for OutboundQueue {
    fn default() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }
}

impl OutboundQueue {
    pub fn push(&self, frame: String) {
        trace!(%frame, "queueing outbound frame");
        // both ends live in the queue, so the channel cannot be disconnected
        let _ = self.sender.send(frame);
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Take every frame waiting to be sent, in the order they were pushed
    pub fn drain(&self) -> Vec<String> {
        self.receiver.try_iter().collect()
    }
}
