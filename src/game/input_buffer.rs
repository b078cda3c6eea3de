//! Lock-free host message buffer
//!
//! Uses crossbeam-channel so input handlers and the authoritative sync
//! channel can submit from any thread. The game loop drains everything
//! at the start of each tick.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::game::state::{AgentId, Intent};
use crate::net::protocol::SyncBatch;

/// Message from the host into the simulation
#[derive(Debug, Clone)]
pub enum HostMessage {
    /// Latest steering/boost request for a local agent
    Intent { agent: AgentId, intent: Intent },
    /// Trusted state from the authoritative channel
    Sync(SyncBatch),
}

/// Bounded MPSC buffer drained once per tick
pub struct InputBuffer {
    sender: Sender<HostMessage>,
    receiver: Receiver<HostMessage>,
    capacity: usize,
}

impl InputBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Create a new sender handle; each producer holds its own clone
    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    /// Drain all pending messages in submission order
    pub fn drain(&self) -> Vec<HostMessage> {
        self.receiver.try_iter().collect()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        // 48 agents at a few intents per tick plus sync deliveries
        Self::new(1024)
    }
}

/// Clonable sender handle
#[derive(Clone)]
pub struct InputSender {
    sender: Sender<HostMessage>,
}

impl InputSender {
    /// Submit an intent (non-blocking)
    #[inline]
    pub fn send_intent(&self, agent: AgentId, intent: Intent) -> Result<(), InputBufferError> {
        self.send(HostMessage::Intent { agent, intent })
    }

    /// Submit an authoritative batch (non-blocking)
    #[inline]
    pub fn send_sync(&self, batch: SyncBatch) -> Result<(), InputBufferError> {
        self.send(HostMessage::Sync(batch))
    }

    pub fn send(&self, message: HostMessage) -> Result<(), InputBufferError> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => InputBufferError::Full,
            TrySendError::Disconnected(_) => InputBufferError::Disconnected,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InputBufferError {
    /// Backpressure
    #[error("input buffer full")]
    Full,
    /// Game loop dropped
    #[error("input buffer disconnected")]
    Disconnected,
}
