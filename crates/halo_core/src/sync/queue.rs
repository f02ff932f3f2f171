//! Bounded channel of pending commits.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::error::{HaloError, HaloResult};

/// A mutation waiting for the next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCommit {
    /// Raw text, tokenized when applied.
    Text(String),
    /// Empty both populations.
    Clear,
}

/// Receiving side, owned by the engine.
#[derive(Debug)]
pub struct CommitQueue {
    sender: Sender<PendingCommit>,
    receiver: Receiver<PendingCommit>,
    capacity: usize,
}

impl CommitQueue {
    /// Creates a queue holding at most `capacity` pending commits.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> CommitSender {
        CommitSender {
            sender: self.sender.clone(),
            capacity: self.capacity,
        }
    }

    /// Takes every pending commit, oldest first (non-blocking).
    pub fn drain(&self) -> Vec<PendingCommit> {
        self.receiver.try_iter().collect()
    }

    /// Commits waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// No commit waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Sending side, handed to input threads.
#[derive(Debug, Clone)]
pub struct CommitSender {
    sender: Sender<PendingCommit>,
    capacity: usize,
}

impl CommitSender {
    /// Queues text for the next tick.
    pub fn commit_text(&self, text: impl Into<String>) -> HaloResult<()> {
        self.send(PendingCommit::Text(text.into()))
    }

    /// Queues a clear for the next tick.
    pub fn clear(&self) -> HaloResult<()> {
        self.send(PendingCommit::Clear)
    }

    /// Queues a commit without blocking.
    pub fn send(&self, commit: PendingCommit) -> HaloResult<()> {
        match self.sender.try_send(commit) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(HaloError::CommitQueueFull {
                capacity: self.capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(HaloError::EngineGone),
        }
    }
}
