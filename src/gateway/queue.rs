use std::fmt;
use std::str::FromStr;
use tokio::sync::mpsc::{self, error::TrySendError};

/// What the reader does when the inbound queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpressure {
    /// Stop reading the socket until the processing loop catches up.
    Block,
    /// Discard the frame that just arrived.
    DropNewest,
    /// Evict the oldest queued frame to make room.
    DropOldest,
}

impl FromStr for Backpressure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "block" => Ok(Backpressure::Block),
            "drop-newest" | "drop_newest" => Ok(Backpressure::DropNewest),
            "drop-oldest" | "drop_oldest" => Ok(Backpressure::DropOldest),
            other => Err(format!("unknown backpressure policy {other:?}")),
        }
    }
}

impl fmt::Display for Backpressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backpressure::Block => "block",
            Backpressure::DropNewest => "drop-newest",
            Backpressure::DropOldest => "drop-oldest",
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Pushed {
    Queued,
    /// The incoming frame was discarded.
    DroppedNewest,
    /// The incoming frame was queued after evicting the oldest one.
    EvictedOldest,
    /// The processing loop is gone.
    Closed,
}

/// Bounded FIFO handoff between one connection's reader and its processing
/// loop. Dropping the sender closes the queue; frames already queued are
/// still delivered.
pub fn inbound(capacity: usize, policy: Backpressure) -> (InboundSender, InboundReceiver) {
    let capacity = capacity.max(1);
    match policy {
        Backpressure::Block | Backpressure::DropNewest => {
            let (tx, rx) = mpsc::channel(capacity);
            (
                InboundSender::Mpsc { tx, policy },
                InboundReceiver::Mpsc(rx),
            )
        }
        // mpsc cannot evict from the sending side.
        Backpressure::DropOldest => {
            let (tx, rx) = async_channel::bounded(capacity);
            (InboundSender::Ring(tx), InboundReceiver::Ring(rx))
        }
    }
}

pub enum InboundSender {
    Mpsc {
        tx: mpsc::Sender<Vec<u8>>,
        policy: Backpressure,
    },
    Ring(async_channel::Sender<Vec<u8>>),
}

impl InboundSender {
    pub async fn push(&self, frame: Vec<u8>) -> Pushed {
        match self {
            InboundSender::Mpsc {
                tx,
                policy: Backpressure::Block,
            } => match tx.send(frame).await {
                Ok(()) => Pushed::Queued,
                Err(_) => Pushed::Closed,
            },
            InboundSender::Mpsc { tx, .. } => match tx.try_send(frame) {
                Ok(()) => Pushed::Queued,
                Err(TrySendError::Full(_)) => Pushed::DroppedNewest,
                Err(TrySendError::Closed(_)) => Pushed::Closed,
            },
            InboundSender::Ring(tx) => match tx.force_send(frame) {
                Ok(None) => Pushed::Queued,
                Ok(Some(_evicted)) => Pushed::EvictedOldest,
                Err(_) => Pushed::Closed,
            },
        }
    }
}

pub enum InboundReceiver {
    Mpsc(mpsc::Receiver<Vec<u8>>),
    Ring(async_channel::Receiver<Vec<u8>>),
}

impl InboundReceiver {
    /// Next frame in arrival order; `None` once the sender is gone and the
    /// queue is drained.
    pub async fn pop(&mut self) -> Option<Vec<u8>> {
        match self {
            InboundReceiver::Mpsc(rx) => rx.recv().await,
            InboundReceiver::Ring(rx) => rx.recv().await.ok(),
        }
    }
}
