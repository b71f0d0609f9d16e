use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::pad::PadSample;

/// Per-port FIFO of capture samples.
///
/// The producer side never blocks. Consumers drain with [`PadQueue::pop`],
/// which returns immediately when no sample is waiting.
#[derive(Debug)]
pub struct PadQueue {
    sender: mpsc::UnboundedSender<PadSample>,
    receiver: Mutex<mpsc::UnboundedReceiver<PadSample>>,
}

impl PadQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    pub fn push(&self, sample: PadSample) {
        // The receiver lives as long as the queue, so sending cannot fail.
        if self.sender.send(sample).is_err() {
            debug!("Pad queue receiver closed, dropping sample");
        }
    }

    pub fn pop(&self) -> Option<PadSample> {
        let mut receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match receiver.try_recv() {
            Ok(sample) => {
                trace!("Popped sample: {:?}", sample);
                Some(sample)
            }
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => None,
        }
    }

    /// Discards every queued sample and returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut dropped = 0;
        while self.pop().is_some() {
            dropped += 1;
        }
        dropped
    }
}

impl Default for PadQueue {
    fn default() -> Self {
        Self::new()
    }
}
