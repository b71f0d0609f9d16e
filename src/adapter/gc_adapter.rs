use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, trace, warn};

use super::pad::{PadSample, PortState};
use super::pad_queue::PadQueue;

pub const PORT_COUNT: usize = 4;

#[derive(Debug, Default)]
struct PortSlot {
    state: RwLock<PortState>,
    queue: PadQueue,
}

/// Shared context between the polling thread and everything reading pads.
///
/// The producer writes port snapshots through [`GcAdapter::update_port`].
/// Devices read them through [`GcAdapter::port_state`], which copies the
/// whole snapshot under the port's lock so no reader sees a half-written
/// update. Capture samples are only queued while a capture session is open.
///
/// Hold it in an `Arc`: devices and capture sessions keep a clone, so the
/// adapter outlives all of them.
#[derive(Debug, Default)]
pub struct GcAdapter {
    ports: [PortSlot; PORT_COUNT],
    open_sessions: AtomicUsize,
}

impl GcAdapter {
    pub fn new() -> Self {
        info!("Creating GameCube adapter context with {} ports", PORT_COUNT);
        Self::default()
    }

    /// Copy of the current state of `port`, or `None` for an unknown port.
    pub fn port_state(&self, port: usize) -> Option<PortState> {
        let slot = self.ports.get(port)?;
        let state = slot.state.read().unwrap_or_else(PoisonError::into_inner);
        Some(*state)
    }

    /// Publishes a new reading for `port`.
    ///
    /// While capturing, the reading is also turned into a [`PadSample`] and
    /// queued when it shows a pressed button or a clearly moved axis.
    pub fn update_port(&self, port: usize, state: PortState) {
        let Some(slot) = self.ports.get(port) else {
            warn!("Ignoring state for unknown port {}", port);
            return;
        };

        {
            let mut current = slot.state.write().unwrap_or_else(PoisonError::into_inner);
            *current = state;
        }

        if self.is_configuring() {
            if let Some(sample) = PadSample::from_state(port, &state) {
                trace!("Queueing capture sample {:?}", sample);
                slot.queue.push(sample);
            }
        }
    }

    /// Queues a ready-made sample. Dropped unless a capture session is open.
    pub fn push_sample(&self, sample: PadSample) {
        let Some(slot) = self.ports.get(sample.port) else {
            warn!("Dropping sample for unknown port {}", sample.port);
            return;
        };
        if !self.is_configuring() {
            trace!("Not configuring, dropping sample {:?}", sample);
            return;
        }
        slot.queue.push(sample);
    }

    pub fn queue(&self, port: usize) -> Option<&PadQueue> {
        self.ports.get(port).map(|slot| &slot.queue)
    }

    /// All queues in port order.
    pub fn queues(&self) -> impl Iterator<Item = (usize, &PadQueue)> {
        self.ports.iter().map(|slot| &slot.queue).enumerate()
    }

    pub fn clear_queues(&self) {
        let dropped: usize = self.ports.iter().map(|slot| slot.queue.clear()).sum();
        if dropped > 0 {
            debug!("Cleared {} stale capture samples", dropped);
        }
    }

    /// Opens capture mode. Nested sessions keep it open until the last ends.
    ///
    /// Open sessions share the per-port queues: a sample popped by one
    /// session is gone for every other session.
    pub fn begin_configuration(&self) {
        self.clear_queues();
        let open = self.open_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Capture mode enabled ({} open sessions)", open);
    }

    pub fn end_configuration(&self) {
        let previous = self
            .open_sessions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |open| {
                open.checked_sub(1)
            });
        match previous {
            Ok(1) => info!("Capture mode disabled"),
            Ok(open) => debug!("Capture session closed, {} still open", open - 1),
            Err(_) => warn!("end_configuration called without an open capture session"),
        }
        self.clear_queues();
    }

    pub fn is_configuring(&self) -> bool {
        self.open_sessions.load(Ordering::SeqCst) > 0
    }
}

/// Holds capture mode open on an adapter until dropped.
#[derive(Debug)]
pub struct CaptureRegistration {
    adapter: Arc<GcAdapter>,
}

impl CaptureRegistration {
    pub fn open(adapter: Arc<GcAdapter>) -> Self {
        adapter.begin_configuration();
        Self { adapter }
    }
}

impl Drop for CaptureRegistration {
    fn drop(&mut self) {
        self.adapter.end_configuration();
    }
}
