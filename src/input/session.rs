//! Capture session lifecycle
//!
//! A session brackets the interval in which queued samples are read as new
//! bindings instead of live input:
//!
//! ```text
//! Idle ──begin──► Capturing ──end──► Idle
//!                   │    ▲
//!                   └────┘ next_input
//! ```
//!
//! Both transitions reset the poller, so a half-captured binding never leaks
//! into the next session. `next_input` only exists on a capturing session.
//! A capturing session holds a [`CaptureRegistration`], so dropping it
//! without `end` still closes its share of capture mode.
//!
//! Sessions open at the same time read the same per-port queues. Each
//! sample reaches whichever session polls first.

use statum::{machine, state};
use std::sync::Arc;
use tracing::{debug, info};

use super::{InputPoller, PollerKind};
use crate::adapter::{CaptureRegistration, GcAdapter};
use crate::params::ParamPackage;

#[state]
#[derive(Debug, Clone)]
pub enum CaptureState {
    Idle,
    Capturing,
}

#[machine]
pub struct CaptureSession<S: CaptureState> {
    adapter: Arc<GcAdapter>,
    poller: Box<dyn InputPoller>,
    registration: Option<CaptureRegistration>,
}

impl<S: CaptureState> CaptureSession<S> {
    pub fn kind(&self) -> PollerKind {
        self.poller.kind()
    }

    pub fn adapter(&self) -> &Arc<GcAdapter> {
        &self.adapter
    }
}

impl CaptureSession<Idle> {
    pub fn create(adapter: Arc<GcAdapter>, poller: Box<dyn InputPoller>) -> Self {
        debug!("Creating {} capture session", poller.kind());
        Self::new(adapter, poller, None)
    }

    /// Clears the capture queues and switches the adapter into capture mode.
    pub fn begin(mut self) -> CaptureSession<Capturing> {
        info!("Beginning {} capture", self.poller.kind());
        self.poller.reset();
        self.registration = Some(CaptureRegistration::open(self.adapter.clone()));
        self.transition()
    }
}

impl CaptureSession<Capturing> {
    /// Next complete binding, or `None` if the samples so far don't make one.
    pub fn next_input(&mut self) -> Option<ParamPackage> {
        let params = self.poller.next_input(&self.adapter);
        if let Some(params) = &params {
            info!("Captured {} binding: {}", self.poller.kind(), params);
        }
        params
    }

    pub fn end(mut self) -> CaptureSession<Idle> {
        info!("Ending {} capture", self.poller.kind());
        drop(self.registration.take());
        self.poller.reset();
        self.transition()
    }
}
