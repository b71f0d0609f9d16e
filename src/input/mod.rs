//! Input devices and binding capture for GameCube pads
//!
//! Two halves share the same [`GcAdapter`]:
//!
//! 1. Play time: [`ButtonDevice`] and [`AnalogDevice`] objects built from a
//!    stored [`ParamPackage`] read the live port snapshot on every query.
//! 2. Configuration time: an [`InputPoller`] inside a
//!    [`session::CaptureSession`] drains the capture queues and turns the
//!    first usable sample(s) into a new [`ParamPackage`].
//!
//! ```text
//! PadQueue ──► InputPoller ──► ParamPackage ──► Factory::create ──► Device
//!                                                                   │
//! PortState ◄───────────────────────────────────────────────────────┘
//! ```

pub mod analog;
pub mod button;
pub mod session;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::adapter::{GcAdapter, PadAxis, PORT_COUNT};
use crate::params::ParamPackage;

pub use analog::{AnalogPoller, GcAnalog, GcAnalogFactory};
pub use button::{ButtonPoller, GcAxisButton, GcButton, GcButtonFactory};
pub use session::{CaptureSession, CaptureState, Capturing, Idle};

/// Value of the `engine` key in every binding produced here.
pub const ENGINE: &str = "gcpad";

/// Digital input: pressed or not.
pub trait ButtonDevice: Send + Sync {
    fn status(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalogDirection {
    Right,
    Left,
    Up,
    Down,
}

/// Two-axis input with both components in `[-1, 1]`.
pub trait AnalogDevice: Send + Sync {
    fn status(&self) -> (f32, f32);

    fn direction_status(&self, direction: AnalogDirection) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollerKind {
    Button,
    Analog,
}

impl fmt::Display for PollerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollerKind::Button => write!(f, "Button"),
            PollerKind::Analog => write!(f, "Analog"),
        }
    }
}

/// Capture protocol turning queued samples into a binding.
pub trait InputPoller: Send {
    /// Drains samples until a binding is complete. Never blocks.
    fn next_input(&mut self, adapter: &GcAdapter) -> Option<ParamPackage>;

    /// Forgets any partially captured binding.
    fn reset(&mut self) {}

    fn kind(&self) -> PollerKind;
}

/// How axis-as-button devices pick the deflection that counts as pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Always ±0.10, ignoring the stored `threshold`. Matches bindings
    /// created by earlier releases.
    #[default]
    Fixed,
    /// Uses the magnitude of the binding's `threshold`.
    Stored,
}

pub(crate) fn port_param(params: &ParamPackage) -> usize {
    let port: i64 = params.get("port", 0);
    match usize::try_from(port) {
        Ok(port) if port < PORT_COUNT => port,
        _ => {
            warn!("Port {} out of range, using port 0", port);
            0
        }
    }
}

pub(crate) fn axis_param(params: &ParamPackage, key: &str, default: PadAxis) -> PadAxis {
    let id: i32 = params.get(key, default.id());
    PadAxis::from_id(id).unwrap_or_else(|| {
        warn!("Unknown axis {} for {}, using {}", id, key, default);
        default
    })
}
