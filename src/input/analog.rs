use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::session::{CaptureSession, Capturing};
use super::{axis_param, port_param, AnalogDevice, AnalogDirection, InputPoller, PollerKind, ENGINE};
use crate::adapter::{GcAdapter, PadAxis};
use crate::params::ParamPackage;

/// Deflection below which a capture sample is treated as idle noise.
pub const CAPTURE_DEADZONE: f32 = 0.1;

/// Per-axis magnitude a deadzoned stick needs to report a direction.
pub const DIRECTIONAL_DEADZONE: f32 = 0.4;

pub const MAX_DEADZONE: f32 = 0.99;

// Sticks rarely reach the full 0..=255 range; 95 maps the usual travel
// onto [-1, 1].
const STICK_RANGE: f32 = 95.0;

/// Analog stick built from two axes of one port.
pub struct GcAnalog {
    port: usize,
    axis_x: PadAxis,
    axis_y: PadAxis,
    deadzone: f32,
    adapter: Arc<GcAdapter>,
}

impl GcAnalog {
    pub fn new(
        port: usize,
        axis_x: PadAxis,
        axis_y: PadAxis,
        deadzone: f32,
        adapter: Arc<GcAdapter>,
    ) -> Self {
        let deadzone = if deadzone.is_finite() {
            deadzone
        } else {
            warn!("Deadzone {} is not a number, using 0", deadzone);
            0.0
        };
        Self {
            port,
            axis_x,
            axis_y,
            deadzone: deadzone.clamp(0.0, MAX_DEADZONE),
            adapter,
        }
    }

    fn normalize(raw: u8) -> f32 {
        (f32::from(raw) - 128.0) / STICK_RANGE
    }

    /// Both axes from one snapshot, pulled back onto the unit circle.
    fn raw_vector(&self) -> (f32, f32) {
        let state = self.adapter.port_state(self.port).unwrap_or_default();
        clamp_to_unit_circle(
            Self::normalize(state.axis(self.axis_x)),
            Self::normalize(state.axis(self.axis_y)),
        )
    }
}

fn clamp_to_unit_circle(x: f32, y: f32) -> (f32, f32) {
    let r = x.hypot(y);
    if r > 1.0 {
        (x / r, y / r)
    } else {
        (x, y)
    }
}

/// Radial deadzone: zero up to `deadzone`, then a linear ramp reaching 1 on
/// the unit circle.
fn apply_radial_deadzone(x: f32, y: f32, deadzone: f32) -> (f32, f32) {
    let r = x.hypot(y);
    if r <= deadzone {
        return (0.0, 0.0);
    }
    let scale = (r - deadzone) / (r * (1.0 - deadzone));
    (x * scale, y * scale)
}

impl AnalogDevice for GcAnalog {
    fn status(&self) -> (f32, f32) {
        let (x, y) = self.raw_vector();
        apply_radial_deadzone(x, y, self.deadzone)
    }

    fn direction_status(&self, direction: AnalogDirection) -> bool {
        let (x, y) = self.status();
        match direction {
            AnalogDirection::Right => x > DIRECTIONAL_DEADZONE,
            AnalogDirection::Left => x < -DIRECTIONAL_DEADZONE,
            AnalogDirection::Up => y > DIRECTIONAL_DEADZONE,
            AnalogDirection::Down => y < -DIRECTIONAL_DEADZONE,
        }
    }
}

/// First axis of an analog binding, waiting for its partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfBinding {
    pub axis: PadAxis,
    pub port: usize,
}

/// Capture protocol pairing two axis movements into one stick binding.
///
/// Every sample reports a single axis, so the first moved axis is held as a
/// [`HalfBinding`] until a different axis moves on the same port. Samples
/// from other ports are dropped while a half-binding is held.
#[derive(Debug, Default)]
pub struct AnalogPoller {
    pending: Option<HalfBinding>,
}

impl AnalogPoller {
    pub fn pending(&self) -> Option<HalfBinding> {
        self.pending
    }
}

impl InputPoller for AnalogPoller {
    fn next_input(&mut self, adapter: &GcAdapter) -> Option<ParamPackage> {
        for (port, queue) in adapter.queues() {
            while let Some(sample) = queue.pop() {
                let Some(axis) = sample.axis else {
                    continue;
                };
                if sample.normalized_axis().abs() < CAPTURE_DEADZONE {
                    trace!("Ignoring idle axis sample {:?}", sample);
                    continue;
                }

                match self.pending {
                    None => {
                        debug!("Holding {} on port {} as x axis", axis, port);
                        self.pending = Some(HalfBinding { axis, port });
                    }
                    Some(half) if half.port == port && half.axis != axis => {
                        self.pending = None;
                        let mut params = ParamPackage::new();
                        params.set("engine", ENGINE);
                        params.set("port", port);
                        params.set("axis_x", half.axis.id());
                        params.set("axis_y", axis.id());
                        return Some(params);
                    }
                    Some(half) => {
                        trace!(
                            "Dropping {} on port {} while holding {} on port {}",
                            axis,
                            port,
                            half.axis,
                            half.port
                        );
                    }
                }
            }
        }
        None
    }

    fn reset(&mut self) {
        if let Some(half) = self.pending.take() {
            debug!("Discarding half-bound {} on port {}", half.axis, half.port);
        }
    }

    fn kind(&self) -> PollerKind {
        PollerKind::Analog
    }
}

/// Builds analog sticks from stored bindings and opens capture sessions.
#[derive(Clone)]
pub struct GcAnalogFactory {
    adapter: Arc<GcAdapter>,
    default_deadzone: f32,
}

impl GcAnalogFactory {
    pub fn new(adapter: Arc<GcAdapter>, default_deadzone: f32) -> Self {
        Self {
            adapter,
            default_deadzone,
        }
    }

    /// Creates a stick from `port`, `axis_x`, `axis_y` and `deadzone`.
    ///
    /// Defaults: port 0, axes 0 and 1, the factory's deadzone. A deadzone that
    /// is not a finite number also falls back to the factory's. The result is
    /// clamped into `[0, 0.99]`.
    pub fn create(&self, params: &ParamPackage) -> Box<dyn AnalogDevice> {
        let port = port_param(params);
        let axis_x = axis_param(params, "axis_x", PadAxis::StickX);
        let axis_y = axis_param(params, "axis_y", PadAxis::StickY);
        let mut deadzone = params.get("deadzone", self.default_deadzone);
        if !deadzone.is_finite() {
            warn!(
                "Binding {} has a non-finite deadzone, using {}",
                params, self.default_deadzone
            );
            deadzone = self.default_deadzone;
        }
        debug!(
            "Creating analog stick: port={}, x={}, y={}, deadzone={}",
            port, axis_x, axis_y, deadzone
        );
        Box::new(GcAnalog::new(
            port,
            axis_x,
            axis_y,
            deadzone,
            self.adapter.clone(),
        ))
    }

    pub fn begin_configuration(&self) -> CaptureSession<Capturing> {
        CaptureSession::create(self.adapter.clone(), Box::new(AnalogPoller::default())).begin()
    }
}
