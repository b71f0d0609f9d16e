//! Host gamepads as adapter ports
//!
//! Polls gilrs and mirrors every connected gamepad into one adapter port,
//! assigned in order of first appearance. Buttons are laid out the way a
//! GameCube pad would sit on a modern controller: south is A, west is B,
//! east is X and north is Y.

use gilrs::{Axis, Button, Event, EventType, GamepadId, Gilrs};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::adapter::{GcAdapter, PadAxis, PadButtons, PortState, PORT_COUNT};

#[derive(Debug, thiserror::Error)]
pub enum GilrsSourceError {
    #[error("Failed to initialize gilrs: {0}")]
    InitializationError(String),
}

pub struct GilrsSource {
    gilrs: Gilrs,
    ports: HashMap<GamepadId, usize>,
    states: [PortState; PORT_COUNT],
}

impl GilrsSource {
    pub fn create() -> Result<Self, GilrsSourceError> {
        info!("Initializing gilrs controller interface");
        let gilrs = Gilrs::new().map_err(|e| {
            error!("Failed to initialize gilrs: {}", e);
            GilrsSourceError::InitializationError(e.to_string())
        })?;

        let mut source = Self {
            gilrs,
            ports: HashMap::new(),
            states: [PortState::default(); PORT_COUNT],
        };
        let connected: Vec<(GamepadId, String)> = source
            .gilrs
            .gamepads()
            .map(|(id, gamepad)| (id, gamepad.name().to_string()))
            .collect();
        for (id, name) in connected {
            if let Some(port) = source.port_for(id) {
                info!("Gamepad {} ({}) mapped to port {}", name, id, port);
            }
        }
        Ok(source)
    }

    fn port_for(&mut self, id: GamepadId) -> Option<usize> {
        if let Some(port) = self.ports.get(&id) {
            return Some(*port);
        }
        let port = self.ports.len();
        if port >= PORT_COUNT {
            debug!("No free port for gamepad {}", id);
            return None;
        }
        self.ports.insert(id, port);
        Some(port)
    }

    /// Applies every pending gilrs event to `adapter`.
    pub fn poll(&mut self, adapter: &GcAdapter) -> usize {
        let mut handled = 0;
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            let Some(port) = self.port_for(id) else {
                continue;
            };
            let state = &mut self.states[port];
            if apply_event(state, event) {
                adapter.update_port(port, *state);
                handled += 1;
            }
        }
        handled
    }

    /// Polls on a blocking thread until `cancel` fires.
    pub fn spawn(mut self, adapter: Arc<GcAdapter>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            info!("Starting gilrs polling loop");
            while !cancel.is_cancelled() {
                self.poll(&adapter);
                std::thread::sleep(std::time::Duration::from_micros(100));
            }
            info!("gilrs polling loop stopped");
        })
    }
}

fn map_button(button: Button) -> Option<PadButtons> {
    match button {
        Button::South => Some(PadButtons::A),
        Button::West => Some(PadButtons::B),
        Button::East => Some(PadButtons::X),
        Button::North => Some(PadButtons::Y),
        Button::Start => Some(PadButtons::START),
        Button::RightTrigger => Some(PadButtons::Z),
        Button::LeftTrigger2 => Some(PadButtons::L),
        Button::RightTrigger2 => Some(PadButtons::R),
        Button::DPadUp => Some(PadButtons::UP),
        Button::DPadDown => Some(PadButtons::DOWN),
        Button::DPadLeft => Some(PadButtons::LEFT),
        Button::DPadRight => Some(PadButtons::RIGHT),
        _ => None,
    }
}

fn map_axis(axis: Axis) -> Option<PadAxis> {
    match axis {
        Axis::LeftStickX => Some(PadAxis::StickX),
        Axis::LeftStickY => Some(PadAxis::StickY),
        Axis::RightStickX => Some(PadAxis::SubstickX),
        Axis::RightStickY => Some(PadAxis::SubstickY),
        Axis::LeftZ => Some(PadAxis::TriggerLeft),
        Axis::RightZ => Some(PadAxis::TriggerRight),
        _ => None,
    }
}

fn trigger_axis(button: Button) -> Option<PadAxis> {
    match button {
        Button::LeftTrigger2 => Some(PadAxis::TriggerLeft),
        Button::RightTrigger2 => Some(PadAxis::TriggerRight),
        _ => None,
    }
}

/// gilrs axis value in `[-1, 1]` to the adapter's byte range.
fn axis_to_raw(value: f32) -> u8 {
    (value.clamp(-1.0, 1.0) * 127.0 + 128.0).round() as u8
}

/// Returns whether `state` changed.
fn apply_event(state: &mut PortState, event: EventType) -> bool {
    match event {
        EventType::ButtonPressed(button, _) => match map_button(button) {
            Some(mapped) => {
                state.buttons.insert(mapped);
                true
            }
            None => false,
        },
        EventType::ButtonReleased(button, _) => match map_button(button) {
            Some(mapped) => {
                state.buttons.remove(mapped);
                true
            }
            None => false,
        },
        EventType::ButtonChanged(button, value, _) => match trigger_axis(button) {
            Some(axis) => {
                state.set_axis(axis, axis_to_raw(value));
                true
            }
            None => false,
        },
        EventType::AxisChanged(axis, value, _) => match map_axis(axis) {
            Some(mapped) => {
                state.set_axis(mapped, axis_to_raw(value));
                true
            }
            None => {
                debug!("Ignoring unsupported axis: {:?}", axis);
                false
            }
        },
        EventType::Disconnected => {
            warn!("Gamepad disconnected, releasing its port state");
            *state = PortState::default();
            true
        }
        _ => false,
    }
}
