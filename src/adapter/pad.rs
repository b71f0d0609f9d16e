use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Digital inputs as reported by the adapter, one bit per button.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PadButtons: u16 {
        const LEFT = 0x0001;
        const RIGHT = 0x0002;
        const DOWN = 0x0004;
        const UP = 0x0008;
        const Z = 0x0010;
        const R = 0x0020;
        const L = 0x0040;
        const A = 0x0100;
        const B = 0x0200;
        const X = 0x0400;
        const Y = 0x0800;
        const START = 0x1000;
    }
}

/// Value stored under `button` for bindings that read an axis as a button.
pub const PAD_STICK: i32 = 0x2000;

/// Order in which simultaneously pressed buttons are bound during capture.
pub const BUTTON_PRIORITY: [PadButtons; 12] = [
    PadButtons::A,
    PadButtons::B,
    PadButtons::X,
    PadButtons::Y,
    PadButtons::DOWN,
    PadButtons::LEFT,
    PadButtons::RIGHT,
    PadButtons::UP,
    PadButtons::L,
    PadButtons::R,
    PadButtons::Z,
    PadButtons::START,
];

/// Raw axis value of a centred stick or released trigger.
pub const AXIS_CENTER: u8 = 128;

/// Minimum distance from centre before an axis movement is reported as a sample.
pub const AXIS_CAPTURE_THRESHOLD: u8 = 50;

pub const AXIS_COUNT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PadAxis {
    StickX = 0,
    StickY = 1,
    SubstickX = 2,
    SubstickY = 3,
    TriggerLeft = 4,
    TriggerRight = 5,
}

impl PadAxis {
    pub const ALL: [PadAxis; AXIS_COUNT] = [
        PadAxis::StickX,
        PadAxis::StickY,
        PadAxis::SubstickX,
        PadAxis::SubstickY,
        PadAxis::TriggerLeft,
        PadAxis::TriggerRight,
    ];

    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }
}

impl fmt::Display for PadAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PadAxis::StickX => "StickX",
            PadAxis::StickY => "StickY",
            PadAxis::SubstickX => "SubstickX",
            PadAxis::SubstickY => "SubstickY",
            PadAxis::TriggerLeft => "TriggerLeft",
            PadAxis::TriggerRight => "TriggerRight",
        };
        f.write_str(name)
    }
}

impl FromStr for PadAxis {
    type Err = String;

    /// Accepts the snake_case names used in sample scripts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stick_x" => Ok(PadAxis::StickX),
            "stick_y" => Ok(PadAxis::StickY),
            "substick_x" => Ok(PadAxis::SubstickX),
            "substick_y" => Ok(PadAxis::SubstickY),
            "trigger_left" => Ok(PadAxis::TriggerLeft),
            "trigger_right" => Ok(PadAxis::TriggerRight),
            other => Err(other.to_string()),
        }
    }
}

/// Live state of one controller port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortState {
    pub buttons: PadButtons,
    pub axes: [u8; AXIS_COUNT],
}

impl Default for PortState {
    fn default() -> Self {
        Self {
            buttons: PadButtons::empty(),
            axes: [AXIS_CENTER; AXIS_COUNT],
        }
    }
}

impl PortState {
    /// Idle state with the main stick at `(x, y)`.
    pub fn with_stick(x: u8, y: u8) -> Self {
        let mut state = Self::default();
        state.set_axis(PadAxis::StickX, x);
        state.set_axis(PadAxis::StickY, y);
        state
    }

    pub fn is_pressed(&self, button: PadButtons) -> bool {
        !button.is_empty() && self.buttons.contains(button)
    }

    pub fn axis(&self, axis: PadAxis) -> u8 {
        self.axes[axis as usize]
    }

    pub fn set_axis(&mut self, axis: PadAxis, value: u8) {
        self.axes[axis as usize] = value;
    }
}

/// One event reported by the adapter while capture mode is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadSample {
    pub port: usize,
    pub buttons: PadButtons,
    pub axis: Option<PadAxis>,
    pub axis_value: u8,
}

impl PadSample {
    pub fn buttons(port: usize, buttons: PadButtons) -> Self {
        Self {
            port,
            buttons,
            axis: None,
            axis_value: AXIS_CENTER,
        }
    }

    pub fn axis(port: usize, axis: PadAxis, axis_value: u8) -> Self {
        Self {
            port,
            buttons: PadButtons::empty(),
            axis: Some(axis),
            axis_value,
        }
    }

    /// Derives the capture sample for a freshly read port state.
    ///
    /// Pressed buttons are carried as-is. When several axes are away from
    /// centre the last one in [`PadAxis::ALL`] order wins. Returns `None` when
    /// nothing is pressed and every axis is within the capture threshold.
    pub fn from_state(port: usize, state: &PortState) -> Option<Self> {
        let mut sample = Self::buttons(port, state.buttons);
        for axis in PadAxis::ALL {
            let value = state.axis(axis);
            if value.abs_diff(AXIS_CENTER) > AXIS_CAPTURE_THRESHOLD {
                sample.axis = Some(axis);
                sample.axis_value = value;
            }
        }

        if sample.buttons.is_empty() && sample.axis.is_none() {
            None
        } else {
            Some(sample)
        }
    }

    /// Axis deflection in `[-1, 1]` with the centre at zero.
    pub fn normalized_axis(&self) -> f32 {
        (f32::from(self.axis_value) - 128.0) / 128.0
    }
}
