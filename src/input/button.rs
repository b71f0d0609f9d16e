use std::sync::Arc;
use tracing::{debug, error, trace, warn};

use super::session::{CaptureSession, Capturing};
use super::{axis_param, port_param, ButtonDevice, InputPoller, PollerKind, ThresholdMode, ENGINE};
use crate::adapter::{GcAdapter, PadAxis, PadButtons, PadSample, BUTTON_PRIORITY, PAD_STICK};
use crate::params::ParamPackage;

/// Deflection an axis-as-button needs in [`ThresholdMode::Fixed`].
pub const AXIS_BUTTON_FIXED_THRESHOLD: f32 = 0.10;

/// Threshold written into captured axis-as-button bindings.
pub const AXIS_BUTTON_DEFAULT_THRESHOLD: f32 = 0.5;

/// Digital button on one port.
pub struct GcButton {
    port: usize,
    button: PadButtons,
    adapter: Arc<GcAdapter>,
}

impl GcButton {
    pub fn new(port: usize, button: PadButtons, adapter: Arc<GcAdapter>) -> Self {
        Self {
            port,
            button,
            adapter,
        }
    }
}

impl ButtonDevice for GcButton {
    fn status(&self) -> bool {
        self.adapter
            .port_state(self.port)
            .is_some_and(|state| state.is_pressed(self.button))
    }
}

/// One direction of an axis read as a button.
pub struct GcAxisButton {
    port: usize,
    axis: PadAxis,
    threshold: f32,
    trigger_if_greater: bool,
    mode: ThresholdMode,
    adapter: Arc<GcAdapter>,
}

impl GcAxisButton {
    pub fn new(
        port: usize,
        axis: PadAxis,
        threshold: f32,
        trigger_if_greater: bool,
        mode: ThresholdMode,
        adapter: Arc<GcAdapter>,
    ) -> Self {
        let threshold = if threshold.is_finite() {
            threshold
        } else {
            warn!(
                "Threshold {} is not a number, using {}",
                threshold, AXIS_BUTTON_DEFAULT_THRESHOLD
            );
            AXIS_BUTTON_DEFAULT_THRESHOLD
        };
        Self {
            port,
            axis,
            threshold,
            trigger_if_greater,
            mode,
            adapter,
        }
    }

    fn effective_threshold(&self) -> f32 {
        match self.mode {
            ThresholdMode::Fixed => AXIS_BUTTON_FIXED_THRESHOLD,
            ThresholdMode::Stored => self.threshold.abs(),
        }
    }
}

impl ButtonDevice for GcAxisButton {
    fn status(&self) -> bool {
        let Some(state) = self.adapter.port_state(self.port) else {
            return false;
        };
        let value = (f32::from(state.axis(self.axis)) - 128.0) / 128.0;
        let threshold = self.effective_threshold();
        if self.trigger_if_greater {
            value > threshold
        } else {
            value < -threshold
        }
    }
}

/// Capture protocol for single buttons.
///
/// Each call binds at most one sample. Buttons pressed together resolve in
/// [`BUTTON_PRIORITY`] order; a sample without buttons but with a moved axis
/// becomes an axis-as-button binding. Samples after the bound one stay
/// queued for the next call.
#[derive(Debug, Default)]
pub struct ButtonPoller;

impl ButtonPoller {
    fn binding_for(port: usize, sample: &PadSample) -> Option<ParamPackage> {
        let mut params = ParamPackage::new();
        params.set("engine", ENGINE);
        params.set("port", port);

        if let Some(button) = BUTTON_PRIORITY
            .iter()
            .find(|button| sample.buttons.contains(**button))
        {
            params.set("button", button.bits());
            return Some(params);
        }

        let axis = sample.axis?;
        params.set("axis", axis.id());
        params.set("button", PAD_STICK);
        let direction = if sample.axis_value > 128 { "+" } else { "-" };
        params.set("direction", direction);
        params.set("threshold", AXIS_BUTTON_DEFAULT_THRESHOLD);
        Some(params)
    }
}

impl InputPoller for ButtonPoller {
    fn next_input(&mut self, adapter: &GcAdapter) -> Option<ParamPackage> {
        for (port, queue) in adapter.queues() {
            while let Some(sample) = queue.pop() {
                if let Some(params) = Self::binding_for(port, &sample) {
                    return Some(params);
                }
                trace!("Nothing to bind in {:?}", sample);
            }
        }
        None
    }

    fn kind(&self) -> PollerKind {
        PollerKind::Button
    }
}

/// Builds button devices from stored bindings and opens capture sessions.
#[derive(Clone)]
pub struct GcButtonFactory {
    adapter: Arc<GcAdapter>,
    threshold_mode: ThresholdMode,
}

impl GcButtonFactory {
    pub fn new(adapter: Arc<GcAdapter>, threshold_mode: ThresholdMode) -> Self {
        Self {
            adapter,
            threshold_mode,
        }
    }

    /// Creates a device from a binding.
    ///
    /// Bindings with an `axis` key become [`GcAxisButton`]s; everything else
    /// is a [`GcButton`]. Missing keys fall back to port 0, axis 0 and
    /// threshold 0.5. An unknown `direction` is treated as `+`.
    pub fn create(&self, params: &ParamPackage) -> Box<dyn ButtonDevice> {
        let port = port_param(params);

        if params.has("axis") {
            let axis = axis_param(params, "axis", PadAxis::StickX);
            let threshold = params.get("threshold", AXIS_BUTTON_DEFAULT_THRESHOLD);
            let trigger_if_greater = match params.get_str("direction", "") {
                "+" => true,
                "-" => false,
                other => {
                    error!("Unknown direction {:?}, assuming +", other);
                    true
                }
            };
            debug!(
                "Creating axis button: port={}, axis={}, direction={}",
                port,
                axis,
                if trigger_if_greater { "+" } else { "-" }
            );
            return Box::new(GcAxisButton::new(
                port,
                axis,
                threshold,
                trigger_if_greater,
                self.threshold_mode,
                self.adapter.clone(),
            ));
        }

        let raw: u16 = params.get("button", 0);
        let button = PadButtons::from_bits_truncate(raw);
        if button.is_empty() {
            warn!("Binding {} names no known button", params);
        }
        debug!("Creating button: port={}, button={:?}", port, button);
        Box::new(GcButton::new(port, button, self.adapter.clone()))
    }

    pub fn begin_configuration(&self) -> CaptureSession<Capturing> {
        CaptureSession::create(self.adapter.clone(), Box::new(ButtonPoller)).begin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::PortState;

    fn adapter() -> Arc<GcAdapter> {
        Arc::new(GcAdapter::new())
    }

    fn set_axis(adapter: &GcAdapter, port: usize, axis: PadAxis, value: u8) {
        let mut state = adapter.port_state(port).unwrap_or_default();
        state.set_axis(axis, value);
        adapter.update_port(port, state);
    }

    #[test]
    fn a_wins_over_b() {
        let adapter = adapter();
        let mut session = GcButtonFactory::new(adapter.clone(), ThresholdMode::Fixed)
            .begin_configuration();
        adapter.push_sample(PadSample::buttons(0, PadButtons::B | PadButtons::A));

        let params = session.next_input().expect("binding");
        assert_eq!(params.get_str("engine", ""), "gcpad");
        assert_eq!(params.get("port", -1), 0);
        assert_eq!(params.get("button", 0i32), i32::from(PadButtons::A.bits()));
        assert!(!params.has("axis"));
        session.end();
    }

    #[test]
    fn whole_priority_order_is_respected() {
        for (index, expected) in BUTTON_PRIORITY.iter().enumerate() {
            let lower = BUTTON_PRIORITY[index..]
                .iter()
                .fold(PadButtons::empty(), |acc, b| acc | *b);
            let sample = PadSample::buttons(1, lower);
            let params = ButtonPoller::binding_for(1, &sample).expect("binding");
            assert_eq!(params.get("button", 0u16), expected.bits());
        }
    }

    #[test]
    fn axis_sample_becomes_axis_button() {
        let adapter = adapter();
        let mut session = GcButtonFactory::new(adapter.clone(), ThresholdMode::Fixed)
            .begin_configuration();
        adapter.push_sample(PadSample::axis(0, PadAxis::SubstickX, 200));

        let params = session.next_input().expect("binding");
        assert_eq!(params.get("port", -1), 0);
        assert_eq!(params.get("axis", -1), 2);
        assert_eq!(params.get("button", 0i32), PAD_STICK);
        assert_eq!(params.get_str("direction", ""), "+");
        assert_eq!(params.get("threshold", 0.0f32), 0.5);
        session.end();
    }

    #[test]
    fn low_axis_value_binds_negative_direction() {
        let params = ButtonPoller::binding_for(3, &PadSample::axis(3, PadAxis::StickY, 128))
            .expect("binding");
        assert_eq!(params.get_str("direction", ""), "-");
        assert_eq!(params.get("threshold", 0.0f32), 0.5);
    }

    #[test]
    fn empty_samples_are_skipped() {
        let adapter = adapter();
        let mut session = GcButtonFactory::new(adapter.clone(), ThresholdMode::Fixed)
            .begin_configuration();
        adapter.push_sample(PadSample::buttons(0, PadButtons::empty()));
        assert_eq!(session.next_input(), None);

        adapter.push_sample(PadSample::buttons(0, PadButtons::empty()));
        adapter.push_sample(PadSample::buttons(0, PadButtons::Z));
        let params = session.next_input().expect("binding");
        assert_eq!(params.get("button", 0u16), PadButtons::Z.bits());
        session.end();
    }

    #[test]
    fn one_binding_per_call() {
        let adapter = adapter();
        let mut session = GcButtonFactory::new(adapter.clone(), ThresholdMode::Fixed)
            .begin_configuration();
        adapter.push_sample(PadSample::buttons(2, PadButtons::X));
        adapter.push_sample(PadSample::buttons(2, PadButtons::START));

        let first = session.next_input().expect("first");
        assert_eq!(first.get("button", 0u16), PadButtons::X.bits());
        let second = session.next_input().expect("second");
        assert_eq!(second.get("button", 0u16), PadButtons::START.bits());
        assert_eq!(second.get("port", -1), 2);
        assert_eq!(session.next_input(), None);
        session.end();
    }

    #[test]
    fn end_discards_pending_samples() {
        let adapter = adapter();
        let factory = GcButtonFactory::new(adapter.clone(), ThresholdMode::Fixed);
        let session = factory.begin_configuration();
        adapter.push_sample(PadSample::buttons(0, PadButtons::A));
        let idle = session.end();

        let mut session = idle.begin();
        assert_eq!(session.next_input(), None);
        session.end();
    }

    #[test]
    fn digital_button_reads_the_snapshot() {
        let adapter = adapter();
        let factory = GcButtonFactory::new(adapter.clone(), ThresholdMode::Fixed);
        let params: ParamPackage = "button:512,engine:gcpad,port:1".parse().expect("params");
        let device = factory.create(&params);
        assert!(!device.status());

        let mut state = PortState::default();
        state.buttons = PadButtons::B;
        adapter.update_port(1, state);
        assert!(device.status());
        adapter.update_port(0, state);
        adapter.update_port(1, PortState::default());
        assert!(!device.status());
    }

    #[test]
    fn fixed_mode_ignores_stored_threshold() {
        let adapter = adapter();
        let factory = GcButtonFactory::new(adapter.clone(), ThresholdMode::Fixed);
        let params: ParamPackage =
            "axis:0,button:8192,direction:+,engine:gcpad,port:0,threshold:0.9"
                .parse()
                .expect("params");
        let device = factory.create(&params);

        // 0.125 deflection: above the fixed 0.10, far below the stored 0.9.
        set_axis(&adapter, 0, PadAxis::StickX, 144);
        assert!(device.status());
        set_axis(&adapter, 0, PadAxis::StickX, 140);
        assert!(!device.status());
    }

    #[test]
    fn stored_mode_applies_threshold_magnitude() {
        let adapter = adapter();
        let factory = GcButtonFactory::new(adapter.clone(), ThresholdMode::Stored);
        let params: ParamPackage =
            "axis:1,button:8192,direction:-,engine:gcpad,port:2,threshold:-0.5"
                .parse()
                .expect("params");
        let device = factory.create(&params);

        set_axis(&adapter, 2, PadAxis::StickY, 100);
        assert!(!device.status());
        set_axis(&adapter, 2, PadAxis::StickY, 60);
        assert!(device.status());
    }

    #[test]
    fn non_finite_stored_threshold_uses_the_default() {
        let adapter = adapter();
        let factory = GcButtonFactory::new(adapter.clone(), ThresholdMode::Stored);
        let params: ParamPackage = "axis:0,button:8192,direction:+,engine:gcpad,port:1,threshold:NaN"
            .parse()
            .expect("params");
        let device = factory.create(&params);

        // 0.375 stays below the default 0.5, 0.75 passes it.
        set_axis(&adapter, 1, PadAxis::StickX, 176);
        assert!(!device.status());
        set_axis(&adapter, 1, PadAxis::StickX, 224);
        assert!(device.status());
    }

    #[test]
    fn unknown_direction_defaults_to_positive() {
        let adapter = adapter();
        let factory = GcButtonFactory::new(adapter.clone(), ThresholdMode::Fixed);
        let params: ParamPackage = "axis:4,direction:up,port:3".parse().expect("params");
        let device = factory.create(&params);

        set_axis(&adapter, 3, PadAxis::TriggerLeft, 250);
        assert!(device.status());
        set_axis(&adapter, 3, PadAxis::TriggerLeft, 5);
        assert!(!device.status());
    }

    #[test]
    fn missing_params_use_defaults() {
        let adapter = adapter();
        let factory = GcButtonFactory::new(adapter.clone(), ThresholdMode::Fixed);
        let device = factory.create(&ParamPackage::new());
        let mut state = PortState::default();
        state.buttons = PadButtons::all();
        adapter.update_port(0, state);
        // button 0 names nothing, so nothing ever reads as pressed.
        assert!(!device.status());
    }
}
