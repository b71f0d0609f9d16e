//! Capture-then-replay tests.
//!
//! Every binding is captured through a session, stored in its text form,
//! parsed back and handed to a factory. The resulting device must follow the
//! input that was captured.

use std::sync::Arc;

use gcpoller::adapter::{GcAdapter, PadButtons, PortState};
use gcpoller::input::{AnalogDirection, GcAnalogFactory, GcButtonFactory, ThresholdMode};
use gcpoller::params::ParamPackage;

fn store_and_reload(params: &ParamPackage) -> ParamPackage {
    params.to_string().parse().expect("stored binding parses")
}

fn pressed(buttons: PadButtons) -> PortState {
    PortState {
        buttons,
        ..PortState::default()
    }
}

#[test]
fn captured_button_follows_the_pressed_button() {
    let adapter = Arc::new(GcAdapter::new());
    let factory = GcButtonFactory::new(adapter.clone(), ThresholdMode::Fixed);

    let mut session = factory.begin_configuration();
    assert_eq!(session.next_input(), None);
    adapter.update_port(1, pressed(PadButtons::B | PadButtons::Y));
    let binding = session.next_input().expect("button binding");
    session.end();
    assert!(!adapter.is_configuring());

    let binding = store_and_reload(&binding);
    assert_eq!(binding.get_str("engine", ""), "gcpad");
    assert_eq!(binding.get("port", -1), 1);
    assert_eq!(binding.get("button", 0u16), PadButtons::B.bits());

    adapter.update_port(1, PortState::default());
    let button = factory.create(&binding);
    assert!(!button.status());

    adapter.update_port(1, pressed(PadButtons::B));
    assert!(button.status());

    // Same button on another port is a different input.
    adapter.update_port(1, PortState::default());
    adapter.update_port(0, pressed(PadButtons::B));
    assert!(!button.status());
}

#[test]
fn captured_axis_button_follows_the_deflection() {
    let adapter = Arc::new(GcAdapter::new());
    let factory = GcButtonFactory::new(adapter.clone(), ThresholdMode::Fixed);

    let mut session = factory.begin_configuration();
    adapter.update_port(3, PortState::with_stick(20, 128));
    let binding = session.next_input().expect("axis binding");
    session.end();

    let binding = store_and_reload(&binding);
    assert_eq!(binding.get("port", -1), 3);
    assert_eq!(binding.get("axis", -1), 0);
    assert_eq!(binding.get_str("direction", ""), "-");

    let button = factory.create(&binding);
    adapter.update_port(3, PortState::with_stick(128, 128));
    assert!(!button.status());
    adapter.update_port(3, PortState::with_stick(20, 128));
    assert!(button.status());
    adapter.update_port(3, PortState::with_stick(240, 128));
    assert!(!button.status());
}

#[test]
fn captured_stick_follows_both_axes() {
    let adapter = Arc::new(GcAdapter::new());
    let factory = GcAnalogFactory::new(adapter.clone(), 0.0);

    let mut session = factory.begin_configuration();
    adapter.update_port(2, PortState::with_stick(230, 128));
    assert_eq!(session.next_input(), None);
    adapter.update_port(2, PortState::with_stick(230, 20));
    let binding = session.next_input().expect("analog binding");
    session.end();

    let binding = store_and_reload(&binding);
    assert_eq!(binding.get("port", -1), 2);
    assert_eq!(binding.get("axis_x", -1), 0);
    assert_eq!(binding.get("axis_y", -1), 1);

    let stick = factory.create(&binding);
    adapter.update_port(2, PortState::with_stick(128, 128));
    assert_eq!(stick.status(), (0.0, 0.0));

    adapter.update_port(2, PortState::with_stick(223, 128));
    let (x, y) = stick.status();
    assert!((x - 1.0).abs() < 1e-4);
    assert!(y.abs() < 1e-4);
    assert!(stick.direction_status(AnalogDirection::Right));
    assert!(!stick.direction_status(AnalogDirection::Up));
}

#[test]
fn live_updates_outside_a_session_are_not_queued() {
    let adapter = Arc::new(GcAdapter::new());
    let factory = GcButtonFactory::new(adapter.clone(), ThresholdMode::Fixed);

    adapter.update_port(0, pressed(PadButtons::A));
    let mut session = factory.begin_configuration();
    assert_eq!(session.next_input(), None);
    session.end();
}
