//! Adapter context shared between the polling thread and input consumers
//!
//! ```text
//! polling thread ──► GcAdapter::update_port ──┬─► PortState snapshot (devices)
//!                                             └─► PadQueue per port  (capture)
//! ```
//!
//! Snapshots are always readable. Queues only fill while a capture session
//! is open.

pub mod gc_adapter;
pub mod pad;
pub mod pad_queue;

pub use gc_adapter::{CaptureRegistration, GcAdapter, PORT_COUNT};
pub use pad::{
    PadAxis, PadButtons, PadSample, PortState, AXIS_CENTER, AXIS_COUNT, BUTTON_PRIORITY,
    PAD_STICK,
};
pub use pad_queue::PadQueue;
