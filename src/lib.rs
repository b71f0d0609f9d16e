//! GameCube pad input core: emulated cycle clocks, pad capture sessions and
//! the button/analog devices built from captured bindings.

pub mod adapter;
pub mod clock;
pub mod config;
pub mod input;
pub mod params;
pub mod producer;
