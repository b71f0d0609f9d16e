//! Producers feeding port states into a [`crate::adapter::GcAdapter`].
//!
//! The real adapter driver lives elsewhere; these stand in for its polling
//! thread.

#[cfg(feature = "gilrs")]
pub mod gilrs_source;
pub mod script;

#[cfg(feature = "gilrs")]
pub use gilrs_source::{GilrsSource, GilrsSourceError};
pub use script::{PadScript, ScriptError, ScriptStep};
