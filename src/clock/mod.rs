//! Emulated time
//!
//! Converts elapsed host time into two independently scaled cycle domains:
//!
//! ```text
//! HostClock ──► WallClock::elapsed_ns ──┬─► cpu_cycles   (cpu_frequency)
//!                                       └─► clock_cycles (clock_frequency)
//! ```
//!
//! Cycle counts are never accumulated. Each read is a pure function of the
//! elapsed nanoseconds and the domain frequency, computed with a 128-bit
//! intermediate product so the result is bit-exact on every host.

pub mod cycles;
pub mod wall_clock;

pub use cycles::{cycles_to_ns, ns_to_cycles, NS_PER_SECOND};
pub use wall_clock::{
    create_best_matching_clock, FakeHostClock, HostClock, StandardWallClock, StdHostClock,
    WallClock,
};
