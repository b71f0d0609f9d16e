use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

use super::cycles::ns_to_cycles;

/// Monotonic host time in nanoseconds, relative to an arbitrary origin.
pub trait HostClock: Send + Sync {
    fn now_ns(&self) -> u64;
}

/// Host clock backed by [`Instant`], immune to wall-clock adjustments.
#[derive(Debug, Clone)]
pub struct StdHostClock {
    origin: Instant,
}

impl StdHostClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdHostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for StdHostClock {
    fn now_ns(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Manually driven host clock for deterministic tests.
///
/// Clones share the same counter, so a test can keep one handle and hand the
/// other to a [`StandardWallClock`].
#[derive(Debug, Clone, Default)]
pub struct FakeHostClock {
    now_ns: Arc<AtomicU64>,
}

impl FakeHostClock {
    pub fn new(start_ns: u64) -> Self {
        Self {
            now_ns: Arc::new(AtomicU64::new(start_ns)),
        }
    }

    pub fn advance_ns(&self, delta_ns: u64) {
        let _ = self
            .now_ns
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(delta_ns))
            });
    }

    /// Moves the clock to `ns`. Earlier values are ignored.
    pub fn set_ns(&self, ns: u64) {
        self.now_ns.fetch_max(ns, Ordering::SeqCst);
    }
}

impl HostClock for FakeHostClock {
    fn now_ns(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }
}

/// Elapsed-time source driving the emulated CPU and peripheral clocks.
///
/// Both cycle domains share one elapsed-time base and differ only in their
/// frequency. Variants decide for themselves what [`WallClock::pause`] means.
pub trait WallClock: Send + Sync {
    /// Nanoseconds since the clock was created. Never decreases.
    fn elapsed_ns(&self) -> u64;

    fn elapsed_us(&self) -> u64 {
        self.elapsed_ns() / 1_000
    }

    fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns() / 1_000_000
    }

    /// Cycles of the emulated CPU since creation.
    fn cpu_cycles(&self) -> u64 {
        ns_to_cycles(self.elapsed_ns(), self.cpu_frequency())
    }

    /// Cycles of the emulated peripheral clock since creation.
    fn clock_cycles(&self) -> u64 {
        ns_to_cycles(self.elapsed_ns(), self.clock_frequency())
    }

    fn cpu_frequency(&self) -> u32;

    fn clock_frequency(&self) -> u32;

    /// Requests that elapsed time stop (or resume) advancing.
    fn pause(&self, is_paused: bool);

    /// Whether the clock reads a hardware counter directly.
    fn is_native(&self) -> bool;
}

/// Wall clock derived from a monotonic host clock.
///
/// Pausing is a no-op for this variant: elapsed time keeps running.
#[derive(Debug)]
pub struct StandardWallClock<H: HostClock = StdHostClock> {
    host: H,
    start_ns: u64,
    cpu_frequency: u32,
    clock_frequency: u32,
}

impl StandardWallClock<StdHostClock> {
    pub fn new(cpu_frequency: u32, clock_frequency: u32) -> Self {
        Self::with_host(StdHostClock::new(), cpu_frequency, clock_frequency)
    }
}

impl<H: HostClock> StandardWallClock<H> {
    pub fn with_host(host: H, cpu_frequency: u32, clock_frequency: u32) -> Self {
        let start_ns = host.now_ns();
        debug!(
            "Standard wall clock created: cpu={} Hz, clock={} Hz",
            cpu_frequency, clock_frequency
        );
        Self {
            host,
            start_ns,
            cpu_frequency,
            clock_frequency,
        }
    }
}

impl<H: HostClock> WallClock for StandardWallClock<H> {
    fn elapsed_ns(&self) -> u64 {
        self.host.now_ns().saturating_sub(self.start_ns)
    }

    fn cpu_frequency(&self) -> u32 {
        self.cpu_frequency
    }

    fn clock_frequency(&self) -> u32 {
        self.clock_frequency
    }

    fn pause(&self, is_paused: bool) {
        trace!("Ignoring pause({}) on standard wall clock", is_paused);
    }

    fn is_native(&self) -> bool {
        false
    }
}

/// Picks the most precise clock available on this host.
///
/// Only the host-clock variant exists at the moment, so every platform gets a
/// [`StandardWallClock`].
pub fn create_best_matching_clock(cpu_frequency: u32, clock_frequency: u32) -> Box<dyn WallClock> {
    debug!("No native clock available, using standard wall clock");
    Box::new(StandardWallClock::new(cpu_frequency, clock_frequency))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPU_HZ: u32 = 1_020_000_000;
    const CNTFRQ_HZ: u32 = 19_200_000;

    fn fake_clock(start_ns: u64) -> (FakeHostClock, StandardWallClock<FakeHostClock>) {
        let host = FakeHostClock::new(start_ns);
        let clock = StandardWallClock::with_host(host.clone(), CPU_HZ, CNTFRQ_HZ);
        (host, clock)
    }

    #[test]
    fn elapsed_time_starts_at_creation() {
        let (host, clock) = fake_clock(5_000_000_000);
        assert_eq!(clock.elapsed_ns(), 0);

        host.advance_ns(2_500_000);
        assert_eq!(clock.elapsed_ns(), 2_500_000);
        assert_eq!(clock.elapsed_us(), 2_500);
        assert_eq!(clock.elapsed_ms(), 2);
    }

    #[test]
    fn both_domains_share_the_time_base() {
        let (host, clock) = fake_clock(0);
        host.advance_ns(1_000_000_000);
        assert_eq!(clock.cpu_cycles(), u64::from(CPU_HZ));
        assert_eq!(clock.clock_cycles(), u64::from(CNTFRQ_HZ));

        host.advance_ns(500_000_000);
        assert_eq!(clock.cpu_cycles(), 1_530_000_000);
        assert_eq!(clock.clock_cycles(), 28_800_000);
    }

    #[test]
    fn cycle_counts_have_no_drift() {
        let (host, clock) = fake_clock(0);
        // Many tiny steps land on the same count as one big step.
        for _ in 0..1_000 {
            host.advance_ns(7);
        }
        assert_eq!(clock.clock_cycles(), ns_to_cycles(7_000, CNTFRQ_HZ));
        assert_eq!(clock.cpu_cycles(), ns_to_cycles(7_000, CPU_HZ));
    }

    #[test]
    fn pause_does_not_stop_time() {
        let (host, clock) = fake_clock(0);
        clock.pause(true);
        host.advance_ns(1_000);
        assert_eq!(clock.elapsed_ns(), 1_000);
        clock.pause(false);
        host.advance_ns(1_000);
        assert_eq!(clock.elapsed_ns(), 2_000);
        assert!(!clock.is_native());
    }

    #[test]
    fn fake_host_never_moves_backwards() {
        let (host, clock) = fake_clock(100);
        host.set_ns(1_000);
        host.set_ns(500);
        assert_eq!(clock.elapsed_ns(), 900);
    }

    #[test]
    fn real_clock_is_monotonic() {
        let clock = create_best_matching_clock(CPU_HZ, CNTFRQ_HZ);
        assert_eq!(clock.cpu_frequency(), CPU_HZ);
        assert_eq!(clock.clock_frequency(), CNTFRQ_HZ);

        let mut last_ns = 0;
        let mut last_cycles = 0;
        for _ in 0..10_000 {
            let ns = clock.elapsed_ns();
            let cycles = clock.cpu_cycles();
            assert!(ns >= last_ns);
            assert!(cycles >= last_cycles);
            last_ns = ns;
            last_cycles = cycles;
        }
    }
}
