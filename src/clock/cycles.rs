//! Fixed-point conversion between nanoseconds and cycle counts.

pub const NS_PER_SECOND: u64 = 1_000_000_000;

/// Number of whole cycles of a `frequency` Hz clock that fit into `ns`.
///
/// Computes `floor(ns * frequency / 1e9)` exactly. The product can exceed 64
/// bits, so it is formed in `u128` and truncated by an integer division.
/// Results that would not fit back into `u64` saturate; that needs more than
/// a century of elapsed time at 4 GHz.
pub fn ns_to_cycles(ns: u64, frequency: u32) -> u64 {
    let product = u128::from(ns) * u128::from(frequency);
    let cycles = product / u128::from(NS_PER_SECOND);
    u64::try_from(cycles).unwrap_or(u64::MAX)
}

/// Smallest elapsed time in nanoseconds at which `ns_to_cycles` reaches `cycles`.
///
/// Returns `None` for a zero frequency or when the answer does not fit in `u64`.
pub fn cycles_to_ns(cycles: u64, frequency: u32) -> Option<u64> {
    if frequency == 0 {
        return None;
    }
    let numer = u128::from(cycles) * u128::from(NS_PER_SECOND);
    let denom = u128::from(frequency);
    u64::try_from(numer.div_ceil(denom)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEN_YEARS_NS: u64 = 10 * 365 * 24 * 60 * 60 * NS_PER_SECOND;

    // Splits `ns` into whole seconds and a remainder so every intermediate
    // stays below 2^64 for the ranges exercised here.
    fn reference(ns: u64, frequency: u32) -> u64 {
        let f = u64::from(frequency);
        let secs = ns / NS_PER_SECOND;
        let rem = ns % NS_PER_SECOND;
        secs * f + (rem * f) / NS_PER_SECOND
    }

    #[test]
    fn zero_elapsed_is_zero_cycles() {
        assert_eq!(ns_to_cycles(0, 1), 0);
        assert_eq!(ns_to_cycles(0, u32::MAX), 0);
    }

    #[test]
    fn one_second_yields_the_frequency() {
        assert_eq!(ns_to_cycles(NS_PER_SECOND, 1_020_000_000), 1_020_000_000);
        assert_eq!(ns_to_cycles(NS_PER_SECOND, 19_200_000), 19_200_000);
        assert_eq!(ns_to_cycles(NS_PER_SECOND, u32::MAX), u64::from(u32::MAX));
    }

    #[test]
    fn truncates_partial_cycles() {
        // 1 Hz needs a full second per cycle.
        assert_eq!(ns_to_cycles(NS_PER_SECOND - 1, 1), 0);
        // 3 Hz: one cycle every 333_333_333.33 ns.
        assert_eq!(ns_to_cycles(333_333_333, 3), 0);
        assert_eq!(ns_to_cycles(333_333_334, 3), 1);
    }

    #[test]
    fn wide_products_do_not_overflow() {
        // ns * frequency is far beyond u64 here.
        let ns = TEN_YEARS_NS;
        assert!(u128::from(ns) * u128::from(u32::MAX) > u128::from(u64::MAX));
        assert_eq!(ns_to_cycles(ns, u32::MAX), reference(ns, u32::MAX));
    }

    #[test]
    fn matches_reference_across_ranges() {
        let times = [
            1,
            999,
            NS_PER_SECOND - 1,
            NS_PER_SECOND + 1,
            123_456_789_012_345,
            18_446_744_073,
            TEN_YEARS_NS / 7,
            TEN_YEARS_NS - 1,
            TEN_YEARS_NS,
        ];
        let frequencies = [1, 2, 3, 7, 19_200_000, 1_020_000_000, 4_000_000_007, u32::MAX];
        for &ns in &times {
            for &f in &frequencies {
                assert_eq!(ns_to_cycles(ns, f), reference(ns, f), "ns={ns} f={f}");
            }
        }
    }

    #[test]
    fn saturates_instead_of_wrapping() {
        assert_eq!(ns_to_cycles(u64::MAX, u32::MAX), u64::MAX);
    }

    #[test]
    fn inverse_conversion_is_the_first_reaching_instant() {
        let f = 19_200_000;
        for cycles in [0u64, 1, 2, 19_199_999, 19_200_000, 987_654_321] {
            let ns = cycles_to_ns(cycles, f).expect("fits");
            assert!(ns_to_cycles(ns, f) >= cycles);
            if ns > 0 {
                assert!(ns_to_cycles(ns - 1, f) < cycles);
            }
        }
    }

    #[test]
    fn inverse_conversion_rejects_zero_frequency() {
        assert_eq!(cycles_to_ns(10, 0), None);
        assert_eq!(cycles_to_ns(u64::MAX, 1), None);
    }
}
