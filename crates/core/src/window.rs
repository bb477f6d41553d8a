//! Debounce window arithmetic

use std::time::{Duration, Instant};

/// Default debounce threshold between related raw records
pub const DEFAULT_THRESHOLD: Duration = Duration::from_millis(4);

/// Absolute time delta between two instants, regardless of their order
pub fn elapsed_between(a: Instant, b: Instant) -> Duration {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

/// Two instants are within the window iff their delta does not exceed `threshold`
pub fn within_window(a: Instant, b: Instant, threshold: Duration) -> bool {
    elapsed_between(a, b) <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_is_symmetric() {
        let base = Instant::now();
        let later = base + Duration::from_millis(7);

        assert_eq!(elapsed_between(base, later), Duration::from_millis(7));
        assert_eq!(elapsed_between(later, base), Duration::from_millis(7));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let base = Instant::now();
        let threshold = Duration::from_millis(4);

        assert!(within_window(base, base, threshold));
        assert!(within_window(base, base + threshold, threshold));
        assert!(within_window(base + threshold, base, threshold));
        assert!(!within_window(base, base + threshold + Duration::from_nanos(1), threshold));
    }
}
