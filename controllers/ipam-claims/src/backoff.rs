//! # Fibonacci Backoff
//!
//! Requeue delays for VMIs whose reconciliation keeps failing. Grows more
//! slowly than exponential backoff so a VMI waiting on a NAD that is about to
//! be created is picked up again quickly.
//!
//! Sequence with the controller defaults: 5s, 5s, 10s, 15s, 25s, 40s, 65s,
//! 105s, 170s, 275s, 300s (max).

use std::time::Duration;

/// Fibonacci backoff calculator, in seconds
///
/// Each delay is the sum of the previous two, capped at the maximum.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    prev_seconds: u64,
    current_seconds: u64,
    max_seconds: u64,
}

impl FibonacciBackoff {
    /// * `min_seconds` - first two delays
    /// * `max_seconds` - cap of the sequence
    #[must_use]
    pub fn new(min_seconds: u64, max_seconds: u64) -> Self {
        Self {
            prev_seconds: 0,
            current_seconds: min_seconds,
            max_seconds,
        }
    }

    /// Returns the current delay and advances the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current_seconds;

        let next = self.prev_seconds.saturating_add(self.current_seconds);
        self.prev_seconds = self.current_seconds;
        self.current_seconds = next.min(self.max_seconds);

        Duration::from_secs(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(backoff: &mut FibonacciBackoff, n: usize) -> Vec<u64> {
        (0..n).map(|_| backoff.next_backoff().as_secs()).collect()
    }

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(5, 300);
        assert_eq!(
            seconds(&mut backoff, 11),
            vec![5, 5, 10, 15, 25, 40, 65, 105, 170, 275, 300]
        );
    }

    #[test]
    fn test_fibonacci_backoff_max_cap() {
        let mut backoff = FibonacciBackoff::new(5, 300);
        seconds(&mut backoff, 11);
        // 275 + 300 would exceed the cap
        assert_eq!(seconds(&mut backoff, 3), vec![300, 300, 300]);
    }
}
