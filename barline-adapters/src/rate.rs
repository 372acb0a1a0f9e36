//! Per-second rates from monotonically increasing counters.

use parking_lot::Mutex;
use tokio::time::Instant;

/// Remembers the previous pair of counter readings.
#[derive(Debug, Default)]
pub(crate) struct RateCounter {
    last: Mutex<Option<(Instant, u64, u64)>>,
}

impl RateCounter {
    /// Record a reading and return the rates since the previous one.
    ///
    /// The first reading, and a reading after a counter reset, report zero.
    pub(crate) fn update(&self, a: u64, b: u64) -> (f64, f64) {
        let now = Instant::now();
        let mut last = self.last.lock();
        let rates = match *last {
            Some((at, prev_a, prev_b)) if a >= prev_a && b >= prev_b => {
                let secs = now.duration_since(at).as_secs_f64();
                if secs > 0.0 {
                    ((a - prev_a) as f64 / secs, (b - prev_b) as f64 / secs)
                } else {
                    (0.0, 0.0)
                }
            }
            _ => (0.0, 0.0),
        };
        *last = Some((now, a, b));
        rates
    }

    pub(crate) fn reset(&self) {
        *self.last.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn rates_between_readings() {
        let counter = RateCounter::default();
        assert_eq!(counter.update(1000, 0), (0.0, 0.0));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(counter.update(5000, 512), (2000.0, 256.0));

        // Counter went backwards: start over
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(counter.update(10, 10), (0.0, 0.0));
    }
}
