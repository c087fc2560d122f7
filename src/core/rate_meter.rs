// Frame-rate metering - counts arrivals over a rolling wall-clock window

use std::time::{Duration, Instant};

/// Default width of the metering window
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_millis(1000);

/// Per-stream frames-per-second counter
#[derive(Debug, Clone)]
pub struct RateMeter {
    count: u32,
    window_start: Instant,
    window: Duration,
    last_rate: u32,
}

impl RateMeter {
    /// Start a fresh meter whose window opens at `now`
    pub fn new(now: Instant, window: Duration) -> Self {
        Self {
            count: 0,
            window_start: now,
            window,
            last_rate: 0,
        }
    }

    /// Record one arrival.
    ///
    /// Returns the newly computed rate when the window has elapsed; the counter
    /// and window start are reset at that point.
    pub fn record(&mut self, now: Instant) -> Option<u32> {
        self.count += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }

        let elapsed_ms = elapsed.as_millis() as f64;
        self.last_rate = (self.count as f64 * 1000.0 / elapsed_ms).round() as u32;
        self.count = 0;
        self.window_start = now;

        Some(self.last_rate)
    }

    /// Most recently computed rate (0 until the first window closes)
    pub fn rate(&self) -> u32 {
        self.last_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_arrivals_over_one_second() {
        let t0 = Instant::now();
        let mut meter = RateMeter::new(t0, DEFAULT_RATE_WINDOW);

        for i in 1..10 {
            assert_eq!(meter.record(t0 + Duration::from_millis(i * 100)), None);
        }
        assert_eq!(meter.record(t0 + Duration::from_millis(1000)), Some(10));
        assert_eq!(meter.rate(), 10);
    }

    #[test]
    fn test_rate_rounds_over_long_window() {
        let t0 = Instant::now();
        let mut meter = RateMeter::new(t0, DEFAULT_RATE_WINDOW);

        // 29 frames across 1500ms -> 19.33 fps
        for i in 1..29 {
            assert_eq!(meter.record(t0 + Duration::from_millis(i * 35)), None);
        }
        assert_eq!(meter.record(t0 + Duration::from_millis(1500)), Some(19));
    }

    #[test]
    fn test_window_restarts_after_compute() {
        let t0 = Instant::now();
        let mut meter = RateMeter::new(t0, DEFAULT_RATE_WINDOW);

        assert_eq!(meter.record(t0 + Duration::from_millis(1000)), Some(1));
        // Next window starts at 1000ms
        assert_eq!(meter.record(t0 + Duration::from_millis(1500)), None);
        assert_eq!(meter.record(t0 + Duration::from_millis(2000)), Some(2));
    }
}
