//! Wall-clock pacing of cycle delays.

use std::time::{Duration, Instant};

use spin_sleep::SpinSleeper;

/// Holds playback to machine speed.
///
/// Waits add up cycles since an origin instant and sleep until the origin
/// plus the wall-clock length of the running total, spinning for the last
/// stretch. When the wall clock is already further past that point than the
/// tolerance, the origin moves to now instead of trying to catch up.
pub struct Pacer {
    clock_hz: u32,
    origin: Instant,
    /// Cycles waited for since `origin`.
    elapsed: u64,
    tolerance: Duration,
    sleeper: SpinSleeper,
    desyncs: u64,
}

impl Pacer {
    #[must_use]
    pub fn new(clock_hz: u32, tolerance: Duration) -> Self {
        Self {
            clock_hz: clock_hz.max(1),
            origin: Instant::now(),
            elapsed: 0,
            tolerance,
            sleeper: SpinSleeper::default(),
            desyncs: 0,
        }
    }

    /// Change the machine clock. Time already waited for keeps its length.
    pub fn set_clock(&mut self, clock_hz: u32) {
        self.origin = self.target();
        self.elapsed = 0;
        self.clock_hz = clock_hz.max(1);
    }

    /// Wall-clock length of `cycles`.
    #[must_use]
    pub fn duration_of(&self, cycles: u64) -> Duration {
        let nanos = u128::from(cycles) * 1_000_000_000 / u128::from(self.clock_hz);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    fn target(&self) -> Instant {
        self.origin + self.duration_of(self.elapsed)
    }

    /// Wait until `cycles` after the previous wait ended.
    pub fn wait_cycles(&mut self, cycles: u32) {
        if cycles == 0 {
            return;
        }
        self.elapsed += u64::from(cycles);
        let target = self.target();
        let now = Instant::now();
        if let Some(ahead) = target.checked_duration_since(now) {
            self.sleeper.sleep(ahead);
        } else if now.duration_since(target) > self.tolerance {
            self.desyncs += 1;
            log::warn!(
                "playback fell {:?} behind, resyncing",
                now.duration_since(target)
            );
            self.resync();
        }
    }

    /// Restart timing from now.
    pub fn resync(&mut self) {
        self.origin = Instant::now();
        self.elapsed = 0;
    }

    /// Number of times playback fell behind and was resynced.
    #[must_use]
    pub fn desyncs(&self) -> u64 {
        self.desyncs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_durations() {
        let pacer = Pacer::new(1_000_000, Duration::from_millis(5));
        assert_eq!(pacer.duration_of(1000), Duration::from_millis(1));
        let pal = Pacer::new(985_248, Duration::from_millis(5));
        let frame = pal.duration_of(19_656);
        assert!(frame > Duration::from_micros(19_900) && frame < Duration::from_micros(20_000));
    }

    #[test]
    fn long_runs_do_not_accumulate_rounding() {
        // One PAL cycle is 1014.97 ns. A million of them must come to the
        // exact total, not a million truncated single cycles.
        let pal = Pacer::new(985_248, Duration::from_millis(5));
        let one = pal.duration_of(1);
        let total = pal.duration_of(1_000_000);
        assert_eq!(total, Duration::from_nanos(1_014_972_879));
        assert!(one * 1_000_000 < total);
    }

    #[test]
    fn waits_track_the_running_total() {
        let mut pacer = Pacer::new(985_248, Duration::from_secs(1));
        let origin = pacer.origin;
        for _ in 0..1000 {
            pacer.wait_cycles(1);
        }
        assert_eq!(pacer.elapsed, 1000);
        assert_eq!(pacer.target(), origin + pacer.duration_of(1000));
    }

    #[test]
    fn waits_at_least_the_requested_time() {
        let mut pacer = Pacer::new(1_000_000, Duration::from_millis(50));
        pacer.resync();
        let start = Instant::now();
        pacer.wait_cycles(2_000);
        pacer.wait_cycles(2_000);
        assert!(start.elapsed() >= Duration::from_micros(3_900));
        assert_eq!(pacer.desyncs(), 0);
    }

    #[test]
    fn falling_behind_resyncs() {
        let mut pacer = Pacer::new(1_000_000, Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(20));
        pacer.wait_cycles(10);
        assert_eq!(pacer.desyncs(), 1);
        let start = Instant::now();
        pacer.wait_cycles(1_000);
        assert!(start.elapsed() >= Duration::from_micros(900));
    }
}
