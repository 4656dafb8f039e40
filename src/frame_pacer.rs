use log::{debug, trace};
use std::time::{Duration, Instant};

/// Schedules a callback at a bounded rate and estimates the achieved rate.
///
/// Deadlines advance by a fixed interval. When a tick comes in more than a
/// whole interval late the schedule restarts from that tick instead of
/// bursting to catch up.
#[derive(Debug)]
pub struct FramePacer {
    interval: Duration,
    next_deadline: Instant,
    last_tick: Instant,

    // Rate estimate, refreshed about once per second.
    report_start: Instant,
    ticks_since_report: u32,
    fps: f64,
}

static REPORT_PERIOD: Duration = Duration::from_secs(1);

impl FramePacer {
    pub fn new(rate: f64, now: Instant) -> FramePacer {
        FramePacer {
            interval: Duration::from_secs_f64(1.0 / rate),
            next_deadline: now,
            last_tick: now,
            report_start: now,
            ticks_since_report: 0,
            fps: rate,
        }
    }

    #[cfg(test)]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_deadline
    }

    /// Ticks only if a tick is due. Calls between deadlines are ignored.
    pub fn tick_if_due(&mut self, now: Instant) -> Option<Duration> {
        if self.is_due(now) {
            Some(self.tick(now))
        } else {
            None
        }
    }

    /// Marks a tick at `now` and returns the time since the previous one.
    pub fn tick(&mut self, now: Instant) -> Duration {
        let late_by = now.saturating_duration_since(self.next_deadline);
        if late_by > self.interval {
            trace!("Over time budget by: {:?}", late_by);
            self.next_deadline = now + self.interval;
        } else {
            self.next_deadline += self.interval;
        }

        let delta_t = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        self.ticks_since_report += 1;
        let report_elapsed = now.saturating_duration_since(self.report_start);
        if report_elapsed >= REPORT_PERIOD {
            self.fps = self.ticks_since_report as f64 / report_elapsed.as_secs_f64();
            debug!("{:.1} ticks/s (target {:.1})", self.fps, self.target_rate());
            self.ticks_since_report = 0;
            self.report_start = now;
        }
        delta_t
    }

    pub fn target_rate(&self) -> f64 {
        1.0 / self.interval.as_secs_f64()
    }

    #[cfg(test)]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_due_immediately() {
        let start = Instant::now();
        let pacer = FramePacer::new(30.0, start);
        assert!(pacer.is_due(start));
    }

    #[test]
    fn deadlines_advance_by_interval() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(30.0, start);
        let interval = pacer.interval();
        pacer.tick(start);
        assert_eq!(pacer.next_deadline(), start + interval);
        assert!(!pacer.is_due(start + interval / 2));

        // Slightly late ticks keep the cadence.
        let late = start + interval + interval / 4;
        assert!(pacer.is_due(late));
        let delta = pacer.tick(late);
        assert_eq!(delta, interval + interval / 4);
        assert_eq!(pacer.next_deadline(), start + interval * 2);
    }

    #[test]
    fn long_stall_restarts_schedule() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(30.0, start);
        let interval = pacer.interval();
        pacer.tick(start);
        let stalled = start + interval * 10;
        pacer.tick(stalled);
        assert_eq!(pacer.next_deadline(), stalled + interval);
    }

    #[test]
    fn early_calls_do_not_tick() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(30.0, start);
        let interval = pacer.interval();
        assert_eq!(pacer.tick_if_due(start), Some(Duration::from_secs(0)));

        // A redraw the pacer didn't ask for.
        assert_eq!(pacer.tick_if_due(start + interval / 3), None);
        assert_eq!(pacer.next_deadline(), start + interval);

        assert_eq!(pacer.tick_if_due(start + interval), Some(interval));
        assert_eq!(pacer.next_deadline(), start + interval * 2);
    }

    #[test]
    fn rate_estimate() {
        let start = Instant::now();
        let mut pacer = FramePacer::new(30.0, start);
        assert_eq!(pacer.fps(), 30.0);
        let step = Duration::from_millis(50);
        for i in 1..=20 {
            pacer.tick(start + step * i);
        }
        assert!((pacer.fps() - 20.0).abs() < 1e-6, "{}", pacer.fps());
        assert!((pacer.target_rate() - 30.0).abs() < 1e-6);
    }
}
