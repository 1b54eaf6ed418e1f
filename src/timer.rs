//! Deadline-driven timers for the memorize phase.
//!
//! Timers never call back on their own. The event loop polls them with the
//! current instant, so a timer that has been dropped simply stops existing:
//! there is no handle left behind to fire into a later phase.

use std::time::{Duration, Instant};

use crate::discipline::Discipline;
use crate::session::SessionConfig;

pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Fixed-period timer that reports how many periods elapsed since the last poll.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    next_due: Instant,
}

impl Interval {
    /// `period` must be non-zero.
    pub fn start(period: Duration, now: Instant) -> Self {
        Self {
            period,
            next_due: now + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn poll(&mut self, now: Instant) -> u32 {
        if now < self.next_due {
            return 0;
        }
        let late = now.duration_since(self.next_due).as_nanos();
        let fires = late / self.period.as_nanos().max(1) + 1;
        let fires = u32::try_from(fires).unwrap_or(u32::MAX);
        self.next_due += self.period * fires;
        fires
    }
}

/// Auto-advance period. Pace counts raw digits/bits, and each tick moves one
/// group, so buffered disciplines stretch the period by the grouping size.
pub fn pace_period(discipline: Discipline, config: &SessionConfig) -> Option<Duration> {
    if config.pace_items_per_minute == 0 {
        return None;
    }
    let per_item = 60.0 / f64::from(config.pace_items_per_minute);
    let group = discipline.effective_group(config.grouping) as f64;
    Some(Duration::from_secs_f64(per_item * group))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerFires {
    pub seconds: u32,
    pub pace: u32,
}

/// Countdown plus optional pace timer. Owned by the memorize phase and
/// dropped with it.
#[derive(Debug)]
pub struct MemorizeTimers {
    countdown: Interval,
    pace: Option<Interval>,
}

impl MemorizeTimers {
    pub fn start(discipline: Discipline, config: &SessionConfig, now: Instant) -> Self {
        Self {
            countdown: Interval::start(COUNTDOWN_PERIOD, now),
            pace: pace_period(discipline, config).map(|p| Interval::start(p, now)),
        }
    }

    pub fn pace_period(&self) -> Option<Duration> {
        self.pace.as_ref().map(Interval::period)
    }

    pub fn poll(&mut self, now: Instant) -> TimerFires {
        TimerFires {
            seconds: self.countdown.poll(now),
            pace: self.pace.as_mut().map_or(0, |p| p.poll(now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pace: u32, grouping: usize) -> SessionConfig {
        SessionConfig::new(20, 60, pace, grouping).unwrap()
    }

    #[test]
    fn interval_counts_elapsed_periods() {
        let t0 = Instant::now();
        let mut iv = Interval::start(Duration::from_secs(1), t0);
        assert_eq!(iv.poll(t0), 0);
        assert_eq!(iv.poll(t0 + Duration::from_millis(999)), 0);
        assert_eq!(iv.poll(t0 + Duration::from_secs(1)), 1);
        assert_eq!(iv.poll(t0 + Duration::from_millis(1500)), 0);
        assert_eq!(iv.poll(t0 + Duration::from_millis(4200)), 3);
        assert_eq!(iv.next_due(), t0 + Duration::from_secs(5));
    }

    #[test]
    fn pace_zero_has_no_timer() {
        assert_eq!(pace_period(Discipline::Cards, &config(0, 2)), None);
        let mut timers = MemorizeTimers::start(Discipline::Cards, &config(0, 2), Instant::now());
        assert_eq!(timers.pace_period(), None);
        let fires = timers.poll(Instant::now() + Duration::from_secs(30));
        assert_eq!(fires.pace, 0);
    }

    #[test]
    fn pace_scales_by_grouping_for_buffered_disciplines() {
        assert_eq!(
            pace_period(Discipline::Cards, &config(30, 3)),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            pace_period(Discipline::Numbers, &config(30, 3)),
            Some(Duration::from_secs(6))
        );
        assert_eq!(
            pace_period(Discipline::Binaries, &config(120, 4)),
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn both_timers_report_independently() {
        let t0 = Instant::now();
        let mut timers = MemorizeTimers::start(Discipline::Words, &config(20, 1), t0);
        let fires = timers.poll(t0 + Duration::from_secs(7));
        assert_eq!(fires, TimerFires { seconds: 7, pace: 2 });
    }
}
