use helpers::general::{divmod, round_half_away};
use std::time::{Duration, Instant};

/// Default period of the local clock emulation, one tick per decisecond.
pub const TICK_PERIOD: Duration = Duration::from_millis(100);

/// ScheduledTick is the pending firing of a running clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTick {
    pub due: Instant,
}

/// Clock emulates the race timer locally between two server messages. It only counts while a
/// tick is scheduled, i.e. between `start` and `stop`.
#[derive(Debug)]
pub struct Clock {
    deciseconds: u64,
    period: Duration,
    task: Option<ScheduledTick>,
}

impl Clock {
    pub fn new(period: Duration) -> Clock {
        Clock {
            deciseconds: 0,
            period: period.max(Duration::from_millis(1)),
            task: None,
        }
    }

    /// start drops any pending tick, resets the value to zero and schedules the first tick one
    /// period after `now`.
    pub fn start(&mut self, now: Instant) {
        self.stop();
        self.deciseconds = 0;
        self.task = Some(ScheduledTick {
            due: now + self.period,
        });
    }

    /// stop cancels the pending tick. Stopping a stopped clock does nothing.
    pub fn stop(&mut self) {
        self.task = None;
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// next_due returns the deadline of the pending tick, if the clock is running.
    pub fn next_due(&self) -> Option<Instant> {
        self.task.map(|task| task.due)
    }

    /// fire_due fires every tick whose deadline is not after `now` and returns how many fired.
    /// Each firing adds one decisecond and schedules the next tick one period later.
    pub fn fire_due(&mut self, now: Instant) -> u32 {
        let mut fired = 0;

        while let Some(task) = self.task.as_mut() {
            if task.due > now {
                break;
            }
            self.deciseconds += 1;
            task.due += self.period;
            fired += 1;
        }

        fired
    }

    /// value returns the elapsed race time in deciseconds.
    pub fn value(&self) -> u64 {
        self.deciseconds
    }

    /// text returns the current value formatted as `MM:SS.D`.
    pub fn text(&self) -> String {
        format(self.deciseconds as f64 / 10.0)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::new(TICK_PERIOD)
    }
}

/// format renders a duration given in seconds as `MM:SS.D`. The seconds part is rounded to one
/// decimal with ties away from zero; negative and non-finite inputs count as zero.
pub fn format(total_seconds: f64) -> String {
    let total_seconds = if total_seconds.is_finite() && total_seconds > 0.0 {
        total_seconds
    } else {
        0.0
    };

    let (minutes, seconds) = divmod(total_seconds, 60.0);
    let tenths = (round_half_away(seconds, 1) * 10.0).round() as u64;

    format!("{:02}:{:02}.{}", minutes as u64, tenths / 10, tenths % 10)
}
