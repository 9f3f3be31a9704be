//! Deadline-driven timers polled from the event loop

use std::time::{Duration, Instant};

/// Periodic timer; fires at most once per poll
#[derive(Clone, Debug)]
pub struct AutoplayTimer {
    interval: Duration,
    due: Option<Instant>,
}

impl AutoplayTimer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            due: None,
        }
    }

    /// Arm (or re-arm) the timer to fire one `interval` after `now`
    pub fn start(&mut self, now: Instant, interval: Duration) {
        self.interval = interval;
        self.due = Some(now + interval);
    }

    pub fn stop(&mut self) {
        self.due = None;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn due(&self) -> Option<Instant> {
        self.due
    }

    /// Returns true when the timer fired.
    ///
    /// The next deadline keeps the cadence of the previous one, unless the
    /// caller stalled for longer than an interval: then it restarts from
    /// `now` instead of firing a burst of catch-up ticks.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                let next = due + self.interval;
                self.due = Some(if next <= now { now + self.interval } else { next });
                true
            }
            _ => false,
        }
    }
}

/// One-shot deadline
#[derive(Clone, Debug)]
pub struct Deadline {
    delay: Duration,
    due: Option<Instant>,
}

impl Deadline {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, due: None }
    }

    pub fn arm(&mut self, now: Instant) {
        self.due = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.due.is_some()
    }

    /// Returns true once when the deadline has passed, disarming it
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }
}
