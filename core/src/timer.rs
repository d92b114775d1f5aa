use serde::{Deserialize, Serialize};

use crate::*;

/// Run clock derived from explicit timestamps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    /// Zero while the clock has not started.
    start_time: Millis,
    time_limit: Millis,
    #[serde(skip)]
    timeout: Option<TimerId>,
}

impl Timer {
    pub fn start_time(&self) -> Millis {
        self.start_time
    }

    pub fn is_started(&self) -> bool {
        self.start_time != 0
    }

    pub(crate) fn set_start_time(&mut self, start_time: Millis) {
        self.start_time = start_time;
    }

    /// Records the start once, later calls keep the original start.
    ///
    /// A non-zero `limit` arms a [`TimerEvent::Timeout`].
    pub fn start(&mut self, now: Millis, limit: Millis, scheduler: &mut Scheduler) {
        if self.start_time == 0 {
            self.start_time = now;
        }
        self.time_limit = limit;

        if let Some(id) = self.timeout.take() {
            scheduler.cancel(id);
        }
        if limit > 0 {
            self.timeout = Some(scheduler.schedule(now, limit, TimerEvent::Timeout));
        }
    }

    /// Disarms the timeout and reports the elapsed time.
    pub fn stop(&mut self, now: Millis, scheduler: &mut Scheduler) -> Millis {
        if let Some(id) = self.timeout.take() {
            scheduler.cancel(id);
        }
        self.elapsed(now)
    }

    pub fn reset(&mut self, scheduler: &mut Scheduler) {
        self.stop(0, scheduler);
        self.start_time = 0;
    }

    pub fn elapsed(&self, now: Millis) -> Millis {
        if self.start_time == 0 {
            return 0;
        }
        now.saturating_sub(self.start_time)
    }

    /// Negative once the limit has passed.
    pub fn remaining(&self, now: Millis) -> i64 {
        if self.start_time == 0 {
            return 0;
        }
        (self.start_time + self.time_limit) as i64 - now as i64
    }
}

/// Formats a duration as `MM:SS`, or `MM:SS.cc` with centiseconds.
pub fn format_timer(millis: Millis, precise: bool) -> String {
    let minutes = millis / 60_000;
    let seconds = millis / 1000 % 60;
    if precise {
        format!("{:02}:{:02}.{:02}", minutes, seconds, millis % 1000 / 10)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
