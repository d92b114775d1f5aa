use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Deferred work of a game, fired by [`Game::advance`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    HideCell(CellIndex),
    EnableCell(CellIndex),
    ClearFinisher(CellIndex),
    ClearResult,
    /// Armed by [`Timer::start`] with a limit.
    Timeout,
    /// Binary: debounced check of the filled grid.
    VerifyFill,
    /// Jewels and Puzzle: two swapped cells finished traveling.
    SettleSwap {
        first: CellIndex,
        second: CellIndex,
        swap_back: bool,
    },
    /// Jewels: one gravity pass of a cascade at combo `depth`.
    Refill { depth: u32 },
    /// Jewels: one second of the clock.
    Countdown,
    /// Pattern
    HideCells { enable: bool },
    StartLevel { level_up: bool },
    BuildPattern,
    EndRun,
}

impl TimerEvent {
    /// Per-cell events, cancelled together when a cell is taken over.
    pub const fn cell(self) -> Option<CellIndex> {
        match self {
            Self::HideCell(index) | Self::EnableCell(index) | Self::ClearFinisher(index) => {
                Some(index)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Scheduled {
    id: TimerId,
    due: Millis,
    event: TimerEvent,
}

/// Cancellable single-threaded timer queue.
///
/// Events fire in due order, ties in the order they were scheduled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scheduler {
    next_id: u64,
    queue: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Millis, delay: Millis, event: TimerEvent) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.push(Scheduled {
            id,
            due: now.saturating_add(delay),
            event,
        });
        log::trace!("scheduled {:?} in {}ms", event, delay);
        id
    }

    /// Returns false if the event already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|scheduled| scheduled.id != id);
        self.queue.len() != before
    }

    pub fn cancel_where(&mut self, predicate: impl Fn(&TimerEvent) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|scheduled| !predicate(&scheduled.event));
        before - self.queue.len()
    }

    /// Drops the pending hide/enable of a cell.
    pub fn cancel_cell(&mut self, index: CellIndex) -> usize {
        self.cancel_where(|event| event.cell() == Some(index))
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn is_pending(&self, predicate: impl Fn(&TimerEvent) -> bool) -> bool {
        self.queue.iter().any(|scheduled| predicate(&scheduled.event))
    }

    /// Rewrites pending events in place, keeping their due times.
    pub fn update_pending(&mut self, mut update: impl FnMut(&mut TimerEvent)) {
        for scheduled in &mut self.queue {
            update(&mut scheduled.event);
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.queue.iter().map(|scheduled| scheduled.due).min()
    }

    /// Removes and returns the earliest event due at `now`, with its due time.
    pub fn pop_due(&mut self, now: Millis) -> Option<(Millis, TimerEvent)> {
        let position = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, scheduled)| scheduled.due <= now)
            .min_by_key(|(_, scheduled)| (scheduled.due, scheduled.id))
            .map(|(position, _)| position)?;
        let scheduled = self.queue.remove(position);
        Some((scheduled.due, scheduled.event))
    }
}
