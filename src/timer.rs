use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Seconds at or below which the per-word countdown is shown as a warning
pub const WARNING_THRESHOLD_SECS: u32 = 5;
/// Seconds at or below which every countdown tick plays a warning cue
pub const CUE_THRESHOLD_SECS: u32 = 3;

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Monotonic time source polled by the session controller.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed epoch.
    fn now(&self) -> Duration;
}

/// Production clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Whole-second countdown for the word currently on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    next_tick_at: Duration,
}

impl Countdown {
    pub fn start(secs: u32, now: Duration) -> Self {
        Self {
            remaining: secs,
            next_tick_at: now + ONE_SECOND,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn next_tick_at(&self) -> Duration {
        self.next_tick_at
    }

    pub fn is_warning(&self) -> bool {
        self.remaining <= WARNING_THRESHOLD_SECS
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Consume one second. Returns the new remaining count.
    pub fn tick(&mut self) -> u32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.next_tick_at += ONE_SECOND;
        self.remaining
    }
}

/// Transition the controller runs once a grace period has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    AdvanceWord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferred {
    pub due: Duration,
    pub action: DeferredAction,
}

impl Deferred {
    pub fn new(now: Duration, delay: Duration, action: DeferredAction) -> Self {
        Self {
            due: now + delay,
            action,
        }
    }

    pub fn is_due(&self, now: Duration) -> bool {
        self.due <= now
    }
}

/// Delays between an outcome and the automatic move to the next word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePeriods {
    pub correct: Duration,
    pub incorrect: Duration,
    pub skipped: Duration,
    pub expired: Duration,
    pub revealed: Duration,
}

impl GracePeriods {
    pub fn interactive() -> Self {
        Self {
            correct: Duration::from_millis(1500),
            incorrect: Duration::from_millis(3000),
            skipped: Duration::from_millis(2000),
            expired: Duration::from_millis(2000),
            revealed: Duration::from_millis(3000),
        }
    }

    /// No delays at all; transitions run inside the triggering call.
    pub fn immediate() -> Self {
        Self {
            correct: Duration::ZERO,
            incorrect: Duration::ZERO,
            skipped: Duration::ZERO,
            expired: Duration::ZERO,
            revealed: Duration::ZERO,
        }
    }
}

impl Default for GracePeriods {
    fn default() -> Self {
        Self::interactive()
    }
}
