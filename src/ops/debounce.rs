use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Holds at most one pending task and releases it once `delay` has passed
/// without a newer schedule. Time is passed in so callers (and tests)
/// control the clock.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending task and restart the quiet period from `now`.
    pub fn schedule(&mut self, now: Instant, task: T) {
        self.pending = Some((now + self.delay, task));
    }

    /// Take the pending task if its quiet period has ended. The slot is
    /// emptied before the task is handed out, so the task may schedule again.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if now >= *deadline => self.pending.take().map(|(_, task)| task),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left before the pending task is due, if any
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(deadline, _)| deadline.saturating_duration_since(now))
    }
}

/// Re-entrancy guard: at most one holder at a time.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

/// Held while a guarded operation runs; dropping it releases the guard.
#[derive(Debug)]
pub struct InFlightToken {
    busy: Arc<AtomicBool>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the guarded section, or `None` if someone is already in it.
    pub fn try_enter(&self) -> Option<InFlightToken> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightToken {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
