use std::rc::Rc;
use std::time::Instant;

use crate::store::{KeyValueBackend, ProgressStore};

/// Receives the wall-clock length of a finished session.
pub trait SessionSink {
    fn record_session_end(&self, duration_seconds: u64);
}

impl<B: KeyValueBackend> SessionSink for ProgressStore<B> {
    fn record_session_end(&self, duration_seconds: u64) {
        ProgressStore::record_session_end(self, duration_seconds);
    }
}

impl<S: SessionSink + ?Sized> SessionSink for &S {
    fn record_session_end(&self, duration_seconds: u64) {
        (**self).record_session_end(duration_seconds);
    }
}

impl<S: SessionSink + ?Sized> SessionSink for Rc<S> {
    fn record_session_end(&self, duration_seconds: u64) {
        (**self).record_session_end(duration_seconds);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Host is in the background; the tick was skipped.
    Skipped,
    Counted,
    /// The limit was reached on this tick. Returned once per timer until
    /// `reset`.
    TimeUp,
}

/// Counts foreground seconds toward the parent's session limit.
///
/// The driver calls `tick` once per second and `set_visible` on focus
/// changes. Dropping the timer reports the wall-clock time since it was
/// started, including background time, to the sink.
pub struct SessionTimer<S: SessionSink> {
    sink: Option<S>,
    started_at: Instant,
    elapsed_seconds: u64,
    is_active: bool,
    time_limit_minutes: u32,
    time_up_fired: bool,
}

impl<S: SessionSink> SessionTimer<S> {
    pub fn new(sink: S, time_limit_minutes: u32) -> Self {
        Self::started_at(sink, time_limit_minutes, Instant::now())
    }

    pub fn started_at(sink: S, time_limit_minutes: u32, started_at: Instant) -> Self {
        Self {
            sink: Some(sink),
            started_at,
            elapsed_seconds: 0,
            is_active: true,
            time_limit_minutes,
            time_up_fired: false,
        }
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.is_active = visible;
    }

    pub fn set_time_limit(&mut self, minutes: u32) {
        self.time_limit_minutes = minutes;
    }

    /// Seconds left before the limit, or `None` when play is unlimited.
    pub fn remaining_seconds(&self) -> Option<u64> {
        if self.time_limit_minutes == 0 {
            return None;
        }
        let limit = u64::from(self.time_limit_minutes) * 60;
        Some(limit.saturating_sub(self.elapsed_seconds))
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_active {
            return TickOutcome::Skipped;
        }
        self.elapsed_seconds += 1;

        if self.time_limit_minutes > 0
            && !self.time_up_fired
            && self.elapsed_seconds >= u64::from(self.time_limit_minutes) * 60
        {
            self.time_up_fired = true;
            return TickOutcome::TimeUp;
        }
        TickOutcome::Counted
    }

    /// Tick and invoke `on_time_up` if this tick reached the limit.
    pub fn tick_with<F: FnOnce()>(&mut self, on_time_up: F) -> TickOutcome {
        let outcome = self.tick();
        if outcome == TickOutcome::TimeUp {
            on_time_up();
        }
        outcome
    }

    pub fn reset(&mut self) {
        self.elapsed_seconds = 0;
        self.time_up_fired = false;
    }

    /// End the session now, reporting and returning its wall-clock length.
    pub fn finish(mut self) -> u64 {
        self.report().unwrap_or(0)
    }

    fn report(&mut self) -> Option<u64> {
        let sink = self.sink.take()?;
        let duration = self.started_at.elapsed().as_secs();
        sink.record_session_end(duration);
        Some(duration)
    }
}

impl<S: SessionSink> Drop for SessionTimer<S> {
    fn drop(&mut self) {
        self.report();
    }
}
