use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

/// Result of recomputing the remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing was recomputed.
    Skipped,
    /// Still running with this many whole seconds left, rounded up.
    Remaining(u64),
    /// Reached zero on this tick. Only ever reported once per run.
    Completed,
}

/// Countdown state kept against monotonic instants.
///
/// While running, the remaining time is always
/// `total - (now - start_time - paused_duration)`, so missed or late ticks
/// never drift the countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub is_active: bool,
    pub is_paused: bool,
    pub start_time: Option<Instant>,
    pub paused_at: Option<Instant>,
    pub paused_duration: Duration,
    pub total_duration: Duration,
    pub time_left: Duration,
    completed: bool,
}

/// Serializable copy of a [`TimerState`] for resuming after a reload.
///
/// Instants do not survive a process boundary, so only durations are kept;
/// restoring rebuilds the anchors from them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub is_active: bool,
    pub is_paused: bool,
    pub total_duration_ms: u64,
    pub time_left_ms: u64,
    pub paused_duration_ms: u64,
    pub saved_at: DateTime<Utc>,
}

fn duration_ms(value: Duration) -> u64 {
    u64::try_from(value.as_millis()).unwrap_or(u64::MAX)
}

pub fn whole_seconds_up(value: Duration) -> u64 {
    let ms = duration_ms(value);
    ms / 1000 + u64::from(ms % 1000 != 0)
}

impl TimerState {
    pub fn new(total_duration: Duration) -> Self {
        Self {
            is_active: false,
            is_paused: false,
            start_time: None,
            paused_at: None,
            paused_duration: Duration::ZERO,
            total_duration,
            time_left: total_duration,
            completed: false,
        }
    }

    pub fn status(&self) -> TimerStatus {
        match (self.is_active, self.is_paused) {
            (true, false) => TimerStatus::Running,
            (true, true) => TimerStatus::Paused,
            (false, _) if self.completed => TimerStatus::Completed,
            (false, _) => TimerStatus::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_active && !self.is_paused
    }

    pub fn remaining_secs(&self) -> u64 {
        whole_seconds_up(self.time_left)
    }

    fn compute_time_left(&self, now: Instant) -> Duration {
        let Some(start) = self.start_time else {
            return self.time_left;
        };
        let elapsed = now
            .saturating_duration_since(start)
            .saturating_sub(self.paused_duration);
        self.total_duration.saturating_sub(elapsed)
    }

    /// Recomputes `time_left` while running; otherwise it stays frozen.
    pub fn refresh(&mut self, now: Instant) {
        if self.is_running() {
            self.time_left = self.compute_time_left(now);
        }
    }

    /// Returns false when already active.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.is_active {
            return false;
        }
        self.is_active = true;
        self.is_paused = false;
        self.completed = false;
        self.start_time = Some(now);
        self.paused_at = None;
        self.paused_duration = Duration::ZERO;
        self.time_left = self.total_duration;
        true
    }

    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Skipped;
        }

        self.time_left = self.compute_time_left(now);
        if self.time_left.is_zero() {
            self.is_active = false;
            self.is_paused = false;
            self.paused_at = None;
            self.completed = true;
            return TickOutcome::Completed;
        }

        TickOutcome::Remaining(self.remaining_secs())
    }

    /// Freezes the remaining time. Returns false unless running.
    pub fn pause(&mut self, now: Instant) -> bool {
        if !self.is_running() {
            return false;
        }
        self.time_left = self.compute_time_left(now);
        self.is_paused = true;
        self.paused_at = Some(now);
        true
    }

    /// Folds the pause gap into `paused_duration`. Returns false unless paused.
    pub fn resume(&mut self, now: Instant) -> bool {
        if !self.is_active || !self.is_paused {
            return false;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_duration += now.saturating_duration_since(paused_at);
        }
        self.is_paused = false;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.total_duration);
    }

    pub fn snapshot(&mut self, now: Instant, saved_at: DateTime<Utc>) -> TimerSnapshot {
        self.refresh(now);
        TimerSnapshot {
            is_active: self.is_active,
            is_paused: self.is_paused,
            total_duration_ms: duration_ms(self.total_duration),
            time_left_ms: duration_ms(self.time_left),
            paused_duration_ms: duration_ms(self.paused_duration),
            saved_at,
        }
    }

    /// Rebuilds monotonic anchors so the countdown continues from the
    /// snapshot's remaining time as if it had never stopped.
    pub fn restore(&mut self, snapshot: &TimerSnapshot, now: Instant) {
        let total_duration = Duration::from_millis(snapshot.total_duration_ms);
        let time_left = Duration::from_millis(snapshot.time_left_ms).min(total_duration);

        *self = Self::new(total_duration);
        self.time_left = time_left;

        if !snapshot.is_active {
            self.completed = time_left.is_zero() && !total_duration.is_zero();
            return;
        }

        let active_elapsed = total_duration - time_left;
        let paused_duration = Duration::from_millis(snapshot.paused_duration_ms);

        self.is_active = true;
        self.is_paused = snapshot.is_paused;
        self.paused_at = snapshot.is_paused.then_some(now);

        match now.checked_sub(active_elapsed + paused_duration) {
            Some(start) => {
                self.start_time = Some(start);
                self.paused_duration = paused_duration;
            }
            None => {
                // Monotonic clock too young to hold the pause history; drop it.
                self.start_time = Some(now.checked_sub(active_elapsed).unwrap_or(now));
                self.paused_duration = Duration::ZERO;
            }
        }
    }
}
