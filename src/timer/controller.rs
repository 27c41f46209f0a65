use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::{Context, Result};
use chrono::Utc;
use log::debug;
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{TickOutcome, TimerSnapshot, TimerState, TimerStatus};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

type TickFn = dyn Fn(u64) + Send + Sync;
type CompleteFn = dyn Fn() + Send + Sync;

/// Host hooks invoked from the timer. `on_tick` receives whole seconds left, rounded up.
#[derive(Clone, Default)]
pub struct TimerCallbacks {
    on_tick: Option<Arc<TickFn>>,
    on_complete: Option<Arc<CompleteFn>>,
}

impl TimerCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_tick(mut self, callback: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.on_tick = Some(Arc::new(callback));
        self
    }

    pub fn on_complete(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    fn tick(&self, remaining_secs: u64) {
        if let Some(callback) = &self.on_tick {
            callback(remaining_secs);
        }
    }

    fn dispatch(&self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Skipped => {}
            TickOutcome::Remaining(secs) => self.tick(secs),
            TickOutcome::Completed => {
                self.tick(0);
                if let Some(callback) = &self.on_complete {
                    callback();
                }
            }
        }
    }
}

/// Live periodic tick task. Cancelling it is the only way a schedule ends.
struct Schedule {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Schedule {
    fn cancel(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

struct Inner {
    state: TimerState,
    schedule: Option<Schedule>,
}

impl Inner {
    fn cancel_schedule(&mut self) {
        if let Some(schedule) = self.schedule.take() {
            schedule.cancel();
        }
    }
}

/// Countdown timer driven by a tokio interval.
///
/// Every transition that leaves the running state cancels the periodic
/// task before returning, and dropping the timer cancels it too.
///
/// Callbacks run outside the state lock. On a multi-thread runtime a tick
/// whose callback is already executing when `pause` or `reset` is called can
/// still finish; no new one starts after the call returns.
pub struct ReliableTimer {
    inner: Arc<Mutex<Inner>>,
    callbacks: TimerCallbacks,
    tick_interval: Duration,
    runtime: Handle,
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl ReliableTimer {
    /// Must be called from within a tokio runtime; ticks run on that runtime.
    pub fn new(total_duration: Duration, callbacks: TimerCallbacks) -> Result<Self> {
        let runtime = Handle::try_current().context("ReliableTimer requires a tokio runtime")?;
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                state: TimerState::new(total_duration),
                schedule: None,
            })),
            callbacks,
            tick_interval: DEFAULT_TICK_INTERVAL,
            runtime,
        })
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        if !tick_interval.is_zero() {
            self.tick_interval = tick_interval;
        }
        self
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn state(&self) -> TimerState {
        let mut guard = lock_inner(&self.inner);
        guard.state.refresh(Instant::now());
        guard.state.clone()
    }

    pub fn status(&self) -> TimerStatus {
        lock_inner(&self.inner).state.status()
    }

    pub fn remaining_secs(&self) -> u64 {
        let mut guard = lock_inner(&self.inner);
        guard.state.refresh(Instant::now());
        guard.state.remaining_secs()
    }

    pub fn has_schedule(&self) -> bool {
        lock_inner(&self.inner).schedule.is_some()
    }

    pub fn start(&self) {
        {
            let mut guard = lock_inner(&self.inner);
            if !guard.state.start(Instant::now()) {
                return;
            }
            self.spawn_ticker(&mut guard);
        }
        debug!("Timer started");
        self.tick();
    }

    /// Recomputes remaining time from the clock and notifies the host.
    pub fn tick(&self) {
        let outcome = {
            let mut guard = lock_inner(&self.inner);
            let outcome = guard.state.tick(Instant::now());
            if outcome == TickOutcome::Completed {
                guard.cancel_schedule();
            }
            outcome
        };
        self.callbacks.dispatch(outcome);
    }

    pub fn pause(&self) {
        let mut guard = lock_inner(&self.inner);
        if guard.state.pause(Instant::now()) {
            guard.cancel_schedule();
            debug!("Timer paused with {}s left", guard.state.remaining_secs());
        }
    }

    pub fn resume(&self) {
        {
            let mut guard = lock_inner(&self.inner);
            if !guard.state.resume(Instant::now()) {
                return;
            }
            self.spawn_ticker(&mut guard);
        }
        debug!("Timer resumed");
        self.tick();
    }

    pub fn reset(&self) {
        let remaining = {
            let mut guard = lock_inner(&self.inner);
            guard.cancel_schedule();
            guard.state.reset();
            guard.state.remaining_secs()
        };
        self.callbacks.tick(remaining);
    }

    /// Host visibility observer: regaining focus forces a catch-up tick.
    pub fn handle_visibility_change(&self, visible: bool) {
        if visible {
            self.tick();
        }
    }

    pub fn save_state(&self) -> TimerSnapshot {
        lock_inner(&self.inner)
            .state
            .snapshot(Instant::now(), Utc::now())
    }

    pub fn load_state(&self, snapshot: &TimerSnapshot) {
        let (running, remaining) = {
            let mut guard = lock_inner(&self.inner);
            guard.cancel_schedule();
            guard.state.restore(snapshot, Instant::now());
            let running = guard.state.is_running();
            if running {
                self.spawn_ticker(&mut guard);
            }
            (running, guard.state.remaining_secs())
        };

        if running {
            self.tick();
        } else {
            self.callbacks.tick(remaining);
        }
    }

    fn spawn_ticker(&self, inner: &mut Inner) {
        inner.cancel_schedule();

        let token = CancellationToken::new();
        let handle = self.runtime.spawn(run_ticker(
            Arc::clone(&self.inner),
            self.callbacks.clone(),
            token.clone(),
            self.tick_interval,
        ));

        inner.schedule = Some(Schedule { token, handle });
    }
}

impl Drop for ReliableTimer {
    fn drop(&mut self) {
        lock_inner(&self.inner).cancel_schedule();
    }
}

async fn run_ticker(
    inner: Arc<Mutex<Inner>>,
    callbacks: TimerCallbacks,
    token: CancellationToken,
    period: Duration,
) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }

        let outcome = {
            let mut guard = lock_inner(&inner);
            if token.is_cancelled() {
                break;
            }
            let outcome = guard.state.tick(Instant::now());
            if outcome == TickOutcome::Completed {
                if let Some(schedule) = guard.schedule.take() {
                    // This task owns the handle; the loop exits below.
                    schedule.token.cancel();
                }
            }
            outcome
        };

        if !deliver(&callbacks, &token, outcome) {
            break;
        }
        if outcome == TickOutcome::Completed {
            debug!("Timer completed");
            break;
        }
    }
}

/// Hands a periodic outcome to the host unless a pause or reset cancelled
/// the schedule after the outcome was computed. Completion cancels its own
/// schedule and is always delivered.
fn deliver(callbacks: &TimerCallbacks, token: &CancellationToken, outcome: TickOutcome) -> bool {
    if outcome != TickOutcome::Completed && token.is_cancelled() {
        return false;
    }
    callbacks.dispatch(outcome);
    true
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use super::*;

    struct Recorder {
        ticks: Arc<AtomicUsize>,
        last: Arc<AtomicU64>,
        completions: Arc<AtomicUsize>,
    }

    fn recording_callbacks() -> (Recorder, TimerCallbacks) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicU64::new(u64::MAX));
        let completions = Arc::new(AtomicUsize::new(0));

        let callbacks = TimerCallbacks::new()
            .on_tick({
                let ticks = ticks.clone();
                let last = last.clone();
                move |secs| {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    last.store(secs, Ordering::SeqCst);
                }
            })
            .on_complete({
                let completions = completions.clone();
                move || {
                    completions.fetch_add(1, Ordering::SeqCst);
                }
            });

        (
            Recorder {
                ticks,
                last,
                completions,
            },
            callbacks,
        )
    }

    fn close_to(actual: Duration, expected: Duration) -> bool {
        let diff = if actual > expected {
            actual - expected
        } else {
            expected - actual
        };
        diff <= Duration::from_millis(20)
    }

    #[tokio::test(start_paused = true)]
    async fn start_fires_immediate_tick_and_schedules() {
        let (recorder, callbacks) = recording_callbacks();
        let timer = ReliableTimer::new(Duration::from_secs(10), callbacks).unwrap();

        timer.start();
        assert_eq!(recorder.ticks.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.last.load(Ordering::SeqCst), 10);
        assert!(timer.has_schedule());
        assert_eq!(timer.status(), TimerStatus::Running);

        timer.start();
        assert_eq!(recorder.ticks.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_millis(2_100)).await;
        assert!(recorder.ticks.load(Ordering::SeqCst) >= 4);
        assert_eq!(recorder.last.load(Ordering::SeqCst), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_survives_long_suspension() {
        let (_recorder, callbacks) = recording_callbacks();
        let timer = ReliableTimer::new(Duration::from_secs(10), callbacks).unwrap();

        timer.start();
        time::sleep(Duration::from_secs(3)).await;
        timer.pause();
        assert!(!timer.has_schedule());
        assert!(close_to(timer.state().time_left, Duration::from_secs(7)));

        time::sleep(Duration::from_secs(100)).await;
        assert!(close_to(timer.state().time_left, Duration::from_secs(7)));

        timer.resume();
        let state = timer.state();
        assert!(state.paused_duration >= Duration::from_secs(100));
        assert!(close_to(state.time_left, Duration::from_secs(7)));
        assert!(timer.has_schedule());
    }

    #[tokio::test(start_paused = true)]
    async fn completion_fires_once_and_stops_ticking() {
        let (recorder, callbacks) = recording_callbacks();
        let timer = ReliableTimer::new(Duration::from_secs(2), callbacks).unwrap();

        timer.start();
        time::sleep(Duration::from_secs(3)).await;

        assert_eq!(recorder.completions.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.last.load(Ordering::SeqCst), 0);
        let state = timer.state();
        assert!(!state.is_active);
        assert_eq!(state.time_left, Duration::ZERO);
        assert_eq!(timer.status(), TimerStatus::Completed);
        assert!(!timer.has_schedule());

        let ticks = recorder.ticks.load(Ordering::SeqCst);
        time::sleep(Duration::from_secs(5)).await;
        timer.handle_visibility_change(true);
        assert_eq!(recorder.ticks.load(Ordering::SeqCst), ticks);
        assert_eq!(recorder.completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_and_reports_full_duration() {
        let (recorder, callbacks) = recording_callbacks();
        let timer = ReliableTimer::new(Duration::from_secs(90), callbacks).unwrap();

        timer.start();
        time::sleep(Duration::from_secs(5)).await;
        timer.reset();

        assert!(!timer.has_schedule());
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(recorder.last.load(Ordering::SeqCst), 90);

        let ticks = recorder.ticks.load(Ordering::SeqCst);
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(recorder.ticks.load(Ordering::SeqCst), ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn visibility_regain_catches_up_immediately() {
        let (recorder, callbacks) = recording_callbacks();
        let timer = ReliableTimer::new(Duration::from_secs(60), callbacks)
            .unwrap()
            .with_tick_interval(Duration::from_secs(30));

        timer.start();
        time::advance(Duration::from_secs(12)).await;
        timer.handle_visibility_change(false);
        assert_eq!(recorder.last.load(Ordering::SeqCst), 60);

        timer.handle_visibility_change(true);
        assert_eq!(recorder.last.load(Ordering::SeqCst), 48);
    }

    #[tokio::test(start_paused = true)]
    async fn save_and_load_across_instances() {
        let (_first_recorder, first_callbacks) = recording_callbacks();
        let first = ReliableTimer::new(Duration::from_secs(40), first_callbacks).unwrap();
        first.start();
        time::sleep(Duration::from_secs(15)).await;
        let snapshot = first.save_state();
        drop(first);
        assert_eq!(snapshot.time_left_ms / 1000, 25);

        time::sleep(Duration::from_secs(60)).await;

        let (recorder, callbacks) = recording_callbacks();
        let second = ReliableTimer::new(Duration::from_secs(1), callbacks).unwrap();
        second.load_state(&snapshot);
        assert_eq!(second.status(), TimerStatus::Running);
        assert_eq!(recorder.last.load(Ordering::SeqCst), 25);
        assert!(second.has_schedule());

        time::sleep(Duration::from_secs(26)).await;
        assert_eq!(recorder.completions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn load_paused_snapshot_only_refreshes_display() {
        let (_first_recorder, first_callbacks) = recording_callbacks();
        let first = ReliableTimer::new(Duration::from_secs(30), first_callbacks).unwrap();
        first.start();
        time::sleep(Duration::from_secs(10)).await;
        first.pause();
        let snapshot = first.save_state();

        let (recorder, callbacks) = recording_callbacks();
        let second = ReliableTimer::new(Duration::from_secs(30), callbacks).unwrap();
        second.load_state(&snapshot);
        assert_eq!(second.status(), TimerStatus::Paused);
        assert!(!second.has_schedule());
        assert_eq!(recorder.last.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn cancelled_schedule_drops_pending_tick_but_not_completion() {
        let (recorder, callbacks) = recording_callbacks();
        let token = CancellationToken::new();
        assert!(deliver(&callbacks, &token, TickOutcome::Remaining(9)));
        assert_eq!(recorder.last.load(Ordering::SeqCst), 9);

        token.cancel();
        assert!(!deliver(&callbacks, &token, TickOutcome::Remaining(8)));
        assert_eq!(recorder.ticks.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.last.load(Ordering::SeqCst), 9);

        assert!(deliver(&callbacks, &token, TickOutcome::Completed));
        assert_eq!(recorder.last.load(Ordering::SeqCst), 0);
        assert_eq!(recorder.completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn construction_outside_runtime_fails() {
        let result = ReliableTimer::new(Duration::from_secs(1), TimerCallbacks::new());
        assert!(result.is_err());
    }
}
