pub mod controller;
pub mod state;

pub use controller::{ReliableTimer, TimerCallbacks, DEFAULT_TICK_INTERVAL};
pub use state::{TickOutcome, TimerSnapshot, TimerState, TimerStatus};
