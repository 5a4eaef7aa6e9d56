mod config;
mod engine;

pub use config::{RepeatKind, RepeatMode, TimerConfig, INFINITE_EXTRA_PLAYS, REPEAT_GAP_SECS};
pub use engine::{CountdownState, CountdownTimer};
