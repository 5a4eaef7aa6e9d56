//! Scheduling decisions.
//!
//! Everything here is a function of `(state, now)` that mutates the state
//! it is given and returns [`Effect`]s. No I/O, no clock reads: the
//! [`Runtime`](crate::runtime::Runtime) supplies `now` and executes the
//! effects.

mod alarms;
mod effect;
pub mod random;

pub use alarms::{evaluate_alarms, SnoozeBook};
pub use effect::Effect;
pub use random::{
    configure_random_fart, draw_delay_minutes, fire_random_fart, in_active_hours, next_fire_at,
    RandomFartConfig, RandomFartPatch, RandomSoundMode, SkipReason,
};
