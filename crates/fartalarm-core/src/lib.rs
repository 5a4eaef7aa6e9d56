//! # Fartalarm Core Library
//!
//! Scheduling and bookkeeping for the Fart Alarm app: user-defined alarms
//! that ring a looping sequence of fart sounds, a randomized background
//! "random fart" timer, an instant-fart button behind a free trial, a
//! countdown timer, and usage statistics with achievements.
//!
//! ## Architecture
//!
//! - **Engine**: pure functions over the persisted state that return
//!   [`Effect`]s instead of touching audio, notifications or storage
//! - **Runtime**: the host driver that owns the state, a [`TimerQueue`]
//!   and the collaborators, and executes those effects
//! - **Storage**: SQLite persistence of the state document and custom
//!   recordings, TOML engine configuration
//!
//! Nothing in the core sleeps or spawns. Time comes from a [`Clock`], so
//! a [`ManualClock`] drives every schedule deterministically in tests.
//!
//! ## Key Components
//!
//! - [`Runtime`]: host driver and public operation surface
//! - [`AlarmRegistry`]: the user's alarms
//! - [`ActiveAlarmPlayer`]: the ringing-alarm loop
//! - [`Database`]: state and recording persistence
//! - [`Config`]: engine configuration

pub mod alarm;
pub mod engine;
pub mod error;
pub mod events;
pub mod fun;
pub mod gate;
pub mod notify;
pub mod runtime;
pub mod scheduler;
pub mod sound;
pub mod state;
pub mod stats;
pub mod storage;
pub mod timer;

pub use alarm::{ActiveAlarmPlayer, Alarm, AlarmPatch, AlarmRegistry, Repeat, SoundMode, StopReason};
pub use engine::{Effect, RandomFartConfig, RandomFartPatch, RandomSoundMode, SnoozeBook};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use gate::TrialStatus;
pub use notify::{Notification, NotificationSink};
pub use runtime::Runtime;
pub use scheduler::{Clock, ManualClock, SystemClock, TimerQueue, Timestamp};
pub use sound::{CustomSound, CustomSoundStore, PlaybackGateway, SoundCatalog, SoundRef};
pub use state::{AppState, Settings};
pub use stats::{Achievement, UsageStats};
pub use storage::{Config, Database, StateStore};
pub use timer::{CountdownState, CountdownTimer, RepeatMode, TimerConfig};
