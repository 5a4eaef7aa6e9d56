//! Host driver.
//!
//! [`Runtime`] owns the [`AppState`] and the collaborators, turns user
//! actions and due timers into engine calls, and executes the returned
//! [`Effect`]s. It never sleeps: the host calls [`Runtime::poll`] whenever
//! [`Runtime::next_deadline`] passes (or on any schedule it likes), and
//! every wait is an entry in one [`TimerQueue`].
//!
//! Nothing on the scheduling path returns an error. Playback,
//! notification and persistence failures are logged and the occurrence
//! is skipped.

use chrono::Duration;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::alarm::{
    ActiveAlarmPlayer, Alarm, AlarmPatch, AlarmRegistry, PlayerCommand, PlayerState, StopReason,
};
use crate::engine::{
    configure_random_fart, evaluate_alarms, fire_random_fart, Effect, RandomFartPatch, SnoozeBook,
};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::fun;
use crate::notify::{Notification, NotificationSink, RecordingNotifier};
use crate::scheduler::{Clock, SystemClock, TimerId, TimerQueue, Timestamp};
use crate::sound::{
    self, is_custom, CustomSound, CustomSoundStore, MemorySoundStore, PlaybackGateway,
    RecordingPlayback, SoundCatalog, CLASSIC, MAX_CUSTOM_SOUNDS,
};
use crate::state::AppState;
use crate::stats;
use crate::storage::{EngineConfig, MemoryStateStore, StateStore};
use crate::timer::{CountdownTimer, RepeatMode, REPEAT_GAP_SECS};

/// Work waiting in the timer queue.
#[derive(Debug, Clone, PartialEq)]
enum Task {
    AlarmTick,
    RandomFart,
    /// The ringing alarm's current sound has finished.
    PlayerPlayed { duration_secs: f64 },
    /// The gap between alarm sounds has elapsed.
    PlayerResume,
    PlayerDisplay,
    CountdownTick,
    CountdownRepeat,
    FunCheck,
}

fn secs(value: f64) -> Duration {
    Duration::milliseconds((value * 1000.0).round() as i64)
}

pub struct Runtime {
    state: AppState,
    engine: EngineConfig,
    catalog: SoundCatalog,
    playback: Box<dyn PlaybackGateway>,
    notifier: Box<dyn NotificationSink>,
    store: Box<dyn StateStore>,
    sounds: Box<dyn CustomSoundStore>,
    clock: Box<dyn Clock>,
    rng: StdRng,

    queue: TimerQueue<Task>,
    snoozes: SnoozeBook,
    active: Option<ActiveAlarmPlayer>,
    countdown: CountdownTimer,
    repeat_plays_left: u32,
    alarm_tick: Option<TimerId>,
    random_timer: Option<TimerId>,
    player_timer: Option<TimerId>,
    display_timer: Option<TimerId>,
    countdown_timer: Option<TimerId>,
    repeat_timer: Option<TimerId>,
    fun_timer: Option<TimerId>,
    /// The active alarm is a `test_alarm` copy.
    testing: bool,
    events: Vec<Event>,
    started: bool,
}

impl Runtime {
    /// A runtime over `state` with in-memory collaborators and the system
    /// clock. Swap them with the `with_*` builders.
    pub fn new(state: AppState) -> Self {
        let countdown = CountdownTimer::new(state.timer.clone());
        Self {
            state,
            engine: EngineConfig::default(),
            catalog: SoundCatalog::default(),
            playback: Box::new(RecordingPlayback::default()),
            notifier: Box::new(RecordingNotifier::new()),
            store: Box::new(MemoryStateStore::new()),
            sounds: Box::new(MemorySoundStore::new()),
            clock: Box::new(SystemClock),
            rng: StdRng::from_entropy(),
            queue: TimerQueue::new(),
            snoozes: SnoozeBook::new(),
            active: None,
            countdown,
            repeat_plays_left: 0,
            alarm_tick: None,
            random_timer: None,
            player_timer: None,
            display_timer: None,
            countdown_timer: None,
            repeat_timer: None,
            fun_timer: None,
            testing: false,
            events: Vec::new(),
            started: false,
        }
    }

    /// Load state from `store` (defaults on first run) and persist
    /// through it from then on.
    pub fn load(store: Box<dyn StateStore>) -> Result<Self> {
        let state = store.load()?.unwrap_or_default();
        Ok(Self::new(state).with_store(store))
    }

    pub fn with_store(mut self, store: Box<dyn StateStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_playback(mut self, playback: Box<dyn PlaybackGateway>) -> Self {
        self.playback = playback;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_sound_store(mut self, sounds: Box<dyn CustomSoundStore>) -> Self {
        self.sounds = sounds;
        self
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_catalog(mut self, catalog: SoundCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_engine_config(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Deterministic randomness.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn alarms(&self) -> &AlarmRegistry {
        &self.state.alarms
    }

    pub fn active_alarm(&self) -> Option<&ActiveAlarmPlayer> {
        self.active.as_ref()
    }

    pub fn snoozes(&self) -> &SnoozeBook {
        &self.snoozes
    }

    pub fn countdown(&self) -> &CountdownTimer {
        &self.countdown
    }

    pub fn catalog(&self) -> &SoundCatalog {
        &self.catalog
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn custom_sounds(&self) -> Result<Vec<CustomSound>> {
        self.sounds.get_all()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// When the next queued task falls due.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.queue.next_deadline()
    }

    /// Take the events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Begin the periodic activities: the alarm tick (first one now), the
    /// random-fart timer and the fun-notification checks.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let now = self.clock.now();
        tracing::info!(
            alarms = self.state.alarms.len(),
            tick_secs = self.engine.tick_interval_secs,
            "scheduler started"
        );

        self.alarm_tick = Some(self.queue.schedule(now, Task::AlarmTick));
        self.rearm_random_farts(&now);
        self.fun_timer = Some(self.queue.schedule(now + fun::first_check_delay(), Task::FunCheck));
    }

    /// Run every task that is due. Returns how many ran.
    pub fn poll(&mut self) -> usize {
        let mut ran = 0;
        loop {
            let now = self.clock.now();
            let Some((_, task)) = self.queue.pop_due(now) else {
                break;
            };
            self.run_task(task, now);
            ran += 1;
        }
        ran
    }

    /// Stop everything, silence playback and flush state.
    pub fn shutdown(&mut self) {
        let now = self.clock.now();
        if self.active.is_some() {
            self.finish_alarm(StopReason::User, &now);
        }
        self.queue.clear();
        self.alarm_tick = None;
        self.random_timer = None;
        self.countdown_timer = None;
        self.repeat_timer = None;
        self.fun_timer = None;
        self.playback.stop();
        self.started = false;
        self.persist();
        tracing::info!("scheduler stopped");
    }

    /// Flush state to the store, reporting failure.
    pub fn save(&mut self) -> Result<()> {
        self.store.save(&self.state)
    }

    // ── Instant fart ─────────────────────────────────────────────────

    /// The main button. Refused once the trial has ended.
    ///
    /// Returns whether a fart was produced.
    pub fn instant_fart(&mut self) -> bool {
        let now = self.clock.now();
        if self.state.trial_ended() {
            tracing::info!("instant fart refused, trial ended");
            self.events.push(Event::PaywallShown { at: now });
            return false;
        }
        let id = if self.state.settings.randomize {
            self.catalog.random_id(&mut self.rng).to_string()
        } else {
            self.state.selected_sound.clone()
        };
        let duration = self.play(&id);
        if duration <= 0.0 {
            tracing::warn!(sound = %id, "instant fart failed to play");
            return false;
        }
        self.events.push(Event::FartPlayed { sound: id, at: now });
        self.record_fart(&now);
        true
    }

    /// Choose the instant-fart sound. Must be a built-in id or an
    /// existing recording.
    pub fn set_selected_sound(&mut self, id: &str) -> bool {
        let known = if is_custom(id) {
            matches!(self.sounds.get(id), Ok(Some(_)))
        } else {
            self.catalog.is_built_in(id)
        };
        if !known {
            return false;
        }
        self.state.selected_sound = id.to_string();
        self.persist();
        true
    }

    // ── Alarms ───────────────────────────────────────────────────────

    /// Create an alarm from defaults, then apply `patch`. Returns its id.
    pub fn create_alarm(&mut self, patch: &AlarmPatch) -> String {
        let now = self.clock.now();
        let id = self.state.alarms.create(&now);
        self.state.alarms.update(&id, patch);
        self.persist();
        id
    }

    /// Apply `patch`. Changing `enabled` drops any pending snooze.
    pub fn update_alarm(&mut self, id: &str, patch: &AlarmPatch) -> bool {
        let was_enabled = self.state.alarms.get(id).map(|a| a.enabled);
        let updated = self.state.alarms.update(id, patch);
        if updated {
            let enabled = self.state.alarms.get(id).map(|a| a.enabled);
            if enabled != was_enabled {
                self.snoozes.remove(id);
            }
            self.persist();
        }
        updated
    }

    /// Remove an alarm and any snooze it had. A ringing copy keeps ringing.
    pub fn remove_alarm(&mut self, id: &str) -> bool {
        let removed = self.state.alarms.remove(id).is_some();
        if removed {
            self.snoozes.remove(id);
            self.persist();
        }
        removed
    }

    /// Flip `enabled`, dropping any pending snooze.
    pub fn toggle_alarm(&mut self, id: &str) -> Option<bool> {
        let enabled = self.state.alarms.toggle(id)?;
        self.snoozes.remove(id);
        self.persist();
        Some(enabled)
    }

    pub fn toggle_alarm_sound(&mut self, id: &str, sound: &str) -> bool {
        let changed = self.state.alarms.toggle_selected_sound(id, sound);
        if changed {
            self.persist();
        }
        changed
    }

    /// Ring a transient copy of an alarm right now.
    ///
    /// The copy uses the configured test duration and a `(Test)` name;
    /// the registry entry is not touched. Snoozing it just stops it.
    /// Refused while another alarm is ringing or when the id is unknown.
    pub fn test_alarm(&mut self, id: &str) -> bool {
        if self.active.is_some() {
            return false;
        }
        let Some(mut alarm) = self.state.alarms.get(id).cloned() else {
            return false;
        };
        let now = self.clock.now();
        alarm.name = format!("{} (Test)", alarm.name);
        alarm.duration = self.engine.test_alarm_duration_secs;
        tracing::info!(alarm = %alarm.id, "testing alarm");
        self.events.push(Event::AlarmTriggered {
            alarm_id: alarm.id.clone(),
            name: alarm.name.clone(),
            snoozed: false,
            at: now,
        });
        self.testing = true;
        self.activate(alarm, false, &now);
        true
    }

    /// Stop the ringing alarm.
    pub fn stop_alarm(&mut self) -> bool {
        if self.active.is_none() {
            return false;
        }
        let now = self.clock.now();
        self.finish_alarm(StopReason::User, &now);
        true
    }

    /// Snooze the ringing alarm for one of the configured presets.
    pub fn snooze_alarm(&mut self, minutes: u32) -> bool {
        if !self.engine.snooze_presets.contains(&minutes) {
            tracing::warn!(minutes, presets = ?self.engine.snooze_presets, "not a snooze preset");
            return false;
        }
        let Some(alarm_id) = self.active.as_ref().map(|p| p.alarm_id().to_string()) else {
            return false;
        };
        let now = self.clock.now();
        if self.testing {
            tracing::info!(alarm = %alarm_id, "test ring snoozed, stopping instead");
            self.finish_alarm(StopReason::User, &now);
            return true;
        }
        let until = self.snoozes.snooze(&alarm_id, minutes, &now);
        tracing::info!(alarm = %alarm_id, minutes, "alarm snoozed");
        self.finish_alarm(StopReason::Snoozed { minutes }, &now);
        self.events.push(Event::AlarmSnoozed {
            alarm_id,
            until,
            at: now,
        });
        true
    }

    /// User interaction while audio is blocked: probe again.
    pub fn enable_sound(&mut self) -> bool {
        let Some(cmd) = self.active.as_mut().and_then(ActiveAlarmPlayer::retry) else {
            return false;
        };
        let now = self.clock.now();
        self.drive(cmd, &now);
        true
    }

    // ── Random farts ─────────────────────────────────────────────────

    /// Merge a settings patch; re-arms when a governing field changed.
    pub fn update_random_farts(&mut self, patch: &RandomFartPatch) {
        let governing = self.state.settings.random_farts.apply(patch);
        if governing && self.started {
            let now = self.clock.now();
            self.rearm_random_farts(&now);
        }
        self.persist();
    }

    // ── Settings, premium, stats ─────────────────────────────────────

    pub fn set_volume(&mut self, volume: f32) {
        self.state.settings.volume = volume.clamp(0.0, 1.0);
        self.persist();
    }

    pub fn set_randomize(&mut self, randomize: bool) {
        self.state.settings.randomize = randomize;
        self.persist();
    }

    pub fn set_notifications_enabled(&mut self, enabled: bool) {
        self.state.settings.notifications_enabled = enabled;
        self.persist();
    }

    pub fn set_fun_notifications(&mut self, enabled: bool) {
        self.state.settings.fun_notifications.enabled = enabled;
        self.persist();
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.state.settings.repeat_mode = mode;
        self.persist();
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.state.settings.dark_mode = dark;
        self.persist();
    }

    /// Unlock (or revoke) premium. Unlocking lets a random-fart timer
    /// that the trial kept unarmed start again.
    pub fn set_premium(&mut self, premium: bool) {
        let was = self.state.is_premium;
        self.state.is_premium = premium;
        let now = self.clock.now();
        if premium && !was {
            tracing::info!("premium unlocked");
            self.events.push(Event::PremiumUnlocked { at: now });
            if self.started && self.random_timer.is_none() {
                self.rearm_random_farts(&now);
            }
        }
        self.persist();
    }

    /// Clear statistics and premium. A fresh trial lets a random-fart
    /// timer that the ended trial kept unarmed start again.
    pub fn reset_stats(&mut self) {
        self.state.reset_stats();
        if self.started && self.random_timer.is_none() {
            let now = self.clock.now();
            self.rearm_random_farts(&now);
        }
        self.persist();
    }

    // ── Countdown ────────────────────────────────────────────────────

    pub fn countdown_start(&mut self) -> bool {
        let now = self.clock.now();
        let Some(event) = self.countdown.start(&now) else {
            return false;
        };
        self.events.push(event);
        self.arm_countdown();
        true
    }

    /// Pause.
    pub fn countdown_stop(&mut self) -> bool {
        let now = self.clock.now();
        self.cancel(Task::CountdownTick);
        match self.countdown.stop(&now) {
            Some(event) => {
                self.events.push(event);
                true
            }
            None => false,
        }
    }

    pub fn countdown_reset(&mut self) {
        let now = self.clock.now();
        self.cancel(Task::CountdownTick);
        self.cancel(Task::CountdownRepeat);
        if let Some(event) = self.countdown.reset(&now) {
            self.events.push(event);
        }
    }

    pub fn set_countdown_time(
        &mut self,
        hours: u32,
        minutes: u32,
        seconds: u32,
    ) -> Result<(), ValidationError> {
        let now = self.clock.now();
        self.countdown.set_time(hours, minutes, seconds, &now)?;
        self.cancel(Task::CountdownTick);
        self.state.timer = self.countdown.config().clone();
        self.persist();
        Ok(())
    }

    pub fn set_countdown_sound(&mut self, sound: &str) {
        self.countdown.set_sound(sound);
        self.state.timer.sound = sound.to_string();
        self.persist();
    }

    // ── Custom sounds ────────────────────────────────────────────────

    /// Store a recording. `None` when the library is full.
    pub fn add_custom_sound(
        &mut self,
        name: &str,
        audio: Vec<u8>,
        mime_type: &str,
        duration: f64,
    ) -> Result<Option<CustomSound>> {
        if self.sounds.get_all()?.len() >= MAX_CUSTOM_SOUNDS {
            tracing::warn!(max = MAX_CUSTOM_SOUNDS, "custom sound library full");
            return Ok(None);
        }
        let sound = CustomSound::new(name, audio, mime_type, duration);
        self.sounds.save(&sound)?;
        tracing::info!(sound = %sound.id, name = %sound.name, "custom sound saved");
        Ok(Some(sound))
    }

    /// Delete a recording. When it was the instant-fart sound, classic
    /// takes its place.
    pub fn delete_custom_sound(&mut self, id: &str) -> Result<bool> {
        let removed = self.sounds.delete(id)?;
        if removed && self.state.selected_sound == id {
            self.state.selected_sound = CLASSIC.to_string();
            self.persist();
        }
        Ok(removed)
    }

    // ── Internal: tasks ──────────────────────────────────────────────

    fn run_task(&mut self, task: Task, now: Timestamp) {
        match task {
            Task::AlarmTick => {
                let effects = evaluate_alarms(
                    &mut self.state.alarms,
                    &mut self.snoozes,
                    self.active.is_some(),
                    self.state.settings.notifications_enabled,
                    &now,
                );
                self.apply(effects, &now);
                let next = now + Duration::seconds(self.engine.tick_interval_secs as i64);
                self.alarm_tick = Some(self.queue.schedule(next, Task::AlarmTick));
            }
            Task::RandomFart => {
                self.random_timer = None;
                let trial_ended = self.state.trial_ended();
                let effects = fire_random_fart(
                    &mut self.state.settings.random_farts,
                    trial_ended,
                    self.state.settings.notifications_enabled,
                    &now,
                    &mut self.rng,
                );
                self.apply(effects, &now);
            }
            Task::PlayerPlayed { duration_secs } => {
                self.player_timer = None;
                let Some(player) = self.active.as_mut() else {
                    return;
                };
                let cmd = player.on_played(duration_secs, &now, &mut self.rng);
                self.drive(cmd, &now);
            }
            Task::PlayerResume => {
                self.player_timer = None;
                let Some(player) = self.active.as_mut() else {
                    return;
                };
                let cmd = player.resume(&now, &mut self.rng);
                self.drive(cmd, &now);
            }
            Task::PlayerDisplay => {
                self.display_timer = None;
                let Some(player) = self.active.as_ref() else {
                    return;
                };
                self.events.push(Event::AlarmProgress {
                    alarm_id: player.alarm_id().to_string(),
                    elapsed_secs: player.elapsed(&now).num_seconds(),
                    remaining_secs: player.remaining_secs(&now),
                    at: now,
                });
                self.display_timer = Some(
                    self.queue
                        .schedule(now + Duration::seconds(1), Task::PlayerDisplay),
                );
            }
            Task::CountdownTick => {
                self.countdown_timer = None;
                match self.countdown.tick(&now) {
                    Some(event) => {
                        self.events.push(event);
                        self.countdown_completed(&now);
                    }
                    None => self.arm_countdown(),
                }
            }
            Task::CountdownRepeat => {
                self.repeat_timer = None;
                if self.repeat_plays_left == 0 {
                    return;
                }
                self.repeat_plays_left -= 1;
                self.play_countdown_sound(&now);
            }
            Task::FunCheck => {
                let fired = fun::check(
                    &mut self.state.settings.fun_notifications,
                    &self.state.stats,
                    &now,
                    &mut self.rng,
                );
                if let Some(notification) = fired {
                    self.notify(&notification);
                    self.events.push(Event::FunNotificationSent {
                        title: notification.title.clone(),
                        at: now,
                    });
                    self.persist();
                }
                self.fun_timer = Some(self.queue.schedule(now + fun::check_interval(), Task::FunCheck));
            }
        }
    }

    // ── Internal: effects ────────────────────────────────────────────

    fn apply(&mut self, effects: Vec<Effect>, now: &Timestamp) {
        for effect in effects {
            match effect {
                Effect::Activate { alarm, snoozed } => self.activate(alarm, snoozed, now),
                Effect::Notify(notification) => self.notify(&notification),
                Effect::PlaySound(id) => {
                    let duration = self.play(&id);
                    if duration > 0.0 {
                        tracing::info!(sound = %id, "random fart played");
                        self.events.push(Event::RandomFartPlayed {
                            sound: id,
                            at: *now,
                        });
                        self.record_fart(now);
                    } else {
                        tracing::warn!(sound = %id, "random fart failed to play");
                    }
                }
                Effect::ArmRandomFart { at } => {
                    if let Some(id) = self.random_timer.take() {
                        self.queue.cancel(id);
                    }
                    self.random_timer = Some(self.queue.schedule(at, Task::RandomFart));
                }
                Effect::CancelRandomFart => {
                    if let Some(id) = self.random_timer.take() {
                        self.queue.cancel(id);
                    }
                }
                Effect::Persist => self.persist(),
                Effect::Emit(event) => self.events.push(event),
            }
        }
    }

    fn rearm_random_farts(&mut self, now: &Timestamp) {
        let trial_ended = self.state.trial_ended();
        let effects = configure_random_fart(
            &mut self.state.settings.random_farts,
            trial_ended,
            now,
            &mut self.rng,
        );
        self.apply(effects, now);
    }

    // ── Internal: ringing ────────────────────────────────────────────

    fn activate(&mut self, alarm: Alarm, snoozed: bool, now: &Timestamp) {
        if let Some(current) = &self.active {
            tracing::warn!(
                ringing = %current.alarm_id(),
                requested = %alarm.id,
                "alarm slot occupied, activation dropped"
            );
            return;
        }
        let custom_ids = self.sounds.ids().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "custom sounds unavailable for alarm pool");
            Vec::new()
        });
        let mut player = ActiveAlarmPlayer::new(alarm, snoozed, &custom_ids, *now);
        let cmd = player.start();
        self.active = Some(player);
        self.display_timer = Some(
            self.queue
                .schedule(*now + Duration::seconds(1), Task::PlayerDisplay),
        );
        self.drive(cmd, now);
    }

    /// Carry out player commands until one leaves something to wait for.
    fn drive(&mut self, mut cmd: PlayerCommand, now: &Timestamp) {
        loop {
            match cmd {
                PlayerCommand::Play(id) => {
                    let duration = self.play(&id);
                    let Some(player) = self.active.as_mut() else {
                        return;
                    };
                    if duration > 0.0 {
                        self.events.push(Event::AlarmSoundPlayed {
                            alarm_id: player.alarm_id().to_string(),
                            sound: id,
                            duration_secs: duration,
                            at: *now,
                        });
                        self.player_timer = Some(
                            self.queue
                                .schedule(*now + secs(duration), Task::PlayerPlayed { duration_secs: duration }),
                        );
                        return;
                    }
                    cmd = player.on_played(0.0, now, &mut self.rng);
                }
                PlayerCommand::Wait(wait) => {
                    self.player_timer = Some(self.queue.schedule(*now + wait, Task::PlayerResume));
                    return;
                }
                PlayerCommand::Finish(reason) => {
                    self.finish_alarm(reason, now);
                    return;
                }
                PlayerCommand::AwaitInteraction => {
                    if let Some(player) = &self.active {
                        if player.state() == PlayerState::Blocked {
                            self.events.push(Event::AlarmBlocked {
                                alarm_id: player.alarm_id().to_string(),
                                at: *now,
                            });
                        }
                    }
                    return;
                }
            }
        }
    }

    /// Clear the active slot and everything scheduled for it.
    fn finish_alarm(&mut self, reason: StopReason, now: &Timestamp) {
        let Some(mut player) = self.active.take() else {
            return;
        };
        self.testing = false;
        player.request_stop(reason);
        for id in [self.player_timer.take(), self.display_timer.take()]
            .into_iter()
            .flatten()
        {
            self.queue.cancel(id);
        }
        self.playback.stop();
        tracing::info!(alarm = %player.alarm_id(), ?reason, "alarm stopped");
        self.events.push(Event::AlarmStopped {
            alarm_id: player.alarm_id().to_string(),
            reason,
            at: *now,
        });
    }

    // ── Internal: countdown ──────────────────────────────────────────

    fn arm_countdown(&mut self) {
        if let Some(id) = self.countdown_timer.take() {
            self.queue.cancel(id);
        }
        if let Some(deadline) = self.countdown.deadline() {
            self.countdown_timer = Some(self.queue.schedule(deadline, Task::CountdownTick));
        }
    }

    fn countdown_completed(&mut self, now: &Timestamp) {
        tracing::info!("countdown completed");
        self.repeat_plays_left = self.state.settings.repeat_mode.extra_plays();
        self.play_countdown_sound(now);
        if let Some(event) = self.countdown.reset(now) {
            self.events.push(event);
        }
    }

    fn play_countdown_sound(&mut self, now: &Timestamp) {
        let id = if self.state.settings.randomize {
            self.catalog.random_id(&mut self.rng).to_string()
        } else {
            self.countdown.config().sound.clone()
        };
        let duration = self.play(&id);
        if duration > 0.0 {
            self.events.push(Event::FartPlayed {
                sound: id,
                at: *now,
            });
            self.record_fart(now);
        } else {
            tracing::warn!(sound = %id, "countdown sound failed to play");
        }
        if self.repeat_plays_left > 0 {
            let next = *now + secs(duration.max(0.0)) + Duration::seconds(REPEAT_GAP_SECS);
            self.repeat_timer = Some(self.queue.schedule(next, Task::CountdownRepeat));
        }
    }

    fn cancel(&mut self, task: Task) {
        let slot = match task {
            Task::CountdownTick => &mut self.countdown_timer,
            Task::CountdownRepeat => {
                self.repeat_plays_left = 0;
                &mut self.repeat_timer
            }
            Task::AlarmTick => &mut self.alarm_tick,
            Task::RandomFart => &mut self.random_timer,
            Task::PlayerPlayed { .. } | Task::PlayerResume => &mut self.player_timer,
            Task::PlayerDisplay => &mut self.display_timer,
            Task::FunCheck => &mut self.fun_timer,
        };
        if let Some(id) = slot.take() {
            self.queue.cancel(id);
        }
    }

    // ── Internal: I/O ────────────────────────────────────────────────

    fn play(&mut self, id: &str) -> f64 {
        let sound = sound::resolve(id, &self.catalog, self.sounds.as_ref(), &mut self.rng);
        let volume = self.state.settings.clamped_volume();
        self.playback.play(&sound, volume)
    }

    fn notify(&mut self, notification: &Notification) {
        if let Err(e) = self.notifier.notify(notification) {
            tracing::warn!(title = %notification.title, error = %e, "notification not delivered");
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.state) {
            tracing::warn!(error = %e, "state not persisted");
        }
    }

    fn record_fart(&mut self, now: &Timestamp) {
        let record = stats::record_fart(&mut self.state.stats, self.state.is_premium, now);
        self.events.push(Event::FartRecorded {
            total_farts: self.state.stats.total_farts,
            current_streak: self.state.stats.current_streak,
            at: *now,
        });
        for achievement in record.newly_unlocked {
            tracing::info!(achievement = achievement.id(), "achievement unlocked");
            self.events.push(Event::AchievementUnlocked {
                achievement,
                at: *now,
            });
        }
        if record.trial_just_ended {
            tracing::info!(total = self.state.stats.total_farts, "free trial ended");
            self.events.push(Event::TrialEnded { at: *now });
        }
        self.persist();
    }
}
