//! Playback gateway: the audio backend seen from the engine.

use std::collections::HashSet;

use super::SoundRef;

/// Platform audio backend.
///
/// `play` starts the sound (superseding any sound still playing) and
/// reports its length in seconds, or `0.0` when it could not be played
/// (missing asset, decode error, autoplay blocked). The engine schedules
/// its continuation after that length; it never waits inside `play`.
pub trait PlaybackGateway {
    fn play(&mut self, sound: &SoundRef, volume: f32) -> f64;

    /// Halt any in-flight sound. Idempotent.
    fn stop(&mut self);
}

/// In-memory gateway that records every request.
///
/// Useful for tests and headless hosts. Every sound "lasts"
/// `duration_secs`; labels listed in `failing` report `0.0`, and `blocked`
/// makes every request fail, like a platform autoplay block.
#[derive(Debug, Clone)]
pub struct RecordingPlayback {
    pub played: Vec<String>,
    pub stops: usize,
    pub duration_secs: f64,
    pub failing: HashSet<String>,
    pub blocked: bool,
}

impl Default for RecordingPlayback {
    fn default() -> Self {
        Self {
            played: Vec::new(),
            stops: 0,
            duration_secs: 2.0,
            failing: HashSet::new(),
            blocked: false,
        }
    }
}

impl RecordingPlayback {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            ..Self::default()
        }
    }
}

impl PlaybackGateway for RecordingPlayback {
    fn play(&mut self, sound: &SoundRef, _volume: f32) -> f64 {
        let label = sound.label().to_string();
        if self.blocked || self.failing.contains(&label) {
            return 0.0;
        }
        self.played.push(label);
        self.duration_secs
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

/// Shares one gateway between the host and a test.
impl<P: PlaybackGateway> PlaybackGateway for std::rc::Rc<std::cell::RefCell<P>> {
    fn play(&mut self, sound: &SoundRef, volume: f32) -> f64 {
        self.borrow_mut().play(sound, volume)
    }

    fn stop(&mut self) {
        self.borrow_mut().stop();
    }
}
