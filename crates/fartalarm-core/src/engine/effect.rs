use crate::alarm::Alarm;
use crate::events::Event;
use crate::notify::Notification;
use crate::scheduler::Timestamp;

/// A side effect requested by an engine decision.
///
/// Engine functions only mutate the state they are handed and return
/// these; the host executes them in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Occupy the active-alarm slot and start ringing.
    Activate { alarm: Alarm, snoozed: bool },
    Notify(Notification),
    /// Play a random-fart sound and count it on success.
    PlaySound(String),
    /// Arm the one-shot random-fart timer, replacing any pending one.
    ArmRandomFart { at: Timestamp },
    CancelRandomFart,
    /// Write the whole app state back to the store.
    Persist,
    Emit(Event),
}

impl Effect {
    pub fn is_persist(&self) -> bool {
        matches!(self, Effect::Persist)
    }
}
