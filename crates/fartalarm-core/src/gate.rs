//! Trial/premium gate.
//!
//! The free trial ends once a non-premium user has produced
//! [`FREE_TRIAL_LIMIT`] farts. The gate only answers the question;
//! callers decide what to block.
//!
//! ## Consulted by
//!
//! - the instant-fart action
//! - arming the random-fart timer from configuration
//! - each random-fart occurrence when it fires
//!
//! An alarm that is already ringing is never interrupted by the gate.

use serde::{Deserialize, Serialize};

/// Lifetime farts allowed before the paywall.
pub const FREE_TRIAL_LIMIT: u64 = 50;

/// `!is_premium && total_farts >= FREE_TRIAL_LIMIT`.
pub fn trial_ended(is_premium: bool, total_farts: u64) -> bool {
    !is_premium && total_farts >= FREE_TRIAL_LIMIT
}

/// Derived trial state at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialStatus {
    pub is_premium: bool,
    pub total_farts: u64,
    pub trial_ended: bool,
    /// Free farts left; `None` for premium users.
    pub remaining: Option<u64>,
}

impl TrialStatus {
    pub fn new(is_premium: bool, total_farts: u64) -> Self {
        Self {
            is_premium,
            total_farts,
            trial_ended: trial_ended(is_premium, total_farts),
            remaining: (!is_premium).then(|| FREE_TRIAL_LIMIT.saturating_sub(total_farts)),
        }
    }

    pub fn allows_fart(&self) -> bool {
        !self.trial_ended
    }

    /// True when going from `before` to `self` crossed into "ended".
    pub fn just_ended(&self, before: &TrialStatus) -> bool {
        self.trial_ended && !before.trial_ended
    }
}
