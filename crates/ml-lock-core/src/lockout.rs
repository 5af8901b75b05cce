//! Failed-attempt lockout
//!
//! A failed submission moves the session into a fixed-length cooldown
//! during which no credential check is performed. The cooldown does not
//! grow with repeated failures.

use tracing::{info, warn};

use crate::credential::Verifier;

/// Default cooldown after a failed attempt, in seconds
pub const DEFAULT_COOLDOWN_SECS: u32 = 3;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Entry field attached, submissions are checked
    Accepting,
    /// Entry field detached for the remaining whole seconds
    Cooldown { remaining: u32 },
}

impl Phase {
    pub fn is_accepting(&self) -> bool {
        matches!(self, Phase::Accepting)
    }
}

/// Result of a submit transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Secret matched; the session is complete
    Unlocked,
    /// Secret did not match; a cooldown of this many seconds started
    Rejected { cooldown: u32 },
    /// Submission arrived during cooldown and was not checked
    Ignored,
}

/// Result of a one-second cooldown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still cooling down with this many seconds left
    Counting { remaining: u32 },
    /// Cooldown finished; the entry field must be reattached
    Released,
    /// No cooldown was active
    Idle,
}

/// Lockout state machine
///
/// `Accepting --submit(ok)--> Unlocked`, `Accepting --submit(bad)--> Cooldown(N)`,
/// `Cooldown(n) --tick--> Cooldown(n-1)`, `Cooldown(1) --tick--> Accepting`.
/// Submissions during cooldown are no-ops.
#[derive(Debug, Clone)]
pub struct LockoutMachine {
    phase: Phase,
    cooldown_secs: u32,
    failed_attempts: u32,
    unlocked: bool,
}

impl Default for LockoutMachine {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_SECS)
    }
}

impl LockoutMachine {
    /// Create a machine with a custom cooldown (clamped to at least one second)
    pub fn new(cooldown_secs: u32) -> Self {
        Self {
            phase: Phase::Accepting,
            cooldown_secs: cooldown_secs.max(1),
            failed_attempts: 0,
            unlocked: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn cooldown_secs(&self) -> u32 {
        self.cooldown_secs
    }

    /// Whether a successful submission has already been seen
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Submit a candidate secret
    ///
    /// The verifier is consulted only in the `Accepting` phase. An empty
    /// candidate is an ordinary failed attempt.
    pub fn submit<V: Verifier + ?Sized>(&mut self, candidate: &str, verifier: &V) -> SubmitOutcome {
        if self.unlocked {
            return SubmitOutcome::Ignored;
        }

        match self.phase {
            Phase::Cooldown { .. } => SubmitOutcome::Ignored,
            Phase::Accepting => {
                if verifier.verify(candidate) {
                    self.unlocked = true;
                    info!(
                        "Unlocked after {} failed attempt(s)",
                        self.failed_attempts
                    );
                    SubmitOutcome::Unlocked
                } else {
                    self.failed_attempts = self.failed_attempts.saturating_add(1);
                    self.phase = Phase::Cooldown {
                        remaining: self.cooldown_secs,
                    };
                    warn!(
                        "Incorrect password (attempt {}), cooling down for {}s",
                        self.failed_attempts, self.cooldown_secs
                    );
                    SubmitOutcome::Rejected {
                        cooldown: self.cooldown_secs,
                    }
                }
            }
        }
    }

    /// Advance the cooldown by one second
    pub fn tick(&mut self) -> TickOutcome {
        match self.phase {
            Phase::Accepting => TickOutcome::Idle,
            Phase::Cooldown { remaining } if remaining > 1 => {
                self.phase = Phase::Cooldown {
                    remaining: remaining - 1,
                };
                TickOutcome::Counting {
                    remaining: remaining - 1,
                }
            }
            Phase::Cooldown { .. } => {
                self.phase = Phase::Accepting;
                TickOutcome::Released
            }
        }
    }
}
