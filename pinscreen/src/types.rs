//! Shared value types for PIN entry.
//!
//! These types flow between the keyboard, the indicator and the screen
//! coordinator. None of them carry PIN contents except [`KeyPress::Symbol`],
//! whose `Debug` output is redacted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Layout token that denotes the backspace action slot.
pub const BACK_TOKEN: &str = "back";

/// A single key press delivered from the keyboard to the coordinator.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyPress {
    /// A symbol to append to the PIN (usually one digit).
    Symbol(String),
    /// Remove the last entered symbol.
    Back,
}

impl KeyPress {
    /// Convenience constructor for a digit key.
    pub fn digit(d: u8) -> Self {
        Self::Symbol(d.to_string())
    }

    /// Returns `true` for the backspace press.
    pub fn is_back(&self) -> bool {
        matches!(self, Self::Back)
    }
}

impl fmt::Debug for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(_) => f.write_str("Symbol(<redacted>)"),
            Self::Back => f.write_str("Back"),
        }
    }
}

/// Phase of the PIN entry state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenPhase {
    /// Fewer than `max_length` symbols entered; keyboard enabled.
    Entering,
    /// Buffer is full; keyboard enabled (further symbols are ignored).
    Complete,
    /// An error was reported; keyboard disabled until the shake settles.
    Locked,
}

impl fmt::Display for ScreenPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Entering => "entering",
            Self::Complete => "complete",
            Self::Locked => "locked",
        };
        f.write_str(s)
    }
}

/// How a shake animation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettleOutcome {
    /// The animation came to rest and its callback ran.
    Settled,
    /// A newer shake restarted the animation before this one settled.
    Superseded,
    /// The indicator was unmounted (or the shake cancelled) before settling.
    Cancelled,
}

/// What happens to the entered PIN once a failed-attempt shake settles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetPolicy {
    /// Wipe the buffer when the lockout ends.
    #[default]
    ClearOnSettle,
    /// Leave the buffer untouched; the owner clears it explicitly.
    Keep,
}

impl ResetPolicy {
    /// Returns the configuration spelling of this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClearOnSettle => "clear-on-settle",
            Self::Keep => "keep",
        }
    }
}

impl fmt::Display for ResetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResetPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clear-on-settle" | "clear_on_settle" | "clear" => Ok(Self::ClearOnSettle),
            "keep" => Ok(Self::Keep),
            other => Err(format!(
                "expected 'clear-on-settle' or 'keep', got '{other}'"
            )),
        }
    }
}
