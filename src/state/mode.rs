//! Session modes and their configured durations

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of session the timer is counting down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Focus session; the only mode that counts toward `completed_count`
    #[default]
    #[serde(alias = "pomodoro")]
    Work,
    ShortBreak,
    LongBreak,
}

impl Mode {
    /// The mode whose completions are counted
    pub const PRIMARY: Mode = Mode::Work;

    pub const ALL: [Mode; 3] = [Mode::Work, Mode::ShortBreak, Mode::LongBreak];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Work => "work",
            Mode::ShortBreak => "shortBreak",
            Mode::LongBreak => "longBreak",
        }
    }

    pub fn is_primary(&self) -> bool {
        *self == Self::PRIMARY
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown mode: {0}")]
pub struct ModeParseError(String);

impl FromStr for Mode {
    type Err = ModeParseError;

    /// Accepts the canonical names, their kebab/snake spellings and the legacy `pomodoro`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "work" | "pomodoro" => Ok(Mode::Work),
            "shortbreak" => Ok(Mode::ShortBreak),
            "longbreak" => Ok(Mode::LongBreak),
            _ => Err(ModeParseError(s.to_string())),
        }
    }
}

/// Per-mode durations in whole seconds, fixed for the lifetime of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Durations {
    pub work: u64,
    pub short_break: u64,
    pub long_break: u64,
}

impl Durations {
    pub const DEFAULT_WORK: u64 = 25 * 60;
    pub const DEFAULT_SHORT_BREAK: u64 = 5 * 60;
    pub const DEFAULT_LONG_BREAK: u64 = 15 * 60;
    /// Longest duration whose deadline still fits in epoch milliseconds
    pub const MAX_SECONDS: u64 = (i64::MAX / 1000) as u64;

    pub fn new(work: u64, short_break: u64, long_break: u64) -> Self {
        Self {
            work,
            short_break,
            long_break,
        }
    }

    /// Configured duration for `mode`
    pub fn for_mode(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Work => self.work,
            Mode::ShortBreak => self.short_break,
            Mode::LongBreak => self.long_break,
        }
    }

    /// Copy with every duration capped at [`Durations::MAX_SECONDS`]
    pub fn clamped(&self) -> Self {
        Self::new(
            self.work.min(Self::MAX_SECONDS),
            self.short_break.min(Self::MAX_SECONDS),
            self.long_break.min(Self::MAX_SECONDS),
        )
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_WORK,
            Self::DEFAULT_SHORT_BREAK,
            Self::DEFAULT_LONG_BREAK,
        )
    }
}
