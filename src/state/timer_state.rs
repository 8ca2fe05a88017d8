//! Observable timer state exposed to displays

use serde::{Deserialize, Serialize};

use super::Mode;
use crate::utils::format_clock;

/// What a display renders: remaining time, running flag, mode and completed work sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub remaining_seconds: u64,
    pub is_running: bool,
    pub mode: Mode,
    pub completed_count: u64,
}

impl TimerState {
    /// Create an idle timer state
    pub fn idle(mode: Mode, remaining_seconds: u64, completed_count: u64) -> Self {
        Self {
            remaining_seconds,
            is_running: false,
            mode,
            completed_count,
        }
    }

    /// Remaining time as `MM:SS`
    pub fn display(&self) -> String {
        format_clock(self.remaining_seconds)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::idle(Mode::PRIMARY, 0, 0)
    }
}
