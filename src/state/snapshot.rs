//! The persisted session record and its JSON codec
//!
//! A snapshot is the only thing written to the store. Exactly one of three phases holds
//! for a well-formed record: running (`end_timestamp` set), paused (`paused_at` set) or
//! idle (both unset). `remaining_when_paused` is authoritative whenever the timer is not
//! running.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Durations, Mode};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("malformed session record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Which of the mutually exclusive phases a snapshot is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running { end_ms: i64 },
    Paused { at_ms: i64 },
    Idle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub mode: Mode,
    /// Wall-clock deadline in epoch milliseconds, set only while running
    pub end_timestamp: Option<i64>,
    /// Wall-clock instant of the last pause in epoch milliseconds
    pub paused_at: Option<i64>,
    pub remaining_when_paused: u64,
    pub is_running: bool,
    #[serde(alias = "pomodoroCount")]
    pub completed_count: u64,
}

impl SessionSnapshot {
    /// Idle snapshot at the full duration of the primary mode
    pub fn fresh(durations: &Durations) -> Self {
        Self::idle(Mode::PRIMARY, durations.for_mode(Mode::PRIMARY), 0)
    }

    pub fn idle(mode: Mode, remaining: u64, completed_count: u64) -> Self {
        Self {
            mode,
            end_timestamp: None,
            paused_at: None,
            remaining_when_paused: remaining,
            is_running: false,
            completed_count,
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.end_timestamp, self.paused_at) {
            (Some(end_ms), _) => Phase::Running { end_ms },
            (None, Some(at_ms)) => Phase::Paused { at_ms },
            (None, None) => Phase::Idle,
        }
    }

    /// Seconds left at `now_ms`, recomputed from the deadline when running
    pub fn remaining_at(&self, now_ms: i64, durations: &Durations) -> u64 {
        match self.phase() {
            Phase::Running { end_ms } => {
                remaining_until(end_ms, now_ms).min(durations.for_mode(self.mode))
            }
            Phase::Paused { .. } | Phase::Idle => self.remaining_when_paused,
        }
    }

    /// Repairs records that break the phase invariants. Returns true if anything changed.
    pub fn normalize(&mut self, durations: &Durations) -> bool {
        let before = self.clone();

        if self.end_timestamp.is_some() {
            self.paused_at = None;
        }
        self.is_running = self.end_timestamp.is_some();
        self.remaining_when_paused = self
            .remaining_when_paused
            .min(durations.for_mode(self.mode));

        *self != before
    }

    /// Pull a running deadline back to at most one full duration after `now_ms`.
    /// Returns true if it moved.
    pub fn clamp_deadline(&mut self, now_ms: i64, durations: &Durations) -> bool {
        let latest = deadline_after(now_ms, durations.for_mode(self.mode));
        match self.end_timestamp {
            Some(end_ms) if end_ms > latest => {
                self.end_timestamp = Some(latest);
                true
            }
            _ => false,
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Deadline `secs` seconds after `now_ms`, saturating at the end of representable time
pub fn deadline_after(now_ms: i64, secs: u64) -> i64 {
    let span_ms = i64::try_from(secs)
        .ok()
        .and_then(|s| s.checked_mul(1000))
        .unwrap_or(i64::MAX);
    now_ms.saturating_add(span_ms)
}

/// Whole seconds from `now_ms` until `end_ms`, rounded up and never negative
pub fn remaining_until(end_ms: i64, now_ms: i64) -> u64 {
    let diff = end_ms.saturating_sub(now_ms);
    if diff <= 0 {
        0
    } else {
        (diff as u64).div_ceil(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_rounds_up() {
        assert_eq!(remaining_until(10_000, 0), 10);
        assert_eq!(remaining_until(10_000, 1), 10);
        assert_eq!(remaining_until(10_000, 9_001), 1);
        assert_eq!(remaining_until(10_000, 10_000), 0);
        assert_eq!(remaining_until(10_000, 20_000), 0);
    }

    #[test]
    fn test_deadline_after_saturates() {
        assert_eq!(deadline_after(1_000, 5), 6_000);
        assert_eq!(deadline_after(1_000, u64::MAX), i64::MAX);
        assert_eq!(deadline_after(1_000, 10_000_000_000_000_000), i64::MAX);
        assert_eq!(deadline_after(i64::MAX - 10, 1), i64::MAX);
    }

    #[test]
    fn test_clamp_deadline_after_clock_skew() {
        let durations = Durations::new(60, 10, 20);
        let mut snapshot = SessionSnapshot::fresh(&durations);
        snapshot.end_timestamp = Some(1_000_000);
        snapshot.is_running = true;

        assert!(snapshot.clamp_deadline(0, &durations));
        assert_eq!(snapshot.end_timestamp, Some(60_000));
        assert!(!snapshot.clamp_deadline(0, &durations));
        assert!(!snapshot.clamp_deadline(30_000, &durations));
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let snapshot = SessionSnapshot {
            mode: Mode::LongBreak,
            end_timestamp: Some(1_700_000_123_456),
            paused_at: None,
            remaining_when_paused: 640,
            is_running: true,
            completed_count: 7,
        };

        let json = snapshot.to_json().unwrap();
        assert_eq!(SessionSnapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn test_wire_field_names() {
        let json = SessionSnapshot::fresh(&Durations::default()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["mode"], "work");
        assert!(value["endTimestamp"].is_null());
        assert!(value["pausedAt"].is_null());
        assert_eq!(value["remainingWhenPaused"], 1500);
        assert_eq!(value["isRunning"], false);
        assert_eq!(value["completedCount"], 0);
    }

    #[test]
    fn test_reads_legacy_record() {
        let raw = r#"{"mode":"pomodoro","endTimestamp":null,"pausedAt":1700000000000,
            "remainingWhenPaused":420,"isRunning":false,"pomodoroCount":3}"#;
        let snapshot = SessionSnapshot::from_json(raw).unwrap();

        assert_eq!(snapshot.mode, Mode::Work);
        assert_eq!(snapshot.completed_count, 3);
        assert_eq!(snapshot.phase(), Phase::Paused { at_ms: 1_700_000_000_000 });
    }

    #[test]
    fn test_malformed_record_is_rejected() {
        assert!(SessionSnapshot::from_json("{not json").is_err());
        assert!(SessionSnapshot::from_json(r#"{"mode":"nap"}"#).is_err());
    }

    #[test]
    fn test_normalize_repairs_phase_flags() {
        let durations = Durations::default();
        let mut snapshot = SessionSnapshot {
            mode: Mode::ShortBreak,
            end_timestamp: Some(5_000),
            paused_at: Some(1_000),
            remaining_when_paused: 10_000,
            is_running: false,
            completed_count: 0,
        };

        assert!(snapshot.normalize(&durations));
        assert_eq!(snapshot.paused_at, None);
        assert!(snapshot.is_running);
        assert_eq!(snapshot.remaining_when_paused, 300);
        assert!(!snapshot.normalize(&durations));
    }

    #[test]
    fn test_running_remaining_is_clamped_to_duration() {
        let durations = Durations::new(60, 10, 20);
        let mut snapshot = SessionSnapshot::fresh(&durations);
        snapshot.end_timestamp = Some(500_000);
        snapshot.is_running = true;

        // clock went backwards past the start instant
        assert_eq!(snapshot.remaining_at(0, &durations), 60);
        assert_eq!(snapshot.remaining_at(470_500, &durations), 30);
    }
}
