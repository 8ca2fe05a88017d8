//! Host application state wrapping the timer engine

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Mode, TimerEngine, TimerState};

/// A finished session as seen by the completion hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub mode: Mode,
    pub at: DateTime<Utc>,
}

/// Shared record of the latest completion, written from the engine's hook
#[derive(Debug, Clone, Default)]
pub struct CompletionLog {
    last: Arc<Mutex<Option<Completion>>>,
}

impl CompletionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, mode: Mode) {
        info!("Timer finished: {} session complete", mode);
        if let Ok(mut last) = self.last.lock() {
            *last = Some(Completion { mode, at: Utc::now() });
        }
    }

    pub fn last(&self) -> Option<Completion> {
        self.last.lock().ok().and_then(|last| *last)
    }
}

/// State shared by the HTTP handlers
#[derive(Debug)]
pub struct AppState {
    pub engine: Arc<TimerEngine>,
    pub completions: CompletionLog,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    pub fn new(engine: Arc<TimerEngine>, completions: CompletionLog, port: u16, host: String) -> Self {
        Self {
            engine,
            completions,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Run a control operation on the engine and remember it as the last action
    pub fn control<F>(&self, action: &str, op: F) -> TimerState
    where
        F: FnOnce(&TimerEngine) -> TimerState,
    {
        let state = op(self.engine.as_ref());

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }

        state
    }

    pub fn start(&self) -> TimerState {
        self.control("start", TimerEngine::start)
    }

    pub fn pause(&self) -> TimerState {
        self.control("pause", TimerEngine::pause)
    }

    pub fn reset(&self) -> TimerState {
        self.control("reset", TimerEngine::reset)
    }

    pub fn set_mode(&self, mode: Mode) -> TimerState {
        self.control(&format!("mode:{}", mode), |engine| engine.set_mode(mode))
    }

    pub fn clear(&self) -> TimerState {
        self.control("clear", TimerEngine::clear)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
