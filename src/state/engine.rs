//! The timer engine: a persistent, wall-clock driven countdown state machine
//!
//! Remaining time is always derived from the stored deadline and the current clock
//! reading, never by counting ticks, so a suspended or throttled host cannot make the
//! timer drift. Every mutation is written to the store before the operation returns.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{
    snapshot::{deadline_after, remaining_until, Phase},
    Durations, Mode, SessionSnapshot, TimerState,
};
use crate::{
    store::{MemoryStore, SnapshotStore},
    utils::{Clock, SystemClock},
};

/// One-shot notification that a running session reached zero
pub type CompletionHook = Box<dyn Fn(Mode) + Send + Sync>;

/// Configures and constructs a [`TimerEngine`]
pub struct EngineBuilder {
    storage_key: String,
    durations: Durations,
    store: Option<Arc<dyn SnapshotStore>>,
    clock: Option<Arc<dyn Clock>>,
    on_complete: Option<CompletionHook>,
    credit_missed_completions: bool,
}

impl EngineBuilder {
    fn new(storage_key: impl Into<String>) -> Self {
        Self {
            storage_key: storage_key.into(),
            durations: Durations::default(),
            store: None,
            clock: None,
            on_complete: None,
            credit_missed_completions: false,
        }
    }

    /// Per-mode durations; anything above [`Durations::MAX_SECONDS`] is capped
    pub fn durations(mut self, durations: Durations) -> Self {
        self.durations = durations.clamped();
        self
    }

    pub fn store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: Fn(Mode) + Send + Sync + 'static,
    {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// Count a work session whose deadline passed while no engine was running.
    /// Off by default; the completion hook is never replayed either way.
    pub fn credit_missed_completions(mut self, credit: bool) -> Self {
        self.credit_missed_completions = credit;
        self
    }

    /// Build the engine and reconcile it with whatever the store holds for the key
    pub fn build(self) -> TimerEngine {
        let store = self.store.unwrap_or_else(|| {
            debug!("No store configured, session will not outlive the process");
            Arc::new(MemoryStore::new())
        });
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let fresh = SessionSnapshot::fresh(&self.durations);
        let (state_tx, _) = watch::channel(TimerState::idle(
            fresh.mode,
            fresh.remaining_when_paused,
            fresh.completed_count,
        ));

        let engine = TimerEngine {
            storage_key: self.storage_key,
            durations: self.durations,
            store,
            clock,
            on_complete: self.on_complete,
            credit_missed_completions: self.credit_missed_completions,
            session: Mutex::new(fresh),
            state_tx,
        };
        engine.restore();
        engine
    }
}

/// Countdown engine bound to one storage key
pub struct TimerEngine {
    storage_key: String,
    durations: Durations,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    on_complete: Option<CompletionHook>,
    credit_missed_completions: bool,
    session: Mutex<SessionSnapshot>,
    state_tx: watch::Sender<TimerState>,
}

impl TimerEngine {
    pub fn builder(storage_key: impl Into<String>) -> EngineBuilder {
        EngineBuilder::new(storage_key)
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn durations(&self) -> &Durations {
        &self.durations
    }

    /// Latest observable state
    pub fn state(&self) -> TimerState {
        *self.state_tx.borrow()
    }

    /// Receive every change of the observable state
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state_tx.subscribe()
    }

    /// Copy of the in-memory session record
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session().clone()
    }

    /// Begin or resume the countdown. No-op while already running.
    pub fn start(&self) -> TimerState {
        let mut session = self.session();
        if session.is_running {
            debug!("start ignored, timer already running");
            return self.state();
        }

        let duration = self.durations.for_mode(session.mode);
        let remaining = match session.remaining_when_paused {
            0 => duration,
            r if r > duration => duration,
            r => r,
        };
        let now = self.clock.now_ms();

        session.end_timestamp = Some(deadline_after(now, remaining));
        session.paused_at = None;
        session.remaining_when_paused = remaining;
        session.is_running = true;

        info!("Starting {} timer with {}s remaining", session.mode, remaining);
        self.commit(&session, now)
    }

    /// Freeze the countdown at its current remaining time. No-op unless running.
    pub fn pause(&self) -> TimerState {
        let mut session = self.session();
        if !session.is_running {
            debug!("pause ignored, timer not running");
            return self.state();
        }

        let now = self.clock.now_ms();
        let remaining = session.remaining_at(now, &self.durations);

        session.end_timestamp = None;
        session.paused_at = Some(now);
        session.remaining_when_paused = remaining;
        session.is_running = false;

        info!("Pausing {} timer with {}s remaining", session.mode, remaining);
        self.commit(&session, now)
    }

    /// Return the current mode to its full duration, idle
    pub fn reset(&self) -> TimerState {
        let mut session = self.session();
        let duration = self.durations.for_mode(session.mode);
        *session = SessionSnapshot::idle(session.mode, duration, session.completed_count);

        info!("Resetting {} timer to {}s", session.mode, duration);
        self.commit(&session, self.clock.now_ms())
    }

    /// Switch to `mode` at its full duration, idle
    pub fn set_mode(&self, mode: Mode) -> TimerState {
        let mut session = self.session();
        let duration = self.durations.for_mode(mode);
        *session = SessionSnapshot::idle(mode, duration, session.completed_count);

        info!("Switching to {} mode ({}s)", mode, duration);
        self.commit(&session, self.clock.now_ms())
    }

    /// Forget the persisted session and return to construction defaults
    pub fn clear(&self) -> TimerState {
        let mut session = self.session();
        if let Err(e) = self.store.delete(&self.storage_key) {
            warn!("Failed to delete session {}: {}", self.storage_key, e);
        }
        *session = SessionSnapshot::fresh(&self.durations);

        info!("Cleared session {}", self.storage_key);
        self.publish(&session, self.clock.now_ms())
    }

    /// Recompute remaining time from the deadline and complete the session if it hit zero.
    ///
    /// Returns the mode that finished when this call performed the completion. The
    /// completed record is persisted before the hook runs, so a reload during the hook
    /// sees an idle session and cannot signal the same completion again.
    pub fn poll(&self) -> Option<Mode> {
        let now = self.clock.now_ms();
        let mut session = self.session();

        let Phase::Running { end_ms } = session.phase() else {
            return None;
        };

        if remaining_until(end_ms, now) > 0 {
            self.publish(&session, now);
            return None;
        }

        let finished = session.mode;
        let completed_count = if finished.is_primary() {
            session.completed_count + 1
        } else {
            session.completed_count
        };
        *session = SessionSnapshot::idle(finished, 0, completed_count);
        self.commit(&session, now);
        drop(session);

        info!("{} session complete (completed work sessions: {})", finished, completed_count);
        if let Some(hook) = &self.on_complete {
            hook(finished);
        }
        Some(finished)
    }

    /// Load the stored record for the key and correct it for time spent absent
    fn restore(&self) {
        let now = self.clock.now_ms();
        let mut session = self.session();

        let raw = match self.store.get(&self.storage_key) {
            Ok(raw) => raw,
            Err(e) => {
                // leave the stored record alone, it may only be temporarily unreadable
                warn!("Failed to read session {}: {}, starting fresh", self.storage_key, e);
                self.publish(&session, now);
                return;
            }
        };

        let Some(raw) = raw else {
            debug!("No stored session for {}, creating one", self.storage_key);
            self.commit(&session, now);
            return;
        };

        let mut restored = match SessionSnapshot::from_json(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Discarding stored session {}: {}", self.storage_key, e);
                if let Err(e) = self.store.delete(&self.storage_key) {
                    warn!("Failed to delete session {}: {}", self.storage_key, e);
                }
                self.commit(&session, now);
                return;
            }
        };

        let mut dirty = restored.normalize(&self.durations);
        if dirty {
            warn!("Stored session {} was inconsistent, repaired it", self.storage_key);
        }
        if restored.clamp_deadline(now, &self.durations) {
            warn!(
                "Stored deadline for {} lies beyond a full {} session, pulled it back",
                self.storage_key, restored.mode
            );
            dirty = true;
        }

        match restored.phase() {
            Phase::Running { end_ms } if remaining_until(end_ms, now) > 0 => {
                info!(
                    "Resuming {} timer with {}s remaining",
                    restored.mode,
                    remaining_until(end_ms, now)
                );
            }
            Phase::Running { end_ms } => {
                let mut completed_count = restored.completed_count;
                if self.credit_missed_completions && restored.mode.is_primary() {
                    completed_count += 1;
                }
                info!(
                    "{} session ended {}ms ago while no engine was running",
                    restored.mode,
                    now.saturating_sub(end_ms)
                );
                restored = SessionSnapshot::idle(restored.mode, 0, completed_count);
                dirty = true;
            }
            Phase::Paused { .. } => {
                debug!("Restoring paused {} timer", restored.mode);
            }
            Phase::Idle => {
                debug!("Restoring idle {} timer", restored.mode);
            }
        }

        *session = restored;
        if dirty {
            self.commit(&session, now);
        } else {
            self.publish(&session, now);
        }
    }

    /// Persist then publish
    fn commit(&self, snapshot: &SessionSnapshot, now: i64) -> TimerState {
        self.persist(snapshot);
        self.publish(snapshot, now)
    }

    fn persist(&self, snapshot: &SessionSnapshot) {
        let result = snapshot
            .to_json()
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.store
                    .set(&self.storage_key, &json)
                    .map_err(|e| e.to_string())
            });

        if let Err(e) = result {
            warn!(
                "Failed to save session {}: {}, state may not survive a reload",
                self.storage_key, e
            );
        }
    }

    fn publish(&self, snapshot: &SessionSnapshot, now: i64) -> TimerState {
        let next = TimerState {
            remaining_seconds: snapshot.remaining_at(now, &self.durations),
            is_running: snapshot.is_running,
            mode: snapshot.mode,
            completed_count: snapshot.completed_count,
        };

        self.state_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        next
    }

    fn session(&self) -> MutexGuard<'_, SessionSnapshot> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("storage_key", &self.storage_key)
            .field("durations", &self.durations)
            .field("state", &self.state())
            .field("has_on_complete", &self.on_complete.is_some())
            .finish()
    }
}
