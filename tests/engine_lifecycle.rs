//! Engine behaviour across simulated process restarts over a real file store

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tempfile::TempDir;

use pomodoro_keeper::{
    state::Phase, Clock, Durations, FileStore, ManualClock, Mode, SessionSnapshot, SnapshotStore,
    TimerEngine,
};

const KEY: &str = "study-room";
const T0: i64 = 1_700_000_000_000;

struct Process {
    dir: TempDir,
    clock: Arc<ManualClock>,
    completions: Arc<AtomicUsize>,
}

impl Process {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            clock: Arc::new(ManualClock::new(T0)),
            completions: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn store(&self) -> FileStore {
        FileStore::new(self.dir.path())
    }

    /// A fresh engine over the same store, as after a page reload or restart
    fn boot(&self) -> TimerEngine {
        let completions = Arc::clone(&self.completions);
        TimerEngine::builder(KEY)
            .store(Arc::new(self.store()))
            .clock(self.clock.clone())
            .on_complete(move |_| {
                completions.fetch_add(1, Ordering::SeqCst);
            })
            .build()
    }

    fn stored(&self) -> SessionSnapshot {
        SessionSnapshot::from_json(&self.store().get(KEY).unwrap().unwrap()).unwrap()
    }

    fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }
}

#[test]
fn running_session_survives_restart() {
    let p = Process::new();
    p.boot().start();
    p.clock.advance_secs(300);

    let engine = p.boot();
    let state = engine.state();
    assert!(state.is_running);
    assert_eq!(state.remaining_seconds, 1200);

    p.clock.advance_secs(1200);
    assert_eq!(engine.poll(), Some(Mode::Work));
    assert_eq!(engine.state().completed_count, 1);
    assert_eq!(p.completions(), 1);
}

#[test]
fn deadline_passed_while_absent() {
    let p = Process::new();
    p.boot().start();
    p.clock.set(T0 + 1_500_000 + 10_000);

    let engine = p.boot();
    let state = engine.state();
    assert_eq!(state.remaining_seconds, 0);
    assert!(!state.is_running);
    assert_eq!(state.completed_count, 0);
    assert_eq!(p.completions(), 0);
    assert_eq!(p.stored().phase(), Phase::Idle);

    // repeated reloads never re-detect the completion
    for _ in 0..3 {
        let engine = p.boot();
        engine.poll();
        assert_eq!(engine.state().completed_count, 0);
    }
    assert_eq!(p.completions(), 0);
}

#[test]
fn reload_after_completion_does_not_resignal() {
    let p = Process::new();
    let engine = p.boot();
    engine.start();
    p.clock.advance_secs(1500);
    engine.poll();
    drop(engine);

    for _ in 0..3 {
        let engine = p.boot();
        assert_eq!(engine.poll(), None);
        assert_eq!(engine.state().completed_count, 1);
    }
    assert_eq!(p.completions(), 1);
}

#[test]
fn paused_session_survives_restart() {
    let p = Process::new();
    let engine = p.boot();
    engine.set_mode(Mode::LongBreak);
    engine.start();
    p.clock.advance_secs(100);
    engine.pause();
    drop(engine);

    p.clock.advance_secs(86_400);
    let engine = p.boot();
    let state = engine.state();
    assert_eq!(state.mode, Mode::LongBreak);
    assert_eq!(state.remaining_seconds, 800);
    assert!(!state.is_running);

    let resumed = engine.start();
    assert_eq!(resumed.remaining_seconds, 800);
    assert_eq!(p.stored().end_timestamp, Some(p.clock.now_ms() + 800_000));
}

#[test]
fn clear_removes_the_record() {
    let p = Process::new();
    let engine = p.boot();
    engine.start();
    p.clock.advance_secs(1500);
    engine.poll();
    engine.clear();

    assert!(p.store().get(KEY).unwrap().is_none());
    let engine = p.boot();
    assert_eq!(engine.state().completed_count, 0);
    assert_eq!(engine.state().remaining_seconds, 1500);
    assert_eq!(p.stored(), SessionSnapshot::fresh(&Durations::default()));
}

#[test]
fn corrupted_file_is_replaced() {
    let p = Process::new();
    p.store().set(KEY, "\u{0}garbage").unwrap();

    let engine = p.boot();
    assert_eq!(engine.state().remaining_seconds, 1500);
    assert_eq!(p.stored(), SessionSnapshot::fresh(&Durations::default()));
}

#[test]
fn legacy_record_is_upgraded_on_write() {
    let p = Process::new();
    p.store()
        .set(
            KEY,
            r#"{"mode":"pomodoro","endTimestamp":null,"pausedAt":null,"remainingWhenPaused":1500,"isRunning":false,"pomodoroCount":4}"#,
        )
        .unwrap();

    let engine = p.boot();
    assert_eq!(engine.state().completed_count, 4);

    engine.start();
    let raw = p.store().get(KEY).unwrap().unwrap();
    assert!(raw.contains("\"completedCount\":4"));
    assert!(raw.contains("\"mode\":\"work\""));
}

#[test]
fn changed_durations_clamp_stale_record() {
    let p = Process::new();
    let engine = p.boot();
    engine.start();
    p.clock.advance_secs(100);
    engine.pause();
    drop(engine);

    let engine = TimerEngine::builder(KEY)
        .store(Arc::new(p.store()))
        .clock(p.clock.clone())
        .durations(Durations::new(600, 300, 900))
        .build();
    assert_eq!(engine.state().remaining_seconds, 600);
    assert_eq!(p.stored().remaining_when_paused, 600);
}
