//! Pomodoro Keeper - A drift-resistant, persistent Pomodoro timer
//! 
//! The core is [`TimerEngine`], a countdown state machine that derives remaining time
//! from a stored wall-clock deadline, survives restarts through a [`SnapshotStore`], and
//! signals each completion exactly once. The binary wraps it in a small HTTP server.

pub mod config;
pub mod state;
pub mod store;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, Durations, Mode, SessionSnapshot, TimerEngine, TimerState};
pub use store::{FileStore, MemoryStore, SnapshotStore, StoreError};
pub use tasks::Ticker;
pub use api::create_router;
pub use utils::{shutdown_signal, Clock, ManualClock, SystemClock};
