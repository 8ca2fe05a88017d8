//! State management module
//! 
//! The timer engine, its persisted snapshot, the observable view and the host state
//! that wraps them for the HTTP surface.

pub mod app_state;
pub mod engine;
pub mod mode;
pub mod snapshot;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, Completion, CompletionLog};
pub use engine::{CompletionHook, EngineBuilder, TimerEngine};
pub use mode::{Durations, Mode, ModeParseError};
pub use snapshot::{Phase, SessionSnapshot, SnapshotError};
pub use timer_state::TimerState;
