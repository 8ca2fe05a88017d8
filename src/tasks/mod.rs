//! Background tasks module
//! 
//! Tasks that run alongside the HTTP server.

pub mod ticker;

// Re-export main types
pub use ticker::{Ticker, DEFAULT_TICK};
