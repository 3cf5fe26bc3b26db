//! Memory implementations for promptweave.

pub mod file_backend;
pub mod in_memory;
pub mod noop;

pub use file_backend::{load_state, save_state};
pub use in_memory::TurnState;
pub use noop::EmptyMemory;

use std::path::PathBuf;

/// Errors raised while loading or saving turn state.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Failed to read state file at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write state file at {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Failed to parse state file at {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),
}
