//! Empty memory: every lookup misses.

use promptweave_core::memory::Memory;
use serde_json::Value;

/// A memory with no variables. Useful when a prompt needs no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyMemory;

impl Memory for EmptyMemory {
    fn get_value(&self, _path: &str) -> Option<Value> {
        None
    }
}
