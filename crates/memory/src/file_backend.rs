//! Turn state loaded from a JSON file.
//!
//! The file holds one object per scope:
//!
//! ```json
//! {
//!   "conversation": { "history": [{ "role": "user", "content": "Hi" }] },
//!   "temp": { "input": "What's next?" }
//! }
//! ```

use crate::{MemoryError, TurnState};
use std::path::Path;
use tracing::debug;

/// Load turn state from a JSON file.
pub fn load_state(path: &Path) -> Result<TurnState, MemoryError> {
    let content = std::fs::read_to_string(path).map_err(|e| MemoryError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| MemoryError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let state = TurnState::from_value(value)?;
    debug!(path = %path.display(), "Loaded turn state");
    Ok(state)
}

/// Write turn state to a JSON file (pretty-printed).
pub fn save_state(state: &TurnState, path: &Path) -> Result<(), MemoryError> {
    let json = serde_json::to_string_pretty(&state.to_value()).map_err(|e| MemoryError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    std::fs::write(path, json).map_err(|e| MemoryError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptweave_core::Memory;
    use serde_json::json;

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(
            &path,
            r#"{"temp": {"input": "hello"}, "conversation": {"history": []}}"#,
        )
        .unwrap();

        let state = load_state(&path).unwrap();
        assert_eq!(state.get_value("temp.input"), Some(json!("hello")));
        assert_eq!(state.get_value("conversation.history"), Some(json!([])));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = TurnState::new();
        state.set_value("user.name", json!("Ada"));
        save_state(&state, &path).unwrap();

        let loaded = load_state(&path).unwrap();
        assert_eq!(loaded.get_value("user.name"), Some(json!("Ada")));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_state(Path::new("/nonexistent/state.json")).unwrap_err();
        assert!(matches!(err, MemoryError::Read { .. }));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_state(&path).unwrap_err();
        assert!(matches!(err, MemoryError::Parse { .. }));
    }
}
