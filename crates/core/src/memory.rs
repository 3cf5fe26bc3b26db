//! Memory trait: read access to conversation and turn variables.
//!
//! Sections read variables such as `conversation.history` or `temp.input`
//! while rendering. The layout engine only ever reads; writing is the
//! business of whatever owns the state (see `promptweave-memory`).

use serde_json::Value;

/// A namespaced key-value store consulted at render time.
pub trait Memory: Send + Sync {
    /// Look up a variable by path (`"scope.name"`; a bare name means the
    /// `temp` scope). Returns `None` when the variable is not set.
    fn get_value(&self, path: &str) -> Option<Value>;

    /// Whether a variable is set.
    fn has_value(&self, path: &str) -> bool {
        self.get_value(path).is_some()
    }
}

/// Split a variable path into `(scope, name)`.
///
/// A path without a dot addresses the `temp` scope; everything after the
/// first dot is the name.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.split_once('.') {
        Some((scope, name)) => (scope, name),
        None => ("temp", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_path_splits_on_first_dot() {
        assert_eq!(split_path("conversation.history"), ("conversation", "history"));
        assert_eq!(split_path("user.profile.name"), ("user", "profile.name"));
    }

    #[test]
    fn bare_name_is_temp_scope() {
        assert_eq!(split_path("input"), ("temp", "input"));
    }
}
