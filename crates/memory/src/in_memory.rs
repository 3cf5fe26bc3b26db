//! In-memory turn state: scoped variables for a single turn.

use crate::MemoryError;
use promptweave_core::memory::{Memory, split_path};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Scoped variables (`conversation`, `user`, `temp`, ...) held in memory.
///
/// Paths are `"scope.name"`; a bare name lives in the `temp` scope. When a
/// name is not stored verbatim, dotted segments walk into nested objects, so
/// `user.profile.name` finds `{"profile": {"name": ...}}` in `user`.
#[derive(Debug, Default)]
pub struct TurnState {
    scopes: RwLock<HashMap<String, Map<String, Value>>>,
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build state from a JSON object of scopes, each an object of variables.
    pub fn from_value(value: Value) -> Result<Self, MemoryError> {
        let Value::Object(root) = value else {
            return Err(MemoryError::InvalidState(
                "state must be a JSON object of scopes".into(),
            ));
        };

        let mut scopes = HashMap::new();
        for (scope, vars) in root {
            match vars {
                Value::Object(vars) => {
                    scopes.insert(scope, vars);
                }
                other => {
                    return Err(MemoryError::InvalidState(format!(
                        "scope '{scope}' must be an object, found {}",
                        type_name(&other)
                    )));
                }
            }
        }

        Ok(Self {
            scopes: RwLock::new(scopes),
        })
    }

    /// Snapshot the whole state as a JSON object.
    pub fn to_value(&self) -> Value {
        let scopes = self.read();
        Value::Object(
            scopes
                .iter()
                .map(|(scope, vars)| (scope.clone(), Value::Object(vars.clone())))
                .collect(),
        )
    }

    /// Set a variable, replacing any previous value.
    pub fn set_value(&self, path: &str, value: Value) {
        let (scope, name) = split_path(path);
        self.write()
            .entry(scope.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }

    /// Remove a variable. Returns whether it existed.
    pub fn delete_value(&self, path: &str) -> bool {
        let (scope, name) = split_path(path);
        self.write()
            .get_mut(scope)
            .is_some_and(|vars| vars.remove(name).is_some())
    }

    /// Drop every variable in a scope (e.g. `temp` at the end of a turn).
    pub fn clear_scope(&self, scope: &str) {
        self.write().remove(scope);
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Map<String, Value>>> {
        self.scopes.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Map<String, Value>>> {
        self.scopes.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Memory for TurnState {
    fn get_value(&self, path: &str) -> Option<Value> {
        let (scope, name) = split_path(path);
        let scopes = self.read();
        let vars = scopes.get(scope)?;
        if let Some(value) = vars.get(name) {
            return Some(value.clone());
        }

        let mut segments = name.split('.');
        let mut current = vars.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
