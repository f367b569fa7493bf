// rust/timeline-core/src/timeline/state.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ReaderError};

pub const SWEEP_INDEX: &str = "sweep_index";
pub const POSITION_IN_WINDOW: &str = "position_in_window";
pub const SAMPLES_SEEN: &str = "samples_seen";

/// Key/value snapshot of a reader's position.
///
/// Holds only what is needed to regenerate the window, never the window
/// itself. Window strategies add their own keys next to the generic ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    values: BTreeMap<String, u64>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: u64) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.values.get(key).copied()
    }

    /// Get a value, failing with a state error if the key is absent.
    pub fn require(&self, key: &str) -> Result<u64> {
        self.get(key)
            .ok_or_else(|| ReaderError::state(format!("missing key '{}'", key)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_missing_key() {
        let state = StateSnapshot::new();
        let err = state.require(SWEEP_INDEX).unwrap_err();
        assert!(err.to_string().contains("sweep_index"));
    }

    #[test]
    fn test_insert_overwrites() {
        let mut state = StateSnapshot::new();
        assert!(state.is_empty());

        state.insert(SWEEP_INDEX, 1);
        state.insert(SAMPLES_SEEN, 10);
        state.insert(SWEEP_INDEX, 2);

        assert_eq!(state.get(SWEEP_INDEX), Some(2));
        assert_eq!(state.require(SAMPLES_SEEN).unwrap(), 10);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_persist_as_toml() {
        let mut state = StateSnapshot::new();
        state.insert(SWEEP_INDEX, 4);
        state.insert(POSITION_IN_WINDOW, 17);

        let text = toml::to_string(&state).unwrap();
        assert!(text.contains("position_in_window = 17"));

        let parsed: StateSnapshot = toml::from_str(&text).unwrap();
        assert_eq!(parsed, state);
    }
}
