//! Shared identifier types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque task identifier, stable for the lifetime of a task and across
/// persistence round trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(TaskId::generate(), TaskId::generate());
    }

    #[test]
    fn test_task_id_serializes_as_plain_string() {
        let id = TaskId::from("nightly-cleanup");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"nightly-cleanup\"");
        let back: TaskId = serde_json::from_str("\"nightly-cleanup\"").unwrap();
        assert_eq!(back, id);
    }
}
