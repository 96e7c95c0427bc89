use serde_json::{Map, Value};

use super::record::RecordKey;

/// Represents a single change staged by a session.
#[derive(Debug, Clone)]
pub enum Change {
    /// Create a new record
    Create {
        /// Record type name
        entity: String,
        /// Key of the new record
        key: RecordKey,
        /// Stored field values
        values: Map<String, Value>,
    },
    /// Replace the values of an existing record
    Update {
        entity: String,
        key: RecordKey,
        values: Map<String, Value>,
    },
    /// Delete a record
    Delete { entity: String, key: RecordKey },
}

impl Change {
    pub fn entity(&self) -> &str {
        match self {
            Change::Create { entity, .. }
            | Change::Update { entity, .. }
            | Change::Delete { entity, .. } => entity,
        }
    }
}
