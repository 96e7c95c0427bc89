//! Scaffold error types.

use thiserror::Error;

/// Errors raised by the schema, store, repository and form layers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScaffoldError {
    /// Required attribute unset (no record type bound, bad configuration value)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Record type not found in the schema
    #[error("Entity '{entity}' not found")]
    EntityNotFound { entity: String },

    /// Entity declared twice in one schema
    #[error("Entity '{0}' already exists")]
    DuplicateEntity(String),

    /// Record not found by primary key
    #[error("Record {key} not found in entity '{entity}'")]
    RecordNotFound { entity: String, key: String },

    /// Field not declared on the entity
    #[error("Field '{field}' not found in entity '{entity}'")]
    FieldNotFound { entity: String, field: String },

    /// Field declared twice on one entity
    #[error("Field '{field}' already exists in entity '{entity}'")]
    DuplicateField { entity: String, field: String },

    /// Schema definition rejected
    #[error("Invalid schema for entity '{entity}': {message}")]
    InvalidSchema { entity: String, message: String },

    /// No converter registered for a field kind and no override supplied
    #[error("Field '{field}' of entity '{entity}' has kind '{kind}' with no registered converter")]
    UnregisteredFieldKind {
        entity: String,
        field: String,
        kind: String,
    },

    /// Required field left unset
    #[error("Field '{field}' of entity '{entity}' is required")]
    MissingValue { entity: String, field: String },

    /// Value does not match the declared kind
    #[error("Type mismatch for '{entity}.{field}': expected {expected}, got {got}")]
    TypeMismatch {
        entity: String,
        field: String,
        expected: String,
        got: String,
    },

    /// Value violates a declared bound
    #[error("Invalid value for '{entity}.{field}': {message}")]
    InvalidValue {
        entity: String,
        field: String,
        message: String,
    },

    /// Unique field or primary key already held by another record
    #[error("Value {value} of '{entity}.{field}' is already taken")]
    UniqueViolation {
        entity: String,
        field: String,
        value: String,
    },

    /// Reference points at a record that does not exist
    #[error("'{entity}.{field}' references missing {target} record {key}")]
    ReferenceNotFound {
        entity: String,
        field: String,
        target: String,
        key: String,
    },

    /// Attempt to change the primary key of a stored record
    #[error("Primary key of entity '{entity}' cannot be changed")]
    PrimaryKeyChange { entity: String },

    /// Session already committed or rolled back
    #[error("Session is closed")]
    SessionClosed,

    /// Concurrent sessions touched the same record
    #[error("Commit conflict: {0}")]
    Conflict(String),

    /// Database kind recognised but no provider is available for it
    #[error("Database provider '{0}' is not available")]
    UnsupportedProvider(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Data corruption detected in a snapshot file
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),
}

impl ScaffoldError {
    /// Returns `true` when the error means the requested thing is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ScaffoldError::RecordNotFound { .. } | ScaffoldError::EntityNotFound { .. }
        )
    }
}
