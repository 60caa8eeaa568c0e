//! # Error Types
//!
//! Defines `NormError`, the unified error enum for every failure mode in the
//! normalization pipeline. Every variant includes enough context (entity
//! name, column name, constraint) to debug immediately without digging
//! through logs.

use thiserror::Error;

/// All errors that can occur during project validation or a normalization run.
#[derive(Error, Debug)]
pub enum NormError {
    // -- ConfigurationError (pre-run) --
    #[error("Unknown entity '{name}' referenced from {context}")]
    UnknownEntity { name: String, context: String },

    #[error("Unknown data source '{name}' referenced by entity '{entity}'")]
    UnknownDataSource { name: String, entity: String },

    #[error("Entity '{entity}' is missing required field '{field}'")]
    MissingRequiredField { entity: String, field: String },

    #[error("Entity '{entity}' field '{field}' has the wrong type: expected {expected}, got {actual}")]
    BadFieldType {
        entity: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Circular dependency detected: {cycle}\n  Break the cycle by removing one of the listed dependencies or foreign keys.")]
    CircularDependency { cycle: String },

    #[error("Entity '{entity}' has an invalid foreign key to '{remote_entity}': {reason}")]
    InvalidForeignKey {
        entity: String,
        remote_entity: String,
        reason: String,
    },

    #[error("Entity '{entity}' has an invalid unnest configuration: {reason}")]
    InvalidUnnest { entity: String, reason: String },

    #[error("Entity '{entity}' declares a surrogate id column '{column}' more than once")]
    DuplicateSurrogateId { entity: String, column: String },

    // -- ReferenceError (pre-run, runtime-detectable) --
    #[error("Entity '{entity}' unnest id_vars missing from source columns: {missing}")]
    UnnestMissingIdVar { entity: String, missing: String },

    #[error("Entity '{entity}' foreign key to '{remote_entity}' references local_keys not present in '{entity}': {missing}")]
    FKLocalKeysMissing {
        entity: String,
        remote_entity: String,
        missing: String,
    },

    // -- LoadError (run) --
    #[error("Entity '{entity}': loaded data has columns {actual} but configuration declares {expected}")]
    ColumnMismatch {
        entity: String,
        expected: String,
        actual: String,
    },

    #[error("Entity '{entity}': loaded rows do not match the declared column shape: {reason}")]
    RowShapeMismatch { entity: String, reason: String },

    #[error("Entity '{entity}' failed to load: {message}")]
    LoadFailed { entity: String, message: String },

    // -- LinkingError (run) --
    #[error("Entity '{entity}' foreign key to '{remote_entity}': remote keys {missing} are absent from '{remote_entity}'")]
    FKRemoteKeysMissing {
        entity: String,
        remote_entity: String,
        missing: String,
    },

    #[error("Entity '{entity}' foreign key to '{remote_entity}': local keys {missing} are absent from the current data for '{entity}'")]
    FKLocalKeysMissingInData {
        entity: String,
        remote_entity: String,
        missing: String,
    },

    #[error("Foreign key {child} -> {parent} violates constraint: {reason}")]
    ConstraintViolation {
        child: String,
        parent: String,
        reason: String,
    },

    // -- SchedulingError (run) --
    #[error("Scheduling stalled: the following entities have unmet dependencies:\n{unmet}")]
    StalledDependency { unmet: String },

    #[error("Normalization finished with unresolved foreign keys:\n{residual}")]
    PersistentDeferral { residual: String },

    // -- InvariantError (run, internal) --
    #[error("Entity '{entity}' violates its functional dependency on {determinant}: {detail}")]
    FunctionalDependencyViolation {
        entity: String,
        determinant: String,
        detail: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, NormError>;
