//! Error types for override and merge operations.
//!
//! Provides a unified error type covering every failure mode of the engine:
//! inconsistent unions, unkeyable elements, cross-scope key conflicts,
//! shape mismatches between a patch and its base, and I/O or YAML failures
//! of the loading helpers.

use devtemplate_core::{DocumentError, FieldPath, KeyError, UnionError};
use thiserror::Error;

use crate::conflicts::{DuplicateKeyError, Scope, UnknownOverrideError};

/// Errors that can occur during override, merge and composition.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A union has zero or several variants set without a discriminator, or
    /// a discriminator naming an empty variant.
    #[error(transparent)]
    AmbiguousUnion(#[from] UnionError),

    /// An element that must be keyed has no derivable key.
    #[error(transparent)]
    UnkeyableElement(#[from] KeyError),

    /// Keys of the main document are already defined by a parent or plugin.
    #[error("{}", join_messages(.0))]
    DuplicateKeys(Vec<DuplicateKeyError>),

    /// A patch field does not have the shape of the base field it patches.
    #[error("schema mismatch at {path}: {detail}")]
    SchemaMismatch { path: FieldPath, detail: String },

    /// Strict overriding found patch elements that override nothing, one
    /// entry per element type.
    #[error("{}", join_messages(.0))]
    UnknownOverride(Vec<UnknownOverrideError>),

    /// No resolved content was supplied for an import.
    #[error("no resolved content supplied for {0}")]
    MissingImport(Scope),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML (or JSON) parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl From<DocumentError> for EngineError {
    fn from(err: DocumentError) -> Self {
        EngineError::SchemaMismatch {
            path: FieldPath::root(),
            detail: err.to_string(),
        }
    }
}

fn join_messages<E: ToString>(errors: &[E]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;
