use std::io;

use thiserror::Error;

use crate::types::{DocumentLabel, FieldName, PatternString};

/// Failures raised by the deep path navigator.
///
/// A pattern that simply matches nothing is not an error; see
/// [`crate::path::delete`] and [`crate::path::get`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("malformed path pattern '{pattern}': {reason}")]
    Malformed {
        pattern: PatternString,
        reason: String,
    },
    #[error("cannot write through non-container value at '{path}'")]
    Conflict { path: String },
}

/// Failures raised by a catalog backend.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("catalog record in '{origin}' could not be loaded: {message}")]
    Parse { origin: String, message: String },
    #[error("catalog is unavailable: {0}")]
    Unavailable(String),
    #[error("invalid catalog predicate '{0}': expected <field>=<value>")]
    InvalidPredicate(String),
}

/// Error type for a reconciliation run.
///
/// `MalformedSource` and `StructuralType` abort the whole run; everything that
/// only concerns a single descriptor is reported as a diagnostic instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("document {document}: source at '{path}' is {found}, expected a mapping")]
    MalformedSource {
        document: DocumentLabel,
        path: String,
        found: &'static str,
    },
    #[error("document {document}: field '{field}' at '{path}' is {found}, expected a sequence or string")]
    StructuralType {
        document: DocumentLabel,
        field: FieldName,
        path: String,
        found: &'static str,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Path(#[from] PathError),
}
