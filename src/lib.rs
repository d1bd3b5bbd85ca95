#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Reusable command-line runners.
pub mod apps;
/// Catalog client interface and built-in stores.
pub mod catalog;
/// Reconciliation configuration types.
pub mod config;
/// Centralized field names and pattern tokens.
pub mod constants;
/// Resolution diagnostics and sinks.
pub mod diagnostics;
/// Order-insensitive change detection.
pub mod diff;
/// Document header helpers.
pub mod document;
/// Reference matching strategy.
pub mod matcher;
/// Glob-style navigation and mutation of nested documents.
pub mod path;
/// Stream reconciliation loop.
pub mod reconcile;
/// Shared type aliases.
pub mod types;
/// ISBN and value normalization helpers.
pub mod utils;
/// Structural-type validation.
pub mod validate;

mod errors;

pub use catalog::{Catalog, FileCatalog, InMemoryCatalog, Predicate, RecordIds};
pub use config::ReconcileConfig;
pub use diagnostics::{CountingSink, Diagnostic, DiagnosticSink, TracingSink};
pub use diff::{has_changed, structurally_equal};
pub use document::DocumentHeader;
pub use errors::{CatalogError, PathError, ReconcileError};
pub use matcher::{ReferenceMatcher, Resolution};
pub use path::{DocPath, PathPattern, PathSegment};
pub use reconcile::{DocumentOutcome, ReconcileSummary, Reconciler};
pub use types::{DocumentLabel, FieldName, IsbnKey, PatternString, RecordId};
pub use validate::StructureValidator;
