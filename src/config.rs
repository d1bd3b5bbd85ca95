use crate::constants::catalog::{PRIME_MEDIA, WORK_CATEGORY};
use crate::constants::patterns::{RECURSIVE_WILDCARD, SEPARATOR};
use crate::constants::structure::DEFAULT_ARRAY_FIELDS;
use crate::errors::PathError;
use crate::path::PathPattern;
use crate::types::FieldName;

/// Runtime configuration for a reconciliation run.
#[derive(Clone, Debug)]
pub struct ReconcileConfig {
    /// Separator between path pattern segments.
    pub separator: char,
    /// Category required on title-match candidates.
    pub work_category: String,
    /// Media designation preferred when a title match is ambiguous.
    pub prime_media: String,
    /// Left-pad 9-digit ISBNs with a `0` before lookup.
    pub pad_legacy_isbn: bool,
    /// Run the structural-type validator before resolving sources.
    pub check_structure: bool,
    /// Fields that must hold a sequence or a string when `check_structure` is on.
    pub structural_fields: Vec<FieldName>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            separator: SEPARATOR,
            work_category: WORK_CATEGORY.to_string(),
            prime_media: PRIME_MEDIA.to_string(),
            pad_legacy_isbn: true,
            check_structure: false,
            structural_fields: DEFAULT_ARRAY_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl ReconcileConfig {
    /// Pattern matching `field` at any depth, e.g. `**.Source`.
    pub fn anywhere(&self, field: &str) -> Result<PathPattern, PathError> {
        PathPattern::parse(
            &format!("{RECURSIVE_WILDCARD}{}{field}", self.separator),
            self.separator,
        )
    }
}
