//! Structural-type checks that gate a document before source resolution.

use serde_json::Value;

use crate::config::ReconcileConfig;
use crate::errors::{PathError, ReconcileError};
use crate::path::{PathPattern, search};
use crate::types::FieldName;
use crate::utils::value_kind;

/// Asserts that configured fields hold a sequence or a string wherever they occur.
pub struct StructureValidator {
    checks: Vec<(FieldName, PathPattern)>,
}

impl StructureValidator {
    /// Compile one `**.<field>` pattern per configured structural field.
    pub fn new(config: &ReconcileConfig) -> Result<Self, PathError> {
        let checks = config
            .structural_fields
            .iter()
            .map(|field| Ok((field.clone(), config.anywhere(field)?)))
            .collect::<Result<Vec<_>, PathError>>()?;
        Ok(Self { checks })
    }

    /// Fail on the first occurrence (field order, then document order) with the wrong kind.
    pub fn check(&self, document: &Value, label: &str) -> Result<(), ReconcileError> {
        for (field, pattern) in &self.checks {
            for (path, value) in search(document, pattern) {
                if !matches!(value, Value::Array(_) | Value::String(_)) {
                    return Err(ReconcileError::StructuralType {
                        document: label.to_string(),
                        field: field.clone(),
                        path: path.to_string(),
                        found: value_kind(value),
                    });
                }
            }
        }
        Ok(())
    }
}
