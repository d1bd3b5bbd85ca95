use serde_json::Value;

use crate::constants::apps::UNSAVED_DOCUMENT_LABEL;
use crate::constants::fields::{BY, CATEGORY, ID};
use crate::types::DocumentLabel;
use crate::utils::{is_blank, scalar_text};

/// Top-level identity and attribution of an input document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentHeader {
    /// `ID`, absent for new or unsaved records.
    pub id: Option<Value>,
    /// `Category` tag, reported in debug logs.
    pub category: Option<Value>,
    /// `By`, used as the fallback attribution hint for descriptors.
    pub by: Option<Value>,
}

impl DocumentHeader {
    /// Read the header fields, treating blank values as absent.
    pub fn from_document(document: &Value) -> Self {
        let field = |name: &str| document.get(name).filter(|value| !is_blank(value)).cloned();
        Self {
            id: field(ID),
            category: field(CATEGORY),
            by: field(BY),
        }
    }

    /// Label used to prefix diagnostics for this document.
    pub fn label(&self) -> DocumentLabel {
        match &self.id {
            Some(id) => scalar_text(id).unwrap_or_else(|| id.to_string()),
            None => UNSAVED_DOCUMENT_LABEL.to_string(),
        }
    }
}
