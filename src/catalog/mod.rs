//! Catalog client interface and the in-memory store.
//!
//! Ownership model:
//! - `Catalog` is the read-only lookup surface the matcher consumes.
//! - `InMemoryCatalog` holds canonical records keyed by identifier and answers
//!   queries in identifier order, so "first candidate" tie-breaks are stable.
//! - `FileCatalog` loads an `InMemoryCatalog` from disk.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::constants::catalog::PREDICATE_DELIMITER;
use crate::constants::fields::ID;
use crate::errors::CatalogError;
use crate::types::{FieldName, RecordId};
use crate::utils::scalar_text;

/// Filesystem-backed catalog loader.
pub mod file_catalog;

pub use file_catalog::FileCatalog;

/// Field-equality constraint, wire form `<field>=<value>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Predicate {
    field: FieldName,
    value: String,
}

impl Predicate {
    /// Constraint requiring `field` to equal `value`.
    pub fn new(field: impl Into<FieldName>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Constrained field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Required value in its scalar string form.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// True when the record's field renders to the predicate value, or is a
    /// sequence with an element that does.
    pub fn matches(&self, record: &Value) -> bool {
        let Some(field) = record.get(&self.field) else {
            return false;
        };
        match field {
            Value::Array(items) => items
                .iter()
                .any(|item| scalar_text(item).is_some_and(|text| text == self.value)),
            other => scalar_text(other).is_some_and(|text| text == self.value),
        }
    }
}

impl FromStr for Predicate {
    type Err = CatalogError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.split_once(PREDICATE_DELIMITER) {
            Some((field, value)) if !field.is_empty() => Ok(Self::new(field, value)),
            _ => Err(CatalogError::InvalidPredicate(raw.to_string())),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, PREDICATE_DELIMITER, self.value)
    }
}

/// Identifiers produced by a catalog query.
pub type RecordIds<'a> = Box<dyn Iterator<Item = RecordId> + 'a>;

/// Read-only catalog lookup interface.
///
/// Predicates passed to `query` are implicitly ANDed. Implementations should
/// return results in a stable order for a fixed store state.
pub trait Catalog {
    /// Identifiers of every record satisfying all `predicates`.
    fn query(&self, predicates: &[Predicate]) -> Result<RecordIds<'_>, CatalogError>;

    /// Full record for `id`, or `None` when absent.
    fn get(&self, id: &str) -> Result<Option<Value>, CatalogError>;

    /// First identifier satisfying `predicates`, if any.
    fn first(&self, predicates: &[Predicate]) -> Result<Option<RecordId>, CatalogError> {
        Ok(self.query(predicates)?.next())
    }
}

/// In-memory catalog for tests, fixtures, and file-loaded stores.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    records: BTreeMap<RecordId, Value>,
}

impl InMemoryCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from records that each carry a scalar `ID`.
    pub fn from_records(records: impl IntoIterator<Item = Value>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for record in records {
            catalog.insert(record, "<memory>")?;
        }
        Ok(catalog)
    }

    /// Add or replace a record, returning its identifier.
    ///
    /// `origin` only labels the error when the record has no usable `ID`.
    pub fn insert(&mut self, record: Value, origin: &str) -> Result<RecordId, CatalogError> {
        let id = record
            .get(ID)
            .and_then(scalar_text)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CatalogError::Parse {
                origin: origin.to_string(),
                message: "record has no scalar ID".into(),
            })?;
        self.records.insert(id.clone(), record);
        Ok(id)
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are held.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Catalog for InMemoryCatalog {
    fn query(&self, predicates: &[Predicate]) -> Result<RecordIds<'_>, CatalogError> {
        let predicates = predicates.to_vec();
        Ok(Box::new(
            self.records
                .iter()
                .filter(move |(_, record)| predicates.iter().all(|p| p.matches(record)))
                .map(|(id, _)| id.clone()),
        ))
    }

    fn get(&self, id: &str) -> Result<Option<Value>, CatalogError> {
        Ok(self.records.get(id).cloned())
    }
}
