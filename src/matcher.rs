//! Resolution of one source descriptor to a canonical catalog identifier.
//!
//! Strategies run in strict priority order and the first applicable one
//! decides the outcome:
//! 1. a direct `ID` is confirmed against the catalog, never falling through;
//! 2. a `URL` marks the descriptor as outside the resolvable domain;
//! 3. every `ISBN` below the descriptor is normalized and looked up in turn;
//! 4. a `Title` is matched against `work` records (then their alternate
//!    titles), with `By` and prime-media tie-breaks for multiple candidates;
//! 5. otherwise all lookups are exhausted.
//!
//! Every branch reports its reasoning through the diagnostics sink. Only
//! [`Resolution::Resolved`] leads the reconciler to mutate the document.

use serde_json::{Map, Value};

use crate::catalog::{Catalog, Predicate};
use crate::config::ReconcileConfig;
use crate::constants::fields::{ALTERNATE_TITLES, BY, CATEGORY, ID, ISBN, MEDIA, TITLE, TRY_BY, URL};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::errors::{CatalogError, PathError};
use crate::path::{PathPattern, search};
use crate::types::RecordId;
use crate::utils::{is_blank, normalize_isbn, scalar_text, value_matches};

/// Outcome of matching one descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Confirmed canonical identifier.
    Resolved(RecordId),
    /// Nothing matched, or the match was ambiguous or dangling.
    Unresolved,
    /// The descriptor is outside the resolvable domain (URL references).
    Skipped,
}

/// Applies the resolution strategy against a catalog.
pub struct ReferenceMatcher<'a> {
    catalog: &'a dyn Catalog,
    config: &'a ReconcileConfig,
    isbn_pattern: PathPattern,
}

impl<'a> ReferenceMatcher<'a> {
    /// Matcher over `catalog`; fails only if the ISBN pattern cannot be built
    /// with the configured separator.
    pub fn new(catalog: &'a dyn Catalog, config: &'a ReconcileConfig) -> Result<Self, PathError> {
        Ok(Self {
            catalog,
            config,
            isbn_pattern: config.anywhere(ISBN)?,
        })
    }

    /// Resolve `descriptor`, reporting decisions under the `document` label.
    ///
    /// Catalog failures are returned as errors; every other failure mode is
    /// a diagnostic plus `Unresolved`.
    pub fn resolve(
        &self,
        descriptor: &Value,
        document: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Resolution, CatalogError> {
        let Some(fields) = descriptor.as_object() else {
            sink.emit(Diagnostic::LookupsExhausted {
                document: document.to_string(),
            });
            return Ok(Resolution::Unresolved);
        };

        if let Some(id) = present(fields, ID) {
            return self.resolve_direct(id, document, sink);
        }

        if let Some(url) = present(fields, URL) {
            sink.emit(Diagnostic::UrlSkipped {
                document: document.to_string(),
                url: scalar_text(url).unwrap_or_else(|| url.to_string()),
            });
            return Ok(Resolution::Skipped);
        }

        if let Some(id) = self.resolve_isbn(descriptor, document, sink)? {
            return Ok(Resolution::Resolved(id));
        }

        if let Some(title) = present(fields, TITLE).and_then(scalar_text) {
            return self.resolve_title(fields, &title, document, sink);
        }

        sink.emit(Diagnostic::LookupsExhausted {
            document: document.to_string(),
        });
        Ok(Resolution::Unresolved)
    }

    fn resolve_direct(
        &self,
        id: &Value,
        document: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Resolution, CatalogError> {
        let id = scalar_text(id).unwrap_or_else(|| id.to_string());
        match self.catalog.first(&[Predicate::new(ID, id.as_str())])? {
            Some(found) => {
                sink.emit(Diagnostic::DirectIdConfirmed {
                    document: document.to_string(),
                    id: found.clone(),
                });
                Ok(Resolution::Resolved(found))
            }
            None => {
                sink.emit(Diagnostic::DanglingReference {
                    document: document.to_string(),
                    id,
                });
                Ok(Resolution::Unresolved)
            }
        }
    }

    /// First ISBN occurrence (document order) with a catalog match wins.
    fn resolve_isbn(
        &self,
        descriptor: &Value,
        document: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Option<RecordId>, CatalogError> {
        for (path, raw) in search(descriptor, &self.isbn_pattern) {
            let Some(isbn) = normalize_isbn(raw, self.config.pad_legacy_isbn) else {
                sink.emit(Diagnostic::IsbnUnusable {
                    document: document.to_string(),
                    path: path.to_string(),
                });
                continue;
            };
            match self.catalog.first(&[Predicate::new(ISBN, isbn.as_str())])? {
                Some(id) => {
                    sink.emit(Diagnostic::IsbnMatched {
                        document: document.to_string(),
                        isbn,
                        id: id.clone(),
                    });
                    return Ok(Some(id));
                }
                None => sink.emit(Diagnostic::IsbnMissing {
                    document: document.to_string(),
                    isbn,
                }),
            }
        }
        Ok(None)
    }

    fn resolve_title(
        &self,
        fields: &Map<String, Value>,
        title: &str,
        document: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Resolution, CatalogError> {
        let mut alternate = false;
        let mut candidates = self.works_where(TITLE, title)?;
        if candidates.is_empty() {
            alternate = true;
            candidates = self.works_where(ALTERNATE_TITLES, title)?;
        }
        if candidates.is_empty() {
            sink.emit(Diagnostic::TitleMissing {
                document: document.to_string(),
                title: title.to_string(),
            });
            return Ok(Resolution::Unresolved);
        }

        sink.emit(Diagnostic::TitleCandidates {
            document: document.to_string(),
            title: title.to_string(),
            count: candidates.len(),
            alternate,
        });

        if candidates.len() == 1 {
            let id = candidates.remove(0);
            sink.emit(Diagnostic::TitleSingleMatch {
                document: document.to_string(),
                title: title.to_string(),
                id: id.clone(),
            });
            return Ok(Resolution::Resolved(id));
        }

        let records = self.materialize(&candidates)?;

        if let Some(by) = present(fields, BY).or_else(|| present(fields, TRY_BY)) {
            let attributed = records.iter().find(|(_, record)| {
                record
                    .get(BY)
                    .is_some_and(|candidate_by| value_matches(candidate_by, by))
            });
            if let Some((id, _)) = attributed {
                sink.emit(Diagnostic::TitleByMatch {
                    document: document.to_string(),
                    title: title.to_string(),
                    by: scalar_text(by).unwrap_or_else(|| by.to_string()),
                    id: id.clone(),
                });
                return Ok(Resolution::Resolved(id.clone()));
            }
        }

        let prime = Value::String(self.config.prime_media.clone());
        let preferred = records.iter().find(|(_, record)| {
            record
                .get(MEDIA)
                .is_some_and(|media| value_matches(media, &prime))
        });
        if let Some((id, _)) = preferred {
            sink.emit(Diagnostic::TitlePrimeMatch {
                document: document.to_string(),
                title: title.to_string(),
                id: id.clone(),
            });
            return Ok(Resolution::Resolved(id.clone()));
        }

        sink.emit(Diagnostic::TitleAmbiguous {
            document: document.to_string(),
            title: title.to_string(),
            count: candidates.len(),
        });
        Ok(Resolution::Unresolved)
    }

    fn works_where(&self, field: &str, title: &str) -> Result<Vec<RecordId>, CatalogError> {
        let predicates = [
            Predicate::new(field, title),
            Predicate::new(CATEGORY, self.config.work_category.as_str()),
        ];
        Ok(self.catalog.query(&predicates)?.collect())
    }

    /// Full records for `ids`, in the order given; ids the catalog no longer
    /// knows are dropped.
    fn materialize(&self, ids: &[RecordId]) -> Result<Vec<(RecordId, Value)>, CatalogError> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.catalog.get(id)? {
                records.push((id.clone(), record));
            }
        }
        Ok(records)
    }
}

/// Field value when present and not blank.
fn present<'v>(fields: &'v Map<String, Value>, name: &str) -> Option<&'v Value> {
    fields.get(name).filter(|value| !is_blank(value))
}
