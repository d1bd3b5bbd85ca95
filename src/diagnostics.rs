//! Resolution diagnostics and the sinks that receive them.
//!
//! The engine never logs directly. Each decision becomes a [`Diagnostic`]
//! handed to the [`DiagnosticSink`] the caller passes in; [`TracingSink`]
//! forwards them to `tracing`, and `Vec<Diagnostic>` collects them for audits
//! and tests.

use std::fmt;

use tracing::{Level, error, info};

use crate::types::{DocumentLabel, IsbnKey, RecordId};

/// `tracing` target used for every forwarded diagnostic.
pub const DIAGNOSTICS_TARGET: &str = "catalog_reconcile::fixer";

/// One resolution decision or failure, scoped to the owning document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A direct `ID` exists in the catalog.
    DirectIdConfirmed {
        document: DocumentLabel,
        id: RecordId,
    },
    /// A direct `ID` names no catalog record.
    DanglingReference {
        document: DocumentLabel,
        id: String,
    },
    /// A `URL` descriptor is outside the resolvable domain.
    UrlSkipped {
        document: DocumentLabel,
        url: String,
    },
    /// A normalized ISBN matched a catalog record.
    IsbnMatched {
        document: DocumentLabel,
        isbn: IsbnKey,
        id: RecordId,
    },
    /// A normalized ISBN matched nothing.
    IsbnMissing {
        document: DocumentLabel,
        isbn: IsbnKey,
    },
    /// An `ISBN` occurrence could not be normalized.
    IsbnUnusable {
        document: DocumentLabel,
        path: String,
    },
    /// Title lookup found `count` work candidates.
    TitleCandidates {
        document: DocumentLabel,
        title: String,
        count: usize,
        alternate: bool,
    },
    /// Title lookup found exactly one candidate.
    TitleSingleMatch {
        document: DocumentLabel,
        title: String,
        id: RecordId,
    },
    /// Attribution picked one of several title candidates.
    TitleByMatch {
        document: DocumentLabel,
        title: String,
        by: String,
        id: RecordId,
    },
    /// Prime media picked one of several title candidates.
    TitlePrimeMatch {
        document: DocumentLabel,
        title: String,
        id: RecordId,
    },
    /// No work carries the title or alternate title.
    TitleMissing {
        document: DocumentLabel,
        title: String,
    },
    /// Several candidates and no tie-break applied.
    TitleAmbiguous {
        document: DocumentLabel,
        title: String,
        count: usize,
    },
    /// The descriptor has no `ID`, `URL`, `ISBN`, or `Title`.
    LookupsExhausted {
        document: DocumentLabel,
    },
    /// `ID` was written at `path`.
    SourceReferenced {
        document: DocumentLabel,
        path: String,
        id: RecordId,
    },
    /// The descriptor at `path` stays unresolved.
    SourceUnresolved {
        document: DocumentLabel,
        path: String,
    },
    /// The descriptor at `path` was skipped.
    SourceSkipped {
        document: DocumentLabel,
        path: String,
    },
    /// A `Source` node is not a mapping; the run aborts.
    MalformedSource {
        document: DocumentLabel,
        path: String,
    },
    /// The catalog failed; the run aborts.
    CatalogFailure {
        document: DocumentLabel,
        message: String,
    },
    /// The document changed and is emitted.
    DocumentUpdated {
        document: DocumentLabel,
    },
    /// The document is unchanged and discarded.
    DocumentUnmodified {
        document: DocumentLabel,
    },
}

impl Diagnostic {
    /// Severity: failures, ambiguity, and dangling references are errors.
    pub fn level(&self) -> Level {
        match self {
            Diagnostic::DanglingReference { .. }
            | Diagnostic::IsbnMissing { .. }
            | Diagnostic::IsbnUnusable { .. }
            | Diagnostic::TitleMissing { .. }
            | Diagnostic::TitleAmbiguous { .. }
            | Diagnostic::LookupsExhausted { .. }
            | Diagnostic::SourceUnresolved { .. }
            | Diagnostic::MalformedSource { .. }
            | Diagnostic::CatalogFailure { .. } => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// True for error-level diagnostics.
    pub fn is_error(&self) -> bool {
        self.level() == Level::ERROR
    }

    /// Label of the document this diagnostic belongs to.
    pub fn document(&self) -> &str {
        match self {
            Diagnostic::DirectIdConfirmed { document, .. }
            | Diagnostic::DanglingReference { document, .. }
            | Diagnostic::UrlSkipped { document, .. }
            | Diagnostic::IsbnMatched { document, .. }
            | Diagnostic::IsbnMissing { document, .. }
            | Diagnostic::IsbnUnusable { document, .. }
            | Diagnostic::TitleCandidates { document, .. }
            | Diagnostic::TitleSingleMatch { document, .. }
            | Diagnostic::TitleByMatch { document, .. }
            | Diagnostic::TitlePrimeMatch { document, .. }
            | Diagnostic::TitleMissing { document, .. }
            | Diagnostic::TitleAmbiguous { document, .. }
            | Diagnostic::LookupsExhausted { document }
            | Diagnostic::SourceReferenced { document, .. }
            | Diagnostic::SourceUnresolved { document, .. }
            | Diagnostic::SourceSkipped { document, .. }
            | Diagnostic::MalformedSource { document, .. }
            | Diagnostic::CatalogFailure { document, .. }
            | Diagnostic::DocumentUpdated { document }
            | Diagnostic::DocumentUnmodified { document } => document,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DirectIdConfirmed { document, id } => {
                write!(f, "{document} direct reference {id} confirmed")
            }
            Diagnostic::DanglingReference { document, id } => {
                write!(f, "{document} dangling reference {id}")
            }
            Diagnostic::UrlSkipped { document, url } => {
                write!(f, "{document} handling URL {url}")
            }
            Diagnostic::IsbnMatched { document, isbn, id } => {
                write!(f, "{document} matched {id} to ISBN {isbn}")
            }
            Diagnostic::IsbnMissing { document, isbn } => {
                write!(f, "{document} missing ISBN reference to {isbn}")
            }
            Diagnostic::IsbnUnusable { document, path } => {
                write!(f, "{document} unusable ISBN value at {path}")
            }
            Diagnostic::TitleCandidates {
                document,
                title,
                count,
                alternate,
            } => {
                let field = if *alternate { "alternate title" } else { "title" };
                write!(f, "{document} checking {field} >{title}< count {count}")
            }
            Diagnostic::TitleSingleMatch { document, title, id } => {
                write!(f, "{document} one match for {title} {id}")
            }
            Diagnostic::TitleByMatch {
                document,
                title,
                by,
                id,
            } => write!(f, "{document} found match {id} for >{title}< by {by}"),
            Diagnostic::TitlePrimeMatch { document, title, id } => {
                write!(f, "{document} found PRIME match {id} for >{title}<")
            }
            Diagnostic::TitleMissing { document, title } => {
                write!(f, "{document} missing title >{title}<")
            }
            Diagnostic::TitleAmbiguous {
                document,
                title,
                count,
            } => write!(
                f,
                "{document} unresolved match for >{title}< among {count} candidates"
            ),
            Diagnostic::LookupsExhausted { document } => {
                write!(f, "{document} exhausted all source lookups")
            }
            Diagnostic::SourceReferenced { document, path, id } => {
                write!(f, "{document} reference {path}.ID={id}")
            }
            Diagnostic::SourceUnresolved { document, path } => {
                write!(f, "{document} unresolved {path} source")
            }
            Diagnostic::SourceSkipped { document, path } => {
                write!(f, "{document} skipped {path} source")
            }
            Diagnostic::MalformedSource { document, path } => {
                write!(f, "FATAL {document} source at {path} is not a mapping")
            }
            Diagnostic::CatalogFailure { document, message } => {
                write!(f, "{document} catalog failure: {message}")
            }
            Diagnostic::DocumentUpdated { document } => write!(f, "{document} UPDATED"),
            Diagnostic::DocumentUnmodified { document } => write!(f, "{document} unmodified"),
        }
    }
}

/// Receiver of engine diagnostics.
pub trait DiagnosticSink {
    /// Receive one diagnostic.
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards diagnostics to `tracing` under [`DIAGNOSTICS_TARGET`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            error!(target: DIAGNOSTICS_TARGET, "[reconcile] {}", diagnostic);
        } else {
            info!(target: DIAGNOSTICS_TARGET, "[reconcile] {}", diagnostic);
        }
    }
}

/// Counts error-level diagnostics while forwarding everything to `inner`.
pub struct CountingSink<S> {
    inner: S,
    errors: usize,
}

impl<S: DiagnosticSink> CountingSink<S> {
    /// Wrap `inner` with an error counter starting at zero.
    pub fn new(inner: S) -> Self {
        Self { inner, errors: 0 }
    }

    /// Error-level diagnostics seen so far.
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// Unwrap the forwarding target.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: DiagnosticSink> DiagnosticSink for CountingSink<S> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.errors += 1;
        }
        self.inner.emit(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_error_level() {
        let dangling = Diagnostic::DanglingReference {
            document: "doc".into(),
            id: "missing".into(),
        };
        let skipped = Diagnostic::UrlSkipped {
            document: "doc".into(),
            url: "https://example.org".into(),
        };
        assert!(dangling.is_error());
        assert!(!skipped.is_error());
        assert_eq!(dangling.to_string(), "doc dangling reference missing");
    }

    #[test]
    fn counting_sink_tracks_errors_and_forwards() {
        let mut sink = CountingSink::new(Vec::<Diagnostic>::new());
        sink.emit(Diagnostic::LookupsExhausted {
            document: "a".into(),
        });
        sink.emit(Diagnostic::DocumentUnmodified {
            document: "a".into(),
        });
        assert_eq!(sink.errors(), 1);
        let collected = sink.into_inner();
        assert_eq!(collected.len(), 2);
        assert!(collected.iter().all(|diagnostic| diagnostic.document() == "a"));
    }
}
