use std::io::{BufReader, Read, Write};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::ReconcileConfig;
use crate::constants::fields::{BY, ID, SOURCE, TRY_BY};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::diff::has_changed;
use crate::document::DocumentHeader;
use crate::errors::ReconcileError;
use crate::matcher::{ReferenceMatcher, Resolution};
use crate::path::{self, DocPath, PathPattern};
use crate::utils::{is_blank, value_kind};
use crate::validate::StructureValidator;

/// Per-document result of one reconciliation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DocumentOutcome {
    /// True when the document differs from its pre-pass snapshot.
    pub changed: bool,
    /// Descriptors rewritten to a canonical `ID`.
    pub resolved: usize,
    /// Descriptors left as they were after a failed or ambiguous lookup.
    pub unresolved: usize,
    /// Descriptors outside the resolvable domain (URL references).
    pub skipped: usize,
}

/// Aggregate counters for a whole stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Documents parsed from the input stream.
    pub documents_read: usize,
    /// Documents written to the output.
    pub documents_emitted: usize,
    /// Documents discarded because nothing changed.
    pub documents_unmodified: usize,
    /// Sum of [`DocumentOutcome::resolved`].
    pub descriptors_resolved: usize,
    /// Sum of [`DocumentOutcome::unresolved`].
    pub descriptors_unresolved: usize,
    /// Sum of [`DocumentOutcome::skipped`].
    pub descriptors_skipped: usize,
}

impl ReconcileSummary {
    fn record(&mut self, outcome: &DocumentOutcome) {
        self.documents_read += 1;
        if outcome.changed {
            self.documents_emitted += 1;
        } else {
            self.documents_unmodified += 1;
        }
        self.descriptors_resolved += outcome.resolved;
        self.descriptors_unresolved += outcome.unresolved;
        self.descriptors_skipped += outcome.skipped;
    }
}

/// Sequential stream reconciler: one mutation pass per document, output only on change.
pub struct Reconciler<'a> {
    config: &'a ReconcileConfig,
    matcher: ReferenceMatcher<'a>,
    sources: PathPattern,
    transient_hints: PathPattern,
    structure: Option<StructureValidator>,
}

impl<'a> Reconciler<'a> {
    /// Build a reconciler over `catalog`, compiling the configured path patterns.
    pub fn new(catalog: &'a dyn Catalog, config: &'a ReconcileConfig) -> Result<Self, ReconcileError> {
        let structure = if config.check_structure {
            Some(StructureValidator::new(config)?)
        } else {
            None
        };
        Ok(Self {
            config,
            matcher: ReferenceMatcher::new(catalog, config)?,
            sources: config.anywhere(SOURCE)?,
            transient_hints: config.anywhere(TRY_BY)?,
            structure,
        })
    }

    /// Configuration this reconciler was built with.
    pub fn config(&self) -> &ReconcileConfig {
        self.config
    }

    /// Resolve every source descriptor in `document` in place.
    ///
    /// A `Source` node that is not a mapping aborts with
    /// [`ReconcileError::MalformedSource`]; descriptor-level failures are
    /// reported to `sink` and never affect sibling descriptors.
    pub fn reconcile_document(
        &self,
        document: &mut Value,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<DocumentOutcome, ReconcileError> {
        let snapshot = document.clone();
        let header = DocumentHeader::from_document(document);
        let label = header.label();
        debug!(
            "[reconcile] document {} category={}",
            label,
            header
                .category
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default()
        );

        if let Some(structure) = &self.structure {
            structure.check(document, &label)?;
        }

        let descriptor_paths: Vec<DocPath> = path::search(document, &self.sources)
            .map(|(found, _)| found)
            .collect();

        let mut outcome = DocumentOutcome::default();
        for descriptor_path in &descriptor_paths {
            let Some(descriptor) = path::get_mut(document, descriptor_path) else {
                continue;
            };
            let found = value_kind(descriptor);
            let Value::Object(fields) = &mut *descriptor else {
                sink.emit(Diagnostic::MalformedSource {
                    document: label.clone(),
                    path: descriptor_path.to_string(),
                });
                return Err(ReconcileError::MalformedSource {
                    document: label,
                    path: descriptor_path.to_string(),
                    found,
                });
            };
            if fields.get(BY).is_none_or(is_blank) {
                if let Some(by) = &header.by {
                    fields.insert(TRY_BY.to_string(), by.clone());
                }
            }

            let resolution = match self.matcher.resolve(descriptor, &label, sink) {
                Ok(resolution) => resolution,
                Err(err) => {
                    sink.emit(Diagnostic::CatalogFailure {
                        document: label.clone(),
                        message: err.to_string(),
                    });
                    return Err(err.into());
                }
            };

            match resolution {
                Resolution::Resolved(id) => {
                    sink.emit(Diagnostic::SourceReferenced {
                        document: label.clone(),
                        path: descriptor_path.to_string(),
                        id: id.clone(),
                    });
                    path::write(document, &descriptor_path.child_key(ID), Value::String(id))?;
                    outcome.resolved += 1;
                }
                Resolution::Unresolved => {
                    sink.emit(Diagnostic::SourceUnresolved {
                        document: label.clone(),
                        path: descriptor_path.to_string(),
                    });
                    outcome.unresolved += 1;
                }
                Resolution::Skipped => {
                    sink.emit(Diagnostic::SourceSkipped {
                        document: label.clone(),
                        path: descriptor_path.to_string(),
                    });
                    outcome.skipped += 1;
                }
            }

            path::remove_at(document, &descriptor_path.child_key(TRY_BY));
        }

        let residual = path::delete(document, &self.transient_hints);
        if residual > 0 {
            debug!("[reconcile] document {} dropped {} residual hints", label, residual);
        }

        outcome.changed = has_changed(&snapshot, document);
        if outcome.changed {
            sink.emit(Diagnostic::DocumentUpdated { document: label });
        } else {
            sink.emit(Diagnostic::DocumentUnmodified { document: label });
        }
        Ok(outcome)
    }

    /// Read concatenated JSON documents from `input` and write each changed
    /// document as one line to `output`, in input order.
    ///
    /// Output is flushed after every emitted line, so documents written before
    /// a fatal error remain valid.
    pub fn run<R: Read, W: Write>(
        &self,
        input: R,
        mut output: W,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<ReconcileSummary, ReconcileError> {
        let mut summary = ReconcileSummary::default();
        let stream = serde_json::Deserializer::from_reader(BufReader::new(input)).into_iter::<Value>();
        for next in stream {
            let mut document = next?;
            let outcome = self.reconcile_document(&mut document, sink)?;
            if outcome.changed {
                serde_json::to_writer(&mut output, &document)?;
                output.write_all(b"\n")?;
                output.flush()?;
            }
            summary.record(&outcome);
        }
        info!(
            "[reconcile] stream done (read={}, emitted={}, resolved={}, unresolved={}, skipped={})",
            summary.documents_read,
            summary.documents_emitted,
            summary.descriptors_resolved,
            summary.descriptors_unresolved,
            summary.descriptors_skipped
        );
        Ok(summary)
    }
}
