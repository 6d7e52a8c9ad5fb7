//! Apply directives to PDF documents

use std::collections::HashSet;
use std::path::Path;

use lopdf::ObjectId;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::appender::{append_content_stream, isolate_page_state};
use crate::compositor::{compose_fragment, OverlayGeometry};
use crate::coords::layout_to_user;
use crate::directive::Directive;
use crate::document::PatchDocument;
use crate::encoding::encode_win_ansi;
use crate::error::{PdfPatchError, Result};
use crate::options::{FailurePolicy, MutationOptions};
use crate::resources::ResourceInjector;

/// What happened to one directive.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DirectiveOutcome {
    Applied {
        /// Object number of the overlay stream
        stream: u32,
        font_resource: String,
        /// Characters replaced because WinAnsiEncoding lacks them
        substituted: usize,
    },
    Skipped {
        reason: String,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DirectiveReport {
    /// Position in the directive list
    pub index: usize,
    /// Page index as given in the directive
    pub page: i64,
    #[serde(flatten)]
    pub outcome: DirectiveOutcome,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MutationReport {
    pub page_count: usize,
    pub outcomes: Vec<DirectiveReport>,
}

impl MutationReport {
    fn count(&self, pred: impl Fn(&DirectiveOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, DirectiveOutcome::Applied { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DirectiveOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DirectiveOutcome::Failed { .. }))
    }
}

/// Serialized output of [`PdfMutator::mutate_bytes`].
#[derive(Debug, Clone)]
pub struct MutationOutput {
    pub bytes: Vec<u8>,
    pub report: MutationReport,
}

struct Applied {
    stream_id: ObjectId,
    font_resource: String,
    substituted: usize,
}

/// Per-document orchestration: open, apply every directive in order, save.
#[derive(Debug, Clone, Default)]
pub struct PdfMutator {
    options: MutationOptions,
}

impl PdfMutator {
    pub fn new(options: MutationOptions) -> Self {
        Self { options }
    }

    /// Apply `directives` in list order to an open document.
    ///
    /// Directives for pages outside the document are skipped. Other
    /// per-directive failures are recorded and skipped under
    /// [`FailurePolicy::Continue`], or returned under [`FailurePolicy::Abort`].
    pub fn apply(
        &self,
        doc: &mut PatchDocument,
        directives: &[Directive],
    ) -> Result<MutationReport> {
        let mut report = MutationReport {
            page_count: doc.page_count(),
            outcomes: Vec::with_capacity(directives.len()),
        };
        let mut injector = ResourceInjector::new();
        let mut isolated = HashSet::new();

        for (index, directive) in directives.iter().enumerate() {
            let page = directive.page_index;
            let target = directive
                .page_position()
                .and_then(|position| doc.page_object(position).map(|id| (position, id)));

            let outcome = match target {
                None => {
                    warn!(
                        "Directive {} targets page {} of {}, skipping",
                        index,
                        page,
                        doc.page_count()
                    );
                    DirectiveOutcome::Skipped {
                        reason: format!("page {} not found", page),
                    }
                }
                Some((position, page_id)) => {
                    let result = self.apply_one(
                        doc,
                        &mut injector,
                        &mut isolated,
                        position,
                        page_id,
                        directive,
                    );
                    match result {
                        Ok(applied) => DirectiveOutcome::Applied {
                            stream: applied.stream_id.0,
                            font_resource: applied.font_resource,
                            substituted: applied.substituted,
                        },
                        Err(e) if self.aborts_batch(&e) => {
                            warn!("Directive {} failed, aborting batch: {}", index, e);
                            return Err(e);
                        }
                        Err(e) => {
                            warn!("Directive {} failed: {}", index, e);
                            DirectiveOutcome::Failed {
                                message: e.to_string(),
                            }
                        }
                    }
                }
            };

            report.outcomes.push(DirectiveReport {
                index,
                page,
                outcome,
            });
        }

        info!(
            "Applied {} directive(s): {} skipped, {} failed",
            report.applied(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    /// Fatal errors end the batch under any policy.
    fn aborts_batch(&self, err: &PdfPatchError) -> bool {
        err.is_fatal() || self.options.failure_policy == FailurePolicy::Abort
    }

    fn apply_one(
        &self,
        doc: &mut PatchDocument,
        injector: &mut ResourceInjector,
        isolated: &mut HashSet<ObjectId>,
        position: usize,
        page_id: ObjectId,
        directive: &Directive,
    ) -> Result<Applied> {
        directive.validate()?;

        let bounds = doc.page_bounds(position)?;
        let origin = layout_to_user(&bounds, &directive.rect);
        let geometry = OverlayGeometry::compute(origin, &directive.rect);
        debug!(
            "Page {}: {:?} -> {:?} replaces {:?}",
            directive.page_index, directive.rect, geometry, directive.original_text
        );

        // Encode first so a rejected string leaves the page untouched
        let encoded = encode_win_ansi(&directive.replacement_text, self.options.unsupported_chars)?;

        let font = injector.ensure_overlay_font(doc.inner_mut(), page_id)?;

        if self.options.isolate_page_state && isolated.insert(page_id) {
            isolate_page_state(doc.inner_mut(), page_id)?;
        }

        let fragment = compose_fragment(&geometry, &directive.color, &font.name, &encoded.bytes);
        let stream_id = append_content_stream(
            doc.inner_mut(),
            page_id,
            fragment,
            self.options.compress_overlays,
        )?;

        Ok(Applied {
            stream_id,
            font_resource: font.name,
            substituted: encoded.substituted,
        })
    }

    /// Open `bytes`, apply `directives` and serialize the result.
    pub fn mutate_bytes(&self, bytes: &[u8], directives: &[Directive]) -> Result<MutationOutput> {
        let mut doc = PatchDocument::load_mem(bytes)?;
        info!(
            "Mutating {} byte document: {} page(s), {} directive(s)",
            bytes.len(),
            doc.page_count(),
            directives.len()
        );

        let report = self.apply(&mut doc, directives)?;
        let bytes = doc.save_to_bytes()?;
        Ok(MutationOutput { bytes, report })
    }

    /// Open `input`, apply `directives` and save to `output`. Nothing is
    /// written to `output` unless every fatal step succeeds.
    pub fn mutate_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        directives: &[Directive],
    ) -> Result<MutationReport> {
        let mut doc = PatchDocument::open(input.as_ref())?;
        info!(
            "Mutating {}: {} page(s), {} directive(s)",
            input.as_ref().display(),
            doc.page_count(),
            directives.len()
        );

        let report = self.apply(&mut doc, directives)?;
        doc.save(output.as_ref())?;
        Ok(report)
    }
}
