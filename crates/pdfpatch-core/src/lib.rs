//! In-place PDF text overlays
//!
//! Each [`Directive`] names a page, a box in top-left-origin layout
//! coordinates and a replacement string. Applying it appends a content
//! stream to that page which paints a background-colored rectangle over the
//! box and shows the new text on top. Existing content streams are never
//! decoded or rewritten.
//!
//! ```no_run
//! use pdfpatch_core::{Directive, LayoutRect, MutationOptions, PdfMutator};
//!
//! let directives = vec![Directive::new(0, "UCD", LayoutRect::new(50.0, 50.0, 50.0, 16.0))];
//! let report = PdfMutator::new(MutationOptions::default())
//!     .mutate_file("in.pdf", "out.pdf", &directives)?;
//! println!("{} applied", report.applied());
//! # Ok::<(), pdfpatch_core::PdfPatchError>(())
//! ```

pub mod appender;
pub mod compositor;
pub mod coords;
pub mod directive;
pub mod document;
pub mod encoding;
pub mod error;
pub mod mutator;
pub mod options;
pub mod resources;

#[cfg(test)]
mod testing;

pub use coords::{layout_to_user, PageBounds, UserPoint};
pub use directive::{Directive, LayoutRect, RgbColor};
pub use document::PatchDocument;
pub use error::{PdfPatchError, Result};
pub use mutator::{DirectiveOutcome, DirectiveReport, MutationOutput, MutationReport, PdfMutator};
pub use options::{FailurePolicy, MutationOptions, UnsupportedCharPolicy};

/// Layout-space geometry of one page, as reported to clients.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PageInfo {
    pub index: usize,
    pub x0: f64,
    pub y0: f64,
    pub width: f64,
    pub height: f64,
}

/// Visible box of every page in order.
pub fn page_info(bytes: &[u8]) -> Result<Vec<PageInfo>> {
    let doc = PatchDocument::load_mem(bytes)?;
    (0..doc.page_count())
        .map(|index| {
            let bounds = doc.page_bounds(index)?;
            Ok(PageInfo {
                index,
                x0: bounds.x0,
                y0: bounds.y0,
                width: bounds.width(),
                height: bounds.height(),
            })
        })
        .collect()
}
