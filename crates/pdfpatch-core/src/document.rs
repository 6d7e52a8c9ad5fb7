//! Owned handle on a parsed PDF
//!
//! Wraps `lopdf::Document` with page lookup by 0-based index, page-box
//! resolution and failure-safe saving. A `PatchDocument` is never shared:
//! mutation takes `&mut self`, so one document can only be edited by one
//! caller at a time.

use std::io::Write;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::coords::PageBounds;
use crate::error::{PdfPatchError, Result};

/// Maximum `Parent` hops when resolving inherited page attributes
const MAX_INHERIT_DEPTH: usize = 32;

pub struct PatchDocument {
    doc: Document,
    pages: Vec<ObjectId>,
}

impl PatchDocument {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path)
            .map_err(|e| PdfPatchError::OpenFailure(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_document(doc))
    }

    pub fn load_mem(bytes: &[u8]) -> Result<Self> {
        let doc =
            Document::load_mem(bytes).map_err(|e| PdfPatchError::OpenFailure(e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: Document) -> Self {
        // get_pages() is keyed by 1-based page number, so values are in page order
        let pages = doc.get_pages().into_values().collect();
        Self { doc, pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page object id for a 0-based index.
    pub fn page_object(&self, page_index: usize) -> Option<ObjectId> {
        self.pages.get(page_index).copied()
    }

    /// Unscaled visible box of a page: CropBox if present, else MediaBox,
    /// both inheritable. Falls back to US Letter.
    pub fn page_bounds(&self, page_index: usize) -> Result<PageBounds> {
        let page_id = self
            .page_object(page_index)
            .ok_or(PdfPatchError::PageNotFound {
                index: page_index,
                count: self.page_count(),
            })?;

        let bounds = [b"CropBox".as_slice(), b"MediaBox".as_slice()]
            .into_iter()
            .find_map(|key| {
                inherited_attribute(&self.doc, page_id, key)
                    .and_then(|obj| self.rect_from(obj))
            })
            .unwrap_or(PageBounds::LETTER);

        Ok(bounds)
    }

    fn rect_from(&self, obj: &Object) -> Option<PageBounds> {
        let arr = obj.as_array().ok()?;
        if arr.len() != 4 {
            return None;
        }
        let mut corners = [0.0f64; 4];
        for (slot, value) in corners.iter_mut().zip(arr) {
            *slot = match resolve(&self.doc, value) {
                Object::Integer(i) => *i as f64,
                Object::Real(r) => *r as f64,
                _ => return None,
            };
        }
        let bounds = PageBounds::from_corners(corners);
        (bounds.width() > 0.0 && bounds.height() > 0.0).then_some(bounds)
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &Document {
        &self.doc
    }

    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| PdfPatchError::SaveFailure(e.to_string()))?;
        Ok(output)
    }

    /// Serialize to `path`. The bytes go to a temporary file next to the
    /// target, which only replaces it once fully written.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.save_to_bytes()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = tempfile::Builder::new()
            .prefix(".pdfpatch-")
            .suffix(".pdf")
            .tempfile_in(dir)
            .map_err(|e| PdfPatchError::SaveFailure(e.to_string()))?;
        temp.write_all(&bytes)
            .map_err(|e| PdfPatchError::SaveFailure(e.to_string()))?;
        temp.persist(path)
            .map_err(|e| PdfPatchError::SaveFailure(e.error.to_string()))?;

        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

/// Look up `key` on the page or the nearest ancestor that defines it,
/// following one level of indirection on the value.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..MAX_INHERIT_DEPTH {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value));
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return None,
        }
    }
    None
}

/// Follow a reference one level; other objects are returned as is.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

pub(crate) fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfPatchError::ResourceAllocation(format!("page {:?}: {}", page_id, e)))
}
