//! Font resource injection
//!
//! Every overlay shows its text with one non-embedded base-14 font registered
//! in the page's `/Resources /Font` dictionary. The font dictionary itself is
//! a single indirect object shared by all pages of the document.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use tracing::debug;

use crate::document::{inherited_attribute, page_dict_mut, resolve};
use crate::error::{PdfPatchError, Result};

/// Resource name the overlay font is registered under.
pub const OVERLAY_FONT_NAME: &str = "PatchHelv";

const OVERLAY_BASE_FONT: &[u8] = b"Helvetica";
const OVERLAY_ENCODING: &[u8] = b"WinAnsiEncoding";

/// Names tried after [`OVERLAY_FONT_NAME`] when a foreign font already uses it
const MAX_NAME_SUFFIX: usize = 64;

/// Font resource attached to a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontResource {
    pub name: String,
    /// `None` when the page holds the font dictionary inline
    pub font_id: Option<ObjectId>,
    /// False when the page already had the entry
    pub inserted: bool,
}

fn overlay_font_dict() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(OVERLAY_BASE_FONT.to_vec()),
        "Encoding" => Object::Name(OVERLAY_ENCODING.to_vec()),
    }
}

fn is_overlay_font(dict: &Dictionary) -> bool {
    let name_is = |key: &[u8], expected: &[u8]| {
        matches!(dict.get(key), Ok(Object::Name(name)) if name.as_slice() == expected)
    };
    name_is(b"Type", b"Font")
        && name_is(b"Subtype", b"Type1")
        && name_is(b"BaseFont", OVERLAY_BASE_FONT)
        && name_is(b"Encoding", OVERLAY_ENCODING)
}

fn graph_error(context: &str, e: lopdf::Error) -> PdfPatchError {
    PdfPatchError::ResourceAllocation(format!("{}: {}", context, e))
}

/// Where a page's resource dictionary lives
#[derive(Debug, Clone, Copy)]
enum ResourcesAt {
    Page,
    Object(ObjectId),
}

/// Where the `/Font` sub-dictionary lives
#[derive(Debug, Clone, Copy)]
enum FontsAt {
    Resources,
    Object(ObjectId),
}

fn resources<'a>(doc: &'a Document, page_id: ObjectId, at: ResourcesAt) -> Result<&'a Dictionary> {
    let dict = match at {
        ResourcesAt::Object(id) => doc.get_object(id).and_then(Object::as_dict),
        ResourcesAt::Page => doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .and_then(|page| page.get(b"Resources"))
            .and_then(Object::as_dict),
    };
    dict.map_err(|e| graph_error("Resources", e))
}

fn resources_mut<'a>(
    doc: &'a mut Document,
    page_id: ObjectId,
    at: ResourcesAt,
) -> Result<&'a mut Dictionary> {
    let dict = match at {
        ResourcesAt::Object(id) => doc.get_object_mut(id).and_then(Object::as_dict_mut),
        ResourcesAt::Page => doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .and_then(|page| page.get_mut(b"Resources"))
            .and_then(Object::as_dict_mut),
    };
    dict.map_err(|e| graph_error("Resources", e))
}

fn fonts<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    res_at: ResourcesAt,
    fonts_at: FontsAt,
) -> Result<&'a Dictionary> {
    match fonts_at {
        FontsAt::Object(id) => doc
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(|e| graph_error("Font", e)),
        FontsAt::Resources => resources(doc, page_id, res_at)?
            .get(b"Font")
            .and_then(Object::as_dict)
            .map_err(|e| graph_error("Font", e)),
    }
}

fn fonts_mut<'a>(
    doc: &'a mut Document,
    page_id: ObjectId,
    res_at: ResourcesAt,
    fonts_at: FontsAt,
) -> Result<&'a mut Dictionary> {
    match fonts_at {
        FontsAt::Object(id) => doc
            .get_object_mut(id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| graph_error("Font", e)),
        FontsAt::Resources => resources_mut(doc, page_id, res_at)?
            .get_mut(b"Font")
            .and_then(Object::as_dict_mut)
            .map_err(|e| graph_error("Font", e)),
    }
}

/// Make sure the page carries its own resource dictionary and report where.
///
/// A page without `/Resources` gets a copy of the inherited dictionary (or an
/// empty one), so fonts added for the overlay never hide resources the
/// original content depends on.
fn prepare_resources(doc: &mut Document, page_id: ObjectId) -> Result<ResourcesAt> {
    let page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| graph_error("page", e))?;

    let fresh = match page.get(b"Resources") {
        Ok(Object::Dictionary(_)) => return Ok(ResourcesAt::Page),
        Ok(Object::Reference(id)) if doc.get_object(*id).and_then(Object::as_dict).is_ok() => {
            return Ok(ResourcesAt::Object(*id));
        }
        Ok(_) => {
            debug!("Replacing malformed Resources on page {:?}", page_id);
            Dictionary::new()
        }
        Err(_) => {
            let parent = match page.get(b"Parent") {
                Ok(Object::Reference(parent)) => Some(*parent),
                _ => None,
            };
            parent
                .and_then(|parent| inherited_attribute(doc, parent, b"Resources"))
                .and_then(|obj| obj.as_dict().ok())
                .cloned()
                .unwrap_or_else(Dictionary::new)
        }
    };

    page_dict_mut(doc, page_id)?.set("Resources", fresh);
    Ok(ResourcesAt::Page)
}

fn prepare_fonts(doc: &mut Document, page_id: ObjectId, res_at: ResourcesAt) -> Result<FontsAt> {
    let res = resources(doc, page_id, res_at)?;
    match res.get(b"Font") {
        Ok(Object::Dictionary(_)) => return Ok(FontsAt::Resources),
        Ok(Object::Reference(id)) if doc.get_object(*id).and_then(Object::as_dict).is_ok() => {
            return Ok(FontsAt::Object(*id));
        }
        _ => {}
    }

    resources_mut(doc, page_id, res_at)?.set("Font", Dictionary::new());
    Ok(FontsAt::Resources)
}

/// Registers the overlay font on pages, creating the shared font object on
/// first use.
#[derive(Debug, Default)]
pub struct ResourceInjector {
    font_id: Option<ObjectId>,
}

impl ResourceInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure `page.Resources.Font.<name>` refers to the overlay font and
    /// return the name to select in content streams.
    ///
    /// Idempotent: a page that already has an equivalent entry is left
    /// untouched. A foreign font squatting on the name is kept and a suffixed
    /// name is used instead.
    pub fn ensure_overlay_font(
        &mut self,
        doc: &mut Document,
        page_id: ObjectId,
    ) -> Result<FontResource> {
        let res_at = prepare_resources(doc, page_id)?;
        let fonts_at = prepare_fonts(doc, page_id, res_at)?;

        let (name, existing) = {
            let fonts = fonts(doc, page_id, res_at, fonts_at)?;
            let mut chosen = None;
            for suffix in 0..=MAX_NAME_SUFFIX {
                let candidate = if suffix == 0 {
                    OVERLAY_FONT_NAME.to_string()
                } else {
                    format!("{}{}", OVERLAY_FONT_NAME, suffix)
                };
                match fonts.get(candidate.as_bytes()) {
                    Err(_) => {
                        chosen = Some((candidate, None));
                        break;
                    }
                    Ok(entry) => {
                        let reusable = resolve(doc, entry)
                            .as_dict()
                            .map(is_overlay_font)
                            .unwrap_or(false);
                        if reusable {
                            let id = match entry {
                                Object::Reference(id) => Some(*id),
                                _ => None,
                            };
                            chosen = Some((candidate, Some(id)));
                            break;
                        }
                    }
                }
            }
            chosen.ok_or_else(|| {
                PdfPatchError::ResourceAllocation(format!(
                    "no free font resource name on page {:?}",
                    page_id
                ))
            })?
        };

        // Inline equivalent dictionaries are reused as they are
        if let Some(font_id) = existing {
            return Ok(FontResource {
                name,
                font_id,
                inserted: false,
            });
        }

        let font_id = self.font_object(doc);
        let fonts = fonts_mut(doc, page_id, res_at, fonts_at)?;
        fonts.set(name.as_bytes(), Object::Reference(font_id));
        debug!("Registered /{} on page {:?}", name, page_id);

        Ok(FontResource {
            name,
            font_id: Some(font_id),
            inserted: true,
        })
    }

    fn font_object(&mut self, doc: &mut Document) -> ObjectId {
        *self
            .font_id
            .get_or_insert_with(|| doc.add_object(overlay_font_dict()))
    }
}
