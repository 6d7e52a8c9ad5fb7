//! Appending overlay streams to a page's `/Contents`
//!
//! Pages paint their content streams in array order, so pushing a stream to
//! the end of `/Contents` draws it over everything already there. Existing
//! streams are never decoded or rewritten.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, warn};

use crate::document::page_dict_mut;
use crate::error::{PdfPatchError, Result};

/// Wrap `bytes` in a new stream object and paint it after the page's
/// existing content. Returns the new stream's id.
pub fn append_content_stream(
    doc: &mut Document,
    page_id: ObjectId,
    bytes: Vec<u8>,
    compress: bool,
) -> Result<ObjectId> {
    let stream_id = add_stream(doc, bytes, compress);
    push_contents(doc, page_id, vec![Object::Reference(stream_id)])?;
    Ok(stream_id)
}

/// Bracket the page's current content with `q` ... `Q` so a transform left
/// active by the original streams does not apply to later overlays.
pub fn isolate_page_state(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let save_id = add_stream(doc, b"q\n".to_vec(), false);
    let restore_id = add_stream(doc, b"Q\n".to_vec(), false);

    let mut existing = current_contents(doc, page_id)?;
    let mut wrapped = Vec::with_capacity(existing.len() + 2);
    wrapped.push(Object::Reference(save_id));
    wrapped.append(&mut existing);
    wrapped.push(Object::Reference(restore_id));

    set_contents(doc, page_id, wrapped)
}

fn add_stream(doc: &mut Document, bytes: Vec<u8>, compress: bool) -> ObjectId {
    let mut stream = Stream::new(Dictionary::new(), bytes);
    if compress {
        if let Err(e) = stream.compress() {
            warn!("Overlay stream left uncompressed: {}", e);
        }
    }
    doc.add_object(stream)
}

/// Stream references currently listed in `/Contents`, in paint order.
fn current_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|e| PdfPatchError::ResourceAllocation(e.to_string()))?;

    Ok(match page.get(b"Contents") {
        Ok(Object::Array(arr)) => arr.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr.clone(),
            Ok(Object::Stream(_)) => vec![Object::Reference(*id)],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    })
}

/// Replace `/Contents` with an inline array.
fn set_contents(doc: &mut Document, page_id: ObjectId, contents: Vec<Object>) -> Result<()> {
    page_dict_mut(doc, page_id)?.set("Contents", Object::Array(contents));
    Ok(())
}

fn push_contents(doc: &mut Document, page_id: ObjectId, mut refs: Vec<Object>) -> Result<()> {
    // An indirect contents array is extended where it lives
    let indirect_array = {
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|e| PdfPatchError::ResourceAllocation(e.to_string()))?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) if matches!(doc.get_object(*id), Ok(Object::Array(_))) => {
                Some(*id)
            }
            _ => None,
        }
    };

    if let Some(array_id) = indirect_array {
        if let Ok(Object::Array(arr)) = doc.get_object_mut(array_id) {
            arr.append(&mut refs);
        }
        return Ok(());
    }

    let page = page_dict_mut(doc, page_id)?;
    match page.get_mut(b"Contents") {
        Ok(Object::Array(arr)) => arr.append(&mut refs),
        Ok(Object::Reference(existing)) => {
            let mut contents = vec![Object::Reference(*existing)];
            contents.append(&mut refs);
            page.set("Contents", Object::Array(contents));
        }
        Ok(other) => {
            debug!("Replacing malformed Contents {:?} on page {:?}", other, page_id);
            page.set("Contents", Object::Array(refs));
        }
        Err(_) => page.set("Contents", Object::Array(refs)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{build_document, ContentsLayout, PageSpec};
    use pretty_assertions::assert_eq;

    fn first_page(doc: &Document) -> ObjectId {
        *doc.get_pages().values().next().unwrap()
    }

    fn contents_of(doc: &Document, page_id: ObjectId) -> Object {
        doc.get_object(page_id)
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .clone()
    }

    fn stream_bytes(doc: &Document, id: ObjectId) -> Vec<u8> {
        doc.get_object(id).unwrap().as_stream().unwrap().content.clone()
    }

    #[test]
    fn test_single_reference_becomes_two_element_array() {
        let mut doc = build_document(&[PageSpec::letter("orig")]);
        let page_id = first_page(&doc);
        let original = match contents_of(&doc, page_id) {
            Object::Reference(id) => id,
            other => panic!("unexpected contents {:?}", other),
        };
        let original_bytes = stream_bytes(&doc, original);

        let new_id = append_content_stream(&mut doc, page_id, b"q Q".to_vec(), false).unwrap();

        assert_eq!(
            contents_of(&doc, page_id),
            Object::Array(vec![Object::Reference(original), Object::Reference(new_id)])
        );
        assert_eq!(stream_bytes(&doc, original), original_bytes);
        assert_eq!(stream_bytes(&doc, new_id), b"q Q".to_vec());
    }

    #[test]
    fn test_array_is_extended_at_the_end() {
        let mut doc = build_document(&[PageSpec::letter("orig").contents(ContentsLayout::Array)]);
        let page_id = first_page(&doc);

        let a = append_content_stream(&mut doc, page_id, b"a".to_vec(), false).unwrap();
        let b = append_content_stream(&mut doc, page_id, b"b".to_vec(), false).unwrap();

        let arr = contents_of(&doc, page_id).as_array().unwrap().clone();
        assert_eq!(arr.len(), 4);
        assert_eq!(arr[2], Object::Reference(a));
        assert_eq!(arr[3], Object::Reference(b));
    }

    #[test]
    fn test_missing_contents_created() {
        let mut doc = build_document(&[PageSpec::letter("").contents(ContentsLayout::Missing)]);
        let page_id = first_page(&doc);

        let id = append_content_stream(&mut doc, page_id, b"x".to_vec(), false).unwrap();
        assert_eq!(
            contents_of(&doc, page_id),
            Object::Array(vec![Object::Reference(id)])
        );
    }

    #[test]
    fn test_malformed_contents_replaced() {
        let mut doc = build_document(&[PageSpec::letter("")]);
        let page_id = first_page(&doc);
        page_dict_mut(&mut doc, page_id)
            .unwrap()
            .set("Contents", Object::Integer(3));

        let id = append_content_stream(&mut doc, page_id, b"x".to_vec(), false).unwrap();
        assert_eq!(
            contents_of(&doc, page_id),
            Object::Array(vec![Object::Reference(id)])
        );
    }

    #[test]
    fn test_indirect_contents_array_extended_in_place() {
        let mut doc = build_document(&[PageSpec::letter("orig")]);
        let page_id = first_page(&doc);
        let original = contents_of(&doc, page_id);
        let array_id = doc.add_object(Object::Array(vec![original.clone()]));
        page_dict_mut(&mut doc, page_id)
            .unwrap()
            .set("Contents", Object::Reference(array_id));

        let id = append_content_stream(&mut doc, page_id, b"x".to_vec(), false).unwrap();

        assert_eq!(contents_of(&doc, page_id), Object::Reference(array_id));
        assert_eq!(
            doc.get_object(array_id).unwrap(),
            &Object::Array(vec![original, Object::Reference(id)])
        );
    }

    #[test]
    fn test_compressed_stream_has_flate_filter() {
        let mut doc = build_document(&[PageSpec::letter("orig")]);
        let page_id = first_page(&doc);
        let payload = b"q 1 1 1 rg 0 0 10 10 re f Q\n".repeat(20);

        let id = append_content_stream(&mut doc, page_id, payload.clone(), true).unwrap();
        let stream = doc.get_object(id).unwrap().as_stream().unwrap();
        assert_eq!(
            stream.dict.get(b"Filter").unwrap(),
            &Object::Name(b"FlateDecode".to_vec())
        );
        assert_eq!(stream.decompressed_content().unwrap(), payload);
    }

    #[test]
    fn test_isolation_brackets_original_content() {
        let mut doc = build_document(&[PageSpec::letter("orig")]);
        let page_id = first_page(&doc);
        let original = contents_of(&doc, page_id);

        isolate_page_state(&mut doc, page_id).unwrap();
        let overlay = append_content_stream(&mut doc, page_id, b"x".to_vec(), false).unwrap();

        let arr = contents_of(&doc, page_id).as_array().unwrap().clone();
        assert_eq!(arr.len(), 4);
        assert_eq!(arr[1], original);
        assert_eq!(arr[3], Object::Reference(overlay));
        let save = arr[0].as_reference().unwrap();
        let restore = arr[2].as_reference().unwrap();
        assert_eq!(stream_bytes(&doc, save), b"q\n".to_vec());
        assert_eq!(stream_bytes(&doc, restore), b"Q\n".to_vec());
    }
}
