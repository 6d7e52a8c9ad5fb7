//! Property tests for overlay mutation through the public API
//!
//! Documents are generated with lopdf, mutated with arbitrary directive
//! batches, then re-parsed to check the structural guarantees: pages are
//! never added, removed or reordered, original content streams keep their
//! bytes, and each applied directive adds exactly one stream at the end.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use pdfpatch_core::{
    Directive, DirectiveOutcome, LayoutRect, MutationOptions, PdfMutator, RgbColor,
};
use proptest::prelude::*;

fn make_pdf(page_count: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids = Vec::new();
    for i in 0..page_count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {}", i + 1))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

fn contents(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
    match page.get(b"Contents").unwrap() {
        Object::Reference(id) => vec![*id],
        Object::Array(arr) => arr.iter().map(|o| o.as_reference().unwrap()).collect(),
        other => panic!("unexpected Contents {:?}", other),
    }
}

fn page_marker(doc: &Document, page_id: ObjectId) -> Vec<u8> {
    let first = contents(doc, page_id)[0];
    doc.get_object(first)
        .unwrap()
        .as_stream()
        .unwrap()
        .content
        .clone()
}

fn directive_strategy(pages: std::ops::Range<i64>) -> impl Strategy<Value = Directive> {
    (
        pages,
        "[a-zA-Z0-9 ]{0,12}",
        0.0f64..560.0,
        0.0f64..760.0,
        1.0f64..120.0,
        4.0f64..30.0,
        0.0f64..=1.0,
    )
        .prop_map(|(page, text, x, y, w, h, gray)| {
            Directive::new(page, text, LayoutRect::new(x, y, w, h))
                .with_color(RgbColor::new(gray, gray, gray))
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: page count and order survive any batch, out-of-range pages included
    #[test]
    fn pages_preserved(
        page_count in 1usize..4,
        directives in prop::collection::vec(directive_strategy(-2..6), 0..8),
    ) {
        let pdf = make_pdf(page_count);
        let before = Document::load_mem(&pdf).unwrap();
        let before_pages: Vec<ObjectId> = before.get_pages().into_values().collect();

        let output = PdfMutator::default().mutate_bytes(&pdf, &directives).unwrap();
        let after = Document::load_mem(&output.bytes).unwrap();
        let after_pages: Vec<ObjectId> = after.get_pages().into_values().collect();

        prop_assert_eq!(&before_pages, &after_pages);
        for page_id in &before_pages {
            prop_assert_eq!(page_marker(&before, *page_id), page_marker(&after, *page_id));
        }

        let expected_skips = directives
            .iter()
            .filter(|d| d.page_position().map_or(true, |p| p >= page_count))
            .count();
        prop_assert_eq!(output.report.skipped(), expected_skips);
        prop_assert_eq!(output.report.applied(), directives.len() - expected_skips);
    }

    /// Property: each applied directive appends exactly one stream, in order
    #[test]
    fn overlays_appended_in_order(
        directives in prop::collection::vec(directive_strategy(0..1), 1..6),
    ) {
        let pdf = make_pdf(1);
        let output = PdfMutator::default().mutate_bytes(&pdf, &directives).unwrap();
        let doc = Document::load_mem(&output.bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();

        let refs = contents(&doc, page_id);
        prop_assert_eq!(refs.len(), directives.len() + 1);

        let appended: Vec<u32> = output
            .report
            .outcomes
            .iter()
            .filter_map(|r| match r.outcome {
                DirectiveOutcome::Applied { stream, .. } => Some(stream),
                _ => None,
            })
            .collect();
        let tail: Vec<u32> = refs[1..].iter().map(|id| id.0).collect();
        prop_assert_eq!(tail, appended);
    }
}

#[test]
fn strict_options_reject_unsupported_text() {
    let pdf = make_pdf(1);
    let directives = vec![Directive::new(0, "日本", LayoutRect::new(10.0, 10.0, 40.0, 12.0))];

    let result = PdfMutator::new(MutationOptions::strict()).mutate_bytes(&pdf, &directives);
    assert!(result.is_err());
}

#[test]
fn directive_json_drives_mutation() {
    let json = r#"[
        {"page": 0, "orig": "Page 1", "text": "Page One", "x": 72, "y": 80, "width": 60, "height": 12},
        {"page": 4, "text": "nowhere", "x": 0, "y": 0, "width": 10, "height": 10, "r": 0.5, "g": 0.5, "b": 0.5}
    ]"#;
    let directives = Directive::from_json_list(json).unwrap();

    let output = PdfMutator::default()
        .mutate_bytes(&make_pdf(2), &directives)
        .unwrap();
    assert_eq!(output.report.applied(), 1);
    assert_eq!(output.report.skipped(), 1);
    assert_eq!(output.report.page_count, 2);
}
