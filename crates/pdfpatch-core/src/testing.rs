//! In-memory PDF fixtures for unit tests

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

#[derive(Clone, Copy, PartialEq)]
pub(crate) enum ContentsLayout {
    Reference,
    Array,
    Missing,
}

#[derive(Clone)]
pub(crate) struct PageSpec {
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub contents: ContentsLayout,
    pub resources: bool,
}

impl PageSpec {
    pub fn letter(text: &str) -> Self {
        Self::sized(612.0, 792.0, text)
    }

    pub fn sized(width: f64, height: f64, text: &str) -> Self {
        Self {
            width,
            height,
            text: text.to_string(),
            contents: ContentsLayout::Reference,
            resources: true,
        }
    }

    pub fn contents(mut self, layout: ContentsLayout) -> Self {
        self.contents = layout;
        self
    }

    pub fn without_resources(mut self) -> Self {
        self.resources = false;
        self
    }
}

fn page_content(text: &str) -> Vec<u8> {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 12.into()]),
            Operation::new("Td", vec![50.into(), 730.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    text.as_bytes().to_vec(),
                    lopdf::StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    content.encode().unwrap()
}

pub(crate) fn build_document(pages: &[PageSpec]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for spec in pages {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(spec.width as f32),
                Object::Real(spec.height as f32),
            ],
        };
        if spec.resources {
            page.set(
                "Resources",
                dictionary! { "Font" => dictionary! { "F1" => font_id } },
            );
        }
        match spec.contents {
            ContentsLayout::Reference => {
                let id = doc.add_object(Stream::new(Dictionary::new(), page_content(&spec.text)));
                page.set("Contents", id);
            }
            ContentsLayout::Array => {
                let first =
                    doc.add_object(Stream::new(Dictionary::new(), page_content(&spec.text)));
                let second = doc.add_object(Stream::new(Dictionary::new(), b"0 0 m".to_vec()));
                page.set(
                    "Contents",
                    vec![Object::Reference(first), Object::Reference(second)],
                );
            }
            ContentsLayout::Missing => {}
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

pub(crate) fn build_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = build_document(pages);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
