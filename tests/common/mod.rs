//! Shared helpers for integration tests

use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;

/// A document with one page per label, each page's content naming its label
pub fn labelled_document(labels: &[&str]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for label in labels {
        // Padding keeps single-page buffers above the placeholder threshold
        let content = format!("% {label}\n%{}\n", "-".repeat(1500)).into_bytes();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => labels.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

pub fn labelled_bytes(labels: &[&str]) -> Vec<u8> {
    let mut buffer = Vec::new();
    labelled_document(labels)
        .save_to(&mut buffer)
        .expect("Failed to serialize PDF");
    buffer
}

/// Labels of every page of the PDF at `path`, in page order
pub fn labels_in(path: &Path) -> Vec<String> {
    let doc = Document::load(path).expect("Failed to load PDF");
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let content = doc
                .get_page_content(page_id)
                .expect("Failed to read page content");
            String::from_utf8_lossy(&content)
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("% ")
                .to_string()
        })
        .collect()
}
