//! In-memory PDF builders shared by unit tests

use lopdf::{dictionary, Document, Object, Stream};

/// Build a document with one page per marker
///
/// Each page's content stream starts with `% page <marker>`. `padding` bytes of
/// comment filler are appended to the first page so the serialized document can
/// be pushed over the empty-page threshold. Page size and resources live on the
/// page tree node and are inherited by the pages.
pub fn build_document(markers: &[&str], padding: usize) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for (i, marker) in markers.iter().enumerate() {
        let mut content = format!("% page {marker}\n").into_bytes();
        if i == 0 && padding > 0 {
            content.extend(std::iter::repeat(b'%').take(padding));
            content.push(b'\n');
        }

        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => markers.len() as i64,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Resources" => dictionary! {},
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

pub fn document_bytes(markers: &[&str], padding: usize) -> Vec<u8> {
    let mut doc = build_document(markers, padding);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// A page buffer comfortably above the empty-page threshold
pub fn page_bytes(marker: &str) -> Vec<u8> {
    document_bytes(&[marker], 2000)
}

pub fn zero_page_document_bytes() -> Vec<u8> {
    document_bytes(&[], 0)
}

/// Markers of every page in page order
pub fn page_markers(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = doc.get_page_content(page_id).unwrap();
            String::from_utf8_lossy(&content)
                .lines()
                .find_map(|line| line.strip_prefix("% page "))
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}
