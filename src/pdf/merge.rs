//! PDF merging and page extraction using lopdf

use std::collections::{BTreeMap, HashSet};
use std::io::{BufWriter, Write};
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::pdf::validate::load_valid_pdf;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Merge one or two downloaded page buffers into a single PDF on disk
///
/// Both buffers are validated before anything is written: if either fails to
/// parse or has no pages, no output file is created. An existing file at
/// `output_path` is overwritten.
///
/// Returns the number of pages written.
pub fn merge_page_buffers(
    primary: &[u8],
    secondary: Option<&[u8]>,
    output_path: &Path,
) -> Result<usize> {
    let mut documents = vec![load_page_buffer(primary, "primary")?];
    if let Some(bytes) = secondary {
        documents.push(load_page_buffer(bytes, "secondary")?);
    }

    let mut merged = merge_documents(documents)?;
    let page_count = merged.get_pages().len();

    merged.compress();
    write_document(&mut merged, output_path)?;

    Ok(page_count)
}

fn load_page_buffer(bytes: &[u8], label: &str) -> Result<Document> {
    load_valid_pdf(bytes).map_err(|e| match e {
        Error::InvalidPdf(reason) => Error::InvalidPdf(format!("{label} page: {reason}")),
        other => other,
    })
}

/// Merge documents into one, keeping their pages in order
///
/// Based on the lopdf merge example:
/// https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs
pub fn merge_documents(documents: Vec<Document>) -> Result<Document> {
    let version = match documents.first() {
        Some(doc) => doc.version.clone(),
        None => return Err(Error::InvalidPdf("No documents to merge".to_string())),
    };

    // Define a starting max_id for merged document
    let mut max_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        page_ids.extend(doc.get_pages().into_values());
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version(version);
    merged.objects.extend(objects);

    // new_object_id() must hand out IDs above everything we just added
    merged.max_id = max_id - 1;

    // Old page tree nodes are still present, so inherited attributes can be resolved
    for &page_id in &page_ids {
        let inherited = inherited_attributes(&merged, page_id)?;
        let page = merged.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            page.set(key, value);
        }
    }

    rebuild_page_tree(&mut merged, &page_ids);
    merged.prune_objects();

    Ok(merged)
}

/// Copy the given 1-based pages of a document into a new document
pub fn extract_pages(doc: &Document, page_numbers: &[u32]) -> Result<Document> {
    let pages = doc.get_pages();
    let total = u32::try_from(pages.len()).unwrap_or(u32::MAX);

    let page_ids = page_numbers
        .iter()
        .map(|number| {
            pages.get(number).copied().ok_or(Error::PageOutOfRange {
                page: *number,
                total,
            })
        })
        .collect::<Result<Vec<ObjectId>>>()?;

    extract_page_ids(doc, &page_ids)
}

/// Build a document holding only `page_ids` and the objects they reach
///
/// The source document is only read. Object IDs are kept, so the work is
/// proportional to the extracted pages rather than to the whole source.
pub(crate) fn extract_page_ids(doc: &Document, page_ids: &[ObjectId]) -> Result<Document> {
    let mut extracted = Document::with_version(doc.version.clone());
    extracted.max_id = doc.max_id;

    let mut pending: Vec<ObjectId> = Vec::new();
    for &page_id in page_ids {
        let mut page = doc.get_dictionary(page_id)?.clone();
        for (key, value) in inherited_attributes(doc, page_id)? {
            page.set(key, value);
        }
        page.remove(b"Parent");

        let page = Object::Dictionary(page);
        collect_references(&page, &mut pending);
        extracted.objects.insert(page_id, page);
    }

    while let Some(id) = pending.pop() {
        if extracted.objects.contains_key(&id) {
            continue;
        }
        // Dangling references stay dangling; readers treat them as null
        let Ok(object) = doc.get_object(id) else {
            continue;
        };
        if is_page_tree_node(object) {
            continue;
        }

        collect_references(object, &mut pending);
        extracted.objects.insert(id, object.clone());
    }

    rebuild_page_tree(&mut extracted, page_ids);

    Ok(extracted)
}

/// Push every object ID referenced from `object` onto `out`
fn collect_references(object: &Object, out: &mut Vec<ObjectId>) {
    let dict = match object {
        Object::Reference(id) => {
            out.push(*id);
            return;
        }
        Object::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
            return;
        }
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return,
    };

    for (_, value) in dict.iter() {
        collect_references(value, out);
    }
}

/// Pages and page tree nodes outside the extracted set are never copied
fn is_page_tree_node(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => matches!(
            dict.get(b"Type").and_then(Object::as_name),
            Ok(b"Pages") | Ok(b"Page")
        ),
        _ => false,
    }
}

/// Serialize a document to `path`, replacing any existing file
///
/// The document is written to a temporary file next to `path` and renamed into
/// place, so a failed write leaves any previous file untouched.
pub fn write_document(doc: &mut Document, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let write_failed = |reason: String| Error::WriteFailed {
        path: path.to_path_buf(),
        reason,
    };

    let mut staged = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        doc.save_to(&mut writer).map_err(|e| write_failed(e.to_string()))?;
        writer.flush()?;
    }

    staged.persist(path).map_err(|e| write_failed(e.error.to_string()))?;

    Ok(())
}

/// Give `page_ids` a fresh flat page tree and catalog
///
/// Pages must already carry every attribute they used to inherit.
fn rebuild_page_tree(doc: &mut Document, page_ids: &[ObjectId]) {
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(page_ids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));

    let catalog_id = doc.new_object_id();
    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));

    doc.objects.insert(catalog_id, Object::Dictionary(catalog));
    doc.objects.insert(pages_id, Object::Dictionary(pages_object));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    for &page_id in page_ids {
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", Object::Reference(pages_id));
        }
    }
}

/// Inheritable attributes the page lacks, resolved from its ancestors
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Result<Vec<(Vec<u8>, Object)>> {
    let page = doc.get_dictionary(page_id)?;

    let mut missing: Vec<&[u8]> = INHERITABLE_ATTRIBUTES
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    let mut inherited: Vec<(Vec<u8>, Object)> = Vec::new();
    let mut visited: HashSet<ObjectId> = HashSet::new();

    while let Some(node_id) = parent {
        if missing.is_empty() || !visited.insert(node_id) {
            break;
        }

        let node = doc.get_dictionary(node_id)?;
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                inherited.push((key.to_vec(), value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(inherited)
}
