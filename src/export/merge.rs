//! Page-level PDF merging
//!
//! Concatenates the page trees of several rendered documents into one
//! document without touching page content. Object ids of each input are
//! shifted past the previous input's ids so nothing collides.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use crate::error::{AppError, Result};

/// Page attributes that may be inherited from page tree ancestors
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic Parent chains in malformed input
const MAX_TREE_DEPTH: usize = 64;

/// Merge documents in order. Page order inside each input is preserved.
pub fn merge_documents(documents: &[Vec<u8>]) -> Result<Vec<u8>> {
    if documents.is_empty() {
        return Err(packaging("no documents to merge"));
    }

    let mut max_id = 1;
    let mut page_order: Vec<ObjectId> = Vec::new();
    let mut pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (index, bytes) in documents.iter().enumerate() {
        let mut doc = Document::load_mem(bytes)
            .map_err(|e| packaging(&format!("document {} is not a valid PDF: {}", index + 1, e)))?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        // get_pages is keyed by page number, so iteration follows page order
        for (_, page_id) in doc.get_pages() {
            let mut page = doc
                .get_dictionary(page_id)
                .map_err(|e| packaging(&e.to_string()))?
                .clone();
            // The old page tree is discarded, so anything inherited must move onto the page
            flatten_inherited(&doc, &mut page);
            page_order.push(page_id);
            pages.insert(page_id, Object::Dictionary(page));
        }
        objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    let page_ids: BTreeSet<ObjectId> = page_order.iter().copied().collect();

    // Old catalogs and page tree nodes are replaced by fresh ones below
    for (id, object) in objects {
        if page_ids.contains(&id) {
            continue;
        }
        match type_name(&object) {
            Some(b"Catalog") | Some(b"Pages") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                merged.objects.insert(id, object);
            }
        }
    }

    merged.max_id = max_id;
    let pages_id = merged.new_object_id();

    let mut kids = Vec::with_capacity(page_order.len());
    for page_id in &page_order {
        if let Some(Object::Dictionary(mut page)) = pages.remove(page_id) {
            page.set("Parent", pages_id);
            merged.objects.insert(*page_id, Object::Dictionary(page));
            kids.push(Object::Reference(*page_id));
        }
    }

    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_order.len() as i64),
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    merged.renumber_objects();
    merged.compress();

    let mut buffer = Vec::new();
    merged
        .save_to(&mut buffer)
        .map_err(|e| packaging(&e.to_string()))?;
    Ok(buffer)
}

/// Number of pages in a PDF
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    let doc = Document::load_mem(bytes).map_err(|e| packaging(&e.to_string()))?;
    Ok(doc.get_pages().len())
}

/// Copy inherited attributes from the page's ancestors onto the page itself
fn flatten_inherited(doc: &Document, page: &mut Dictionary) {
    for key in INHERITABLE {
        if page.has(key) {
            continue;
        }
        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        for _ in 0..MAX_TREE_DEPTH {
            let Some(node) = parent.and_then(|id| doc.get_dictionary(id).ok()) else {
                break;
            };
            if let Ok(value) = node.get(key) {
                page.set(key, value.clone());
                break;
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }
    }
}

fn type_name(object: &Object) -> Option<&[u8]> {
    object
        .as_dict()
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|t| t.as_name().ok())
}

fn packaging(reason: &str) -> AppError {
    AppError::PackagingFailure(format!("merge failed: {}", reason))
}
