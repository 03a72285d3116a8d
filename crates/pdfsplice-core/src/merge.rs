//! PDF Merge algorithm
//!
//! Concatenates the pages of several source documents into one output
//! document, sources processed in the order given.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::SpliceError;

/// Incremental merge of source documents into one output.
///
/// Sources are imported one at a time:
/// 1. Calculate an ID offset past the destination's current max
/// 2. Import all source objects with remapped IDs
/// 3. Append the source's pages, in their original order, to the page list
///
/// Only one source document is held in memory at a time beyond the
/// accumulating destination; callers can release a source's backing storage
/// as soon as its `append` returns.
///
/// `finish` rebuilds the page tree, prunes everything unreachable from the
/// new catalog, compresses, and serializes.
pub struct Merger {
    dest: Document,
    page_refs: Vec<ObjectId>,
    sources: usize,
}

impl Merger {
    pub fn new() -> Self {
        Self {
            dest: Document::with_version("1.5"),
            page_refs: Vec::new(),
            sources: 0,
        }
    }

    /// Import every page of one source document, appended after the pages
    /// collected so far.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), SpliceError> {
        let source = Document::load_mem(bytes).map_err(|e| {
            SpliceError::ParseError(format!("Failed to load document {}: {}", self.sources, e))
        })?;

        // Page refs before the objects move out of the source
        let source_pages: Vec<ObjectId> = source.get_pages().values().copied().collect();

        let id_offset = self.dest.max_id;

        let mut remapped_objects = BTreeMap::new();
        for (old_id, object) in source.objects.into_iter() {
            let new_id = (old_id.0 + id_offset, old_id.1);
            remapped_objects.insert(new_id, remap_object_refs(object, id_offset));
        }
        for (id, object) in remapped_objects {
            self.dest.objects.insert(id, object);
        }

        for old_page_ref in source_pages {
            self.page_refs.push((old_page_ref.0 + id_offset, old_page_ref.1));
        }

        self.dest.max_id = source.max_id + id_offset;
        self.sources += 1;

        Ok(())
    }

    /// Build the output document. Requires at least two appended sources.
    pub fn finish(mut self) -> Result<Vec<u8>, SpliceError> {
        if self.sources < 2 {
            return Err(SpliceError::TooFewDocuments(self.sources));
        }

        let pages_id = self.dest.new_object_id();

        // Reparent every imported page under the new page tree root
        for &page_ref in &self.page_refs {
            if let Some(Object::Dictionary(page_dict)) = self.dest.objects.get_mut(&page_ref) {
                page_dict.set("Parent", Object::Reference(pages_id));
            }
        }

        let kids: Vec<Object> = self
            .page_refs
            .iter()
            .map(|&id| Object::Reference(id))
            .collect();

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Count", Object::Integer(self.page_refs.len() as i64));
        pages_dict.set("Kids", Object::Array(kids));
        self.dest
            .objects
            .insert(pages_id, Object::Dictionary(pages_dict));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = self.dest.add_object(catalog);
        self.dest.trailer.set("Root", Object::Reference(catalog_id));

        // Orphaned source catalogs and page tree roots drop out here
        self.dest.prune_objects();
        self.dest.compress();

        let mut buffer = Vec::new();
        self.dest
            .save_to(&mut buffer)
            .map_err(|e| SpliceError::OperationError(format!("Failed to save merged PDF: {}", e)))?;

        Ok(buffer)
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge documents in the given order. Requires at least two.
pub fn merge_documents(documents: Vec<Vec<u8>>) -> Result<Vec<u8>, SpliceError> {
    if documents.len() < 2 {
        return Err(SpliceError::TooFewDocuments(documents.len()));
    }

    let mut merger = Merger::new();
    for bytes in &documents {
        merger.append(bytes)?;
    }
    merger.finish()
}

/// Recursively remap object references in an object
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
