//! PDF Split algorithm
//!
//! Extracts per-range page groups from one source document, producing one
//! new document per group.

use lopdf::Document;

use crate::error::SpliceError;
use crate::ranges::PageRange;

/// Split a document into one output per range group, in group order.
///
/// Every group keeps exactly its own pages, ascending. The whole range list
/// is validated against the actual page count before any output is
/// produced.
pub fn split_document(bytes: &[u8], ranges: &[PageRange]) -> Result<Vec<Vec<u8>>, SpliceError> {
    if ranges.is_empty() {
        return Err(SpliceError::InvalidRange("No page ranges specified".into()));
    }

    let doc = Document::load_mem(bytes).map_err(|e| SpliceError::ParseError(e.to_string()))?;
    let page_count = doc.get_pages().len() as u32;

    for range in ranges {
        if range.start > range.end {
            return Err(SpliceError::InvalidRange(format!(
                "Start {} > end {}",
                range.start + 1,
                range.end + 1
            )));
        }
        if range.end >= page_count {
            return Err(SpliceError::InvalidRange(format!(
                "Page {} does not exist (document has {} pages)",
                range.end + 1,
                page_count
            )));
        }
    }

    ranges
        .iter()
        .map(|range| extract_range(&doc, range, page_count))
        .collect()
}

/// Copy one page group out of an already-loaded document.
///
/// Works by whitelist: clone the source, delete every page outside the
/// group, then prune the objects that became unreachable.
fn extract_range(doc: &Document, range: &PageRange, page_count: u32) -> Result<Vec<u8>, SpliceError> {
    let mut new_doc = doc.clone();

    // lopdf numbers pages from 1; ranges are zero-based
    let mut pages_to_delete: Vec<u32> = (1..=page_count)
        .filter(|&number| !range.contains(number - 1))
        .collect();

    // Delete back to front so the remaining numbering stays stable
    pages_to_delete.reverse();
    for page_number in pages_to_delete {
        new_doc.delete_pages(&[page_number]);
    }

    new_doc.prune_objects();
    new_doc.compress();

    let mut buffer = Vec::new();
    new_doc
        .save_to(&mut buffer)
        .map_err(|e| SpliceError::OperationError(format!("Save failed: {}", e)))?;

    Ok(buffer)
}
