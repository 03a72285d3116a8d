//! PDF page-assembly engine
//!
//! The document operations behind the splice service: merging several PDFs
//! into one and splitting one PDF into per-range documents, driven by a
//! parsed page-range specification. Document parsing and serialization are
//! delegated to lopdf.

pub mod error;
pub mod merge;
pub mod ranges;
pub mod split;

pub use error::SpliceError;
pub use merge::{merge_documents, Merger};
pub use ranges::{parse_ranges, PageRange};
pub use split::split_document;

/// Parse PDF bytes and return the page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, SpliceError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| SpliceError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}
