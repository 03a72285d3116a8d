use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpliceError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("At least 2 documents are required, got {0}")]
    TooFewDocuments(usize),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}
