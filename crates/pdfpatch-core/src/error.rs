use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfPatchError {
    #[error("Failed to open PDF: {0}")]
    OpenFailure(String),

    #[error("Page {index} not found (document has {count} pages)")]
    PageNotFound { index: usize, count: usize },

    #[error("Object graph update failed: {0}")]
    ResourceAllocation(String),

    #[error("Failed to save PDF: {0}")]
    SaveFailure(String),

    #[error("Text not representable in WinAnsiEncoding: {0}")]
    EncodingHazard(String),

    #[error("Invalid directive: {0}")]
    InvalidDirective(String),

    #[error("Invalid directive list: {0}")]
    Directives(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfPatchError {
    /// Errors that end the whole batch regardless of failure policy.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PdfPatchError::OpenFailure(_) | PdfPatchError::SaveFailure(_) | PdfPatchError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PdfPatchError>;
