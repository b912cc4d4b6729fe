//! PDF Backend trait
//!
//! Defines the interface that all PDF decoding backends must implement.
//! All backends produce the same [`RawDocument`] page model, so the structural
//! extractor is shared across backends.

use crate::error::BackendError;
use crate::preprocessors::raw::RawDocument;

/// Backend trait for PDF decoding
///
/// Implementations must:
/// - return [`BackendError::Encrypted`] for documents that report encryption,
///   without producing any pages
/// - return [`BackendError::Invalid`] when the bytes cannot be decoded at all
/// - report per-page decoding failures on [`RawPage::error`](crate::preprocessors::raw::RawPage)
///   instead of failing the whole document
/// - use top-left-origin page coordinates
pub trait PdfBackend: Send + Sync {
    /// Decode PDF bytes into positioned text runs and image regions
    fn open(&self, pdf_bytes: &[u8]) -> Result<RawDocument, BackendError>;

    /// Backend identifier for logging/debugging
    fn name(&self) -> &str;
}

pub mod lopdf_backend;

pub use lopdf_backend::LopdfBackend;
