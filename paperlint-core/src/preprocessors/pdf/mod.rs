//! PDF decoding
//!
//! Backends turn PDF bytes into the [`RawDocument`](crate::preprocessors::raw::RawDocument)
//! page model; the structural extractor takes it from there.

pub mod backends;
pub mod cmap;

use std::path::Path;

pub use backends::{LopdfBackend, PdfBackend};

/// Whether a file path looks like a PDF by extension
pub fn supports_file_type(path: &Path) -> bool {
    if let Some(extension) = path.extension() {
        matches!(
            extension.to_str().unwrap_or("").to_lowercase().as_str(),
            "pdf"
        )
    } else {
        false
    }
}
