//! Document Preprocessors
//!
//! This module provides the layer between page content as it arrives (bytes,
//! path, or base64 text) and the format-agnostic raw page model.
//!
//! ## Architecture
//!
//! ```text
//! content (bytes | path | base64)
//!     ↓
//! [PdfSource::detect]
//!     ↓
//! [PdfBackend]  (lopdf)
//!     ↓
//! RawDocument (pages → blocks → lines → spans)
//!     ↓
//! [Structural Extractor + Zone Classifier]
//!     ↓
//! Elements
//! ```

pub mod pdf;
pub mod raw;
pub mod source;

pub use pdf::{LopdfBackend, PdfBackend};
pub use raw::{RawBlock, RawDocument, RawLine, RawPage, RawSpan};
pub use source::{encode_pdf_content, is_pdf_derived, PdfSource};
