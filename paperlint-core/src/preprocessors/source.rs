// Document source detection
//
// Page content reaches the engine as raw bytes, a filesystem path, or base64
// text. Detection happens once, up front; everything downstream works on bytes.

use crate::error::SourceError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Only this prefix of decoded base64 data is searched for the PDF header
const PDF_HEADER_WINDOW: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
    /// Decoded payload of a base64 string
    Base64(Vec<u8>),
}

impl PdfSource {
    /// Decide what a content string refers to.
    ///
    /// An existing path wins; otherwise the string must be strict base64 whose
    /// decoded head contains `%PDF`.
    pub fn detect(content: &str) -> Result<Self, SourceError> {
        let trimmed = content.trim();
        if !trimmed.is_empty() && Path::new(trimmed).exists() {
            return Ok(PdfSource::Path(PathBuf::from(trimmed)));
        }
        decode_pdf_base64(trimmed)
            .map(PdfSource::Base64)
            .ok_or(SourceError::Unrecognized)
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        PdfSource::Bytes(bytes.into())
    }

    /// Bytes to hand to the backend. Only the path variant touches the filesystem.
    pub fn read_bytes(&self) -> Result<Cow<'_, [u8]>, SourceError> {
        match self {
            PdfSource::Bytes(bytes) | PdfSource::Base64(bytes) => Ok(Cow::Borrowed(bytes.as_slice())),
            PdfSource::Path(path) => std::fs::read(path)
                .map(Cow::Owned)
                .map_err(|source| SourceError::Io {
                    path: path.display().to_string(),
                    source,
                }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PdfSource::Bytes(_) => "bytes",
            PdfSource::Path(_) => "path",
            PdfSource::Base64(_) => "base64",
        }
    }
}

/// Whether `content` is base64-encoded PDF data, in which case the semantic
/// stage rebuilds its text from extracted elements instead of reading it literally.
pub fn is_pdf_derived(content: &str) -> bool {
    decode_pdf_base64(content.trim()).is_some()
}

/// Encode PDF bytes as request content; the inverse of base64 detection.
pub fn encode_pdf_content(pdf_bytes: &[u8]) -> String {
    STANDARD.encode(pdf_bytes)
}

fn decode_pdf_base64(content: &str) -> Option<Vec<u8>> {
    if content.is_empty() {
        return None;
    }
    let decoded = STANDARD.decode(content).ok()?;
    let head = &decoded[..decoded.len().min(PDF_HEADER_WINDOW)];
    head.windows(4).any(|w| w == b"%PDF").then_some(decoded)
}
