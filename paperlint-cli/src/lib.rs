// All audit functionality is in paperlint-core
// This CLI acts as a thin wrapper around the core library

use anyhow::{Context, Result};
use paperlint_core::preprocessors::encode_pdf_content;
use paperlint_core::preprocessors::pdf::supports_file_type;
use std::path::Path;

// Re-export core types for convenience
pub use paperlint_core::*;

/// Request content for an input file: PDFs are base64-encoded so the layout
/// stage runs; anything else is read as UTF-8 text.
pub fn load_content(input: &Path) -> Result<String> {
    if supports_file_type(input) {
        let bytes = std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
        Ok(encode_pdf_content(&bytes))
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {} as text", input.display()))
    }
}

/// `paper.pdf` → `paper_audit.json`
pub fn default_output_path(input: &Path, suffix: &str) -> String {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    format!("{stem}_{suffix}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperlint_core::preprocessors::is_pdf_derived;
    use tempfile::TempDir;

    #[test]
    fn pdf_input_is_base64_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, b"%PDF-1.4\n%test").unwrap();

        let content = load_content(&path).unwrap();
        assert!(is_pdf_derived(&content));
    }

    #[test]
    fn text_input_is_literal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chunk.txt");
        std::fs::write(&path, "见图1所示").unwrap();

        assert_eq!(load_content(&path).unwrap(), "见图1所示");
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(load_content(Path::new("/no/such/paper.pdf")).is_err());
    }

    #[test]
    fn output_path_from_input_stem() {
        assert_eq!(default_output_path(Path::new("/tmp/paper.pdf"), "audit"), "paper_audit.json");
        assert_eq!(default_output_path(Path::new(""), "layout"), "output_layout.json");
    }
}
