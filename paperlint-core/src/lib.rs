// Paperlint Core Library
//
// Audits academic paper formatting: extracts positioned layout elements from
// PDFs, validates figure/table labels, formula numbering, heading hierarchy
// and citations, then scores layout and semantic issues together.

pub mod types;
pub mod error;
pub mod preprocessors;
pub mod classifier;
pub mod extractor;
pub mod rules;
pub mod anchors;
pub mod semantic;
pub mod scoring;
pub mod llm;
pub mod payload;
pub mod processor;
pub mod config;
pub mod storage;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::{BackendError, ConfigError, SourceError};
pub use preprocessors::{LopdfBackend, PdfBackend, PdfSource};
pub use config::{AgentSettings, RuleConfig, RuleStore};
pub use payload::{FrontendPayload, Highlight, LayoutPayload};
pub use processor::{AuditProcessor, AuditReport, AuditRequest};
pub use storage::{FileTaskStore, NoOpTaskStore, TaskRecord, TaskStore};
