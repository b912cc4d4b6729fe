// Layout rule validator
// - engine.rs: check registry, isolated runner, LayoutValidator
// - chart.rs: figure/table captions and in-text references
// - formula.rs: formula numbering, references, alignment
// - heading.rs: numbered heading hierarchy
// - citation_visual.rs: citation markers vs. reference entries

pub mod chart;
pub mod citation_visual;
pub mod engine;
pub mod formula;
pub mod heading;

pub use engine::*;
