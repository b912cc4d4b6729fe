use crate::anchors::generate_anchors;
use crate::config::RuleConfig;
use crate::types::*;
use anyhow::Result;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{chart, citation_visual, formula, heading};

/// One registered checker: a plain function over some input plus its enable flag.
///
/// Checkers never see each other's output; the runner concatenates what they return.
pub struct Check<I: ?Sized> {
    pub name: &'static str,
    pub enabled: fn(&RuleConfig) -> bool,
    pub run: fn(&I, &RuleConfig) -> Result<Vec<Issue>>,
}

/// Layout checkers in execution order. Register new checks by extending this list.
pub const LAYOUT_CHECKS: &[Check<[Element]>] = &[
    Check {
        name: "chart_check",
        enabled: chart::enabled,
        run: chart::check,
    },
    Check {
        name: "formula_check",
        enabled: formula::enabled,
        run: formula::check,
    },
    Check {
        name: "heading_check",
        enabled: heading::enabled,
        run: heading::check,
    },
    Check {
        name: "citation_visual_check",
        enabled: citation_visual::enabled,
        run: citation_visual::check,
    },
];

/// Run every enabled check over `input`.
///
/// A check that returns `Err` or panics is logged and contributes nothing;
/// issues already collected from the other checks are kept.
pub fn run_checks<I: ?Sized>(checks: &[Check<I>], input: &I, config: &RuleConfig) -> Vec<Issue> {
    let mut issues = Vec::new();

    for check in checks {
        if !(check.enabled)(config) {
            debug!(check = check.name, "skipping disabled check");
            continue;
        }

        let start = Instant::now();
        match catch_unwind(AssertUnwindSafe(|| (check.run)(input, config))) {
            Ok(Ok(found)) => {
                debug!(
                    check = check.name,
                    issues = found.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "check finished"
                );
                issues.extend(found);
            }
            Ok(Err(e)) => warn!(check = check.name, error = %e, "check failed, skipping its results"),
            Err(_) => warn!(check = check.name, "check panicked, skipping its results"),
        }
    }

    issues
}

/// Runs the layout checks and anchors their issues.
pub struct LayoutValidator<'a> {
    config: &'a RuleConfig,
}

impl<'a> LayoutValidator<'a> {
    pub fn new(config: &'a RuleConfig) -> Self {
        Self { config }
    }

    /// Anchored layout issues for the element sequence.
    pub fn validate(&self, elements: &[Element]) -> Vec<Issue> {
        let issues = run_checks(LAYOUT_CHECKS, elements, self.config);
        info!(
            elements = elements.len(),
            issues = issues.len(),
            "layout validation finished"
        );
        generate_anchors(issues)
    }
}
