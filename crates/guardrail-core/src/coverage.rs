//! Coverage reduction: many per-specification statuses in, one overall
//! status per rule out.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use crate::matrix::{SpecStatus, extract_rows};
use crate::resolver::RuleSet;
use crate::rule::{Rule, RuleId};
use crate::sources::SpecDocument;

/// Overall status of one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverageStatus {
    Covered,
    Partial,
    NotCovered,
    NotApplicable,
}

impl CoverageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Covered => "covered",
            CoverageStatus::Partial => "partial",
            CoverageStatus::NotCovered => "not-covered",
            CoverageStatus::NotApplicable => "not-applicable",
        }
    }
}

impl Display for CoverageStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one specification declares for one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCoverage {
    /// Specification name; prefixed with the root's display name in the
    /// flattened multi-root view
    pub spec_name: String,
    /// Absolute path of the root the specification lives in
    pub root: PathBuf,
    pub status: SpecStatus,
    pub justification: Option<String>,
}

/// Coverage of one rule within one root (or across roots, when flattened)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCoverage {
    pub rule: Rule,
    pub spec_coverage: Vec<SpecCoverage>,
    pub overall: CoverageStatus,
}

/// Reduce a multiset of specification statuses to an overall status.
///
/// First match wins:
/// 1. nothing declared: not covered
/// 2. every entry not applicable: not applicable
/// 3. any partial, or both done and todo: partial
/// 4. some done, no todo, no partial: covered (not-applicable entries are ignored)
/// 5. anything else (only todo): not covered
///
/// The result depends only on which statuses occur, never on their order.
pub fn reduce<I>(statuses: I) -> CoverageStatus
where
    I: IntoIterator<Item = SpecStatus>,
{
    let mut any = false;
    let mut done = false;
    let mut todo = false;
    let mut partial = false;
    let mut all_not_applicable = true;

    for status in statuses {
        any = true;
        match status {
            SpecStatus::Done => done = true,
            SpecStatus::Todo => todo = true,
            SpecStatus::Partial => partial = true,
            SpecStatus::NotApplicable => {}
        }
        if status != SpecStatus::NotApplicable {
            all_not_applicable = false;
        }
    }

    if !any {
        CoverageStatus::NotCovered
    } else if all_not_applicable {
        CoverageStatus::NotApplicable
    } else if partial || (done && todo) {
        CoverageStatus::Partial
    } else if done {
        CoverageStatus::Covered
    } else {
        CoverageStatus::NotCovered
    }
}

impl RuleCoverage {
    /// Build a rule's coverage and compute its overall status.
    pub fn new(rule: Rule, spec_coverage: Vec<SpecCoverage>) -> Self {
        let overall = reduce(spec_coverage.iter().map(|entry| entry.status));
        Self {
            rule,
            spec_coverage,
            overall,
        }
    }
}

/// Compute per-rule coverage for one root.
///
/// Rows naming ids outside `rule_set` are ignored. The result follows the
/// rule-set's order, with specification entries in document order.
pub fn compute(rule_set: &RuleSet, root: &Path, documents: &[SpecDocument]) -> Vec<RuleCoverage> {
    let mut by_rule: HashMap<RuleId, Vec<SpecCoverage>> = HashMap::new();

    for document in documents {
        for row in extract_rows(&document.text) {
            if !rule_set.contains(row.rule_id) {
                continue;
            }
            by_rule.entry(row.rule_id).or_default().push(SpecCoverage {
                spec_name: document.name.clone(),
                root: root.to_path_buf(),
                status: row.status,
                justification: row.justification,
            });
        }
    }

    rule_set
        .rules
        .iter()
        .map(|rule| RuleCoverage::new(rule.clone(), by_rule.remove(&rule.id).unwrap_or_default()))
        .collect()
}

/// Status counts over the enabled rules of a coverage list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageSummary {
    pub covered: usize,
    pub partial: usize,
    pub not_covered: usize,
    pub not_applicable: usize,
    /// Rules present but disabled (not part of the counts above)
    pub disabled: usize,
}

impl CoverageSummary {
    pub fn of(coverage: &[RuleCoverage]) -> Self {
        let mut summary = Self::default();
        for entry in coverage {
            if !entry.rule.enabled {
                summary.disabled += 1;
                continue;
            }
            match entry.overall {
                CoverageStatus::Covered => summary.covered += 1,
                CoverageStatus::Partial => summary.partial += 1,
                CoverageStatus::NotCovered => summary.not_covered += 1,
                CoverageStatus::NotApplicable => summary.not_applicable += 1,
            }
        }
        summary
    }

    /// Number of enabled rules
    pub fn enabled(&self) -> usize {
        self.covered + self.partial + self.not_covered + self.not_applicable
    }

    /// Coverage percentage (0.0 - 100.0) over applicable enabled rules
    pub fn coverage_percent(&self) -> f64 {
        let applicable = self.enabled() - self.not_applicable;
        if applicable == 0 {
            return 100.0;
        }
        (self.covered as f64 / applicable as f64) * 100.0
    }
}
