//! View types for guardrail coverage
//!
//! This crate contains only the data shapes handed to a rendering layer
//! (tree views, status bars, webviews, JSON reports) and the conversions
//! from `guardrail-core` results. Field names are camelCase on the wire.

use std::path::Path;

use facet::Facet;
use guardrail_core::{
    ConfigIssue, CoverageStatus, CoverageSummary, Diagnostic, DiagnosticKind, FlatCoverage, Pass,
    RootCoverage, Rule, RuleCoverage, Severity, SpecCoverage, SpecStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Facet)]
#[facet(rename_all = "lowercase")]
#[repr(u8)]
pub enum ApiSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ApiSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiSeverity::Critical => "critical",
            ApiSeverity::High => "high",
            ApiSeverity::Medium => "medium",
            ApiSeverity::Low => "low",
        }
    }
}

/// Overall status of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Facet)]
#[facet(rename_all = "kebab-case")]
#[repr(u8)]
pub enum ApiCoverageStatus {
    Covered,
    Partial,
    NotCovered,
    NotApplicable,
}

/// Status one specification declares for a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Facet)]
#[facet(rename_all = "kebab-case")]
#[repr(u8)]
pub enum ApiSpecStatus {
    Done,
    Todo,
    Partial,
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Facet)]
#[facet(rename_all = "kebab-case")]
#[repr(u8)]
pub enum ApiDiagnosticKind {
    InvalidConfig,
    PresetDivergence,
    RuleConflict,
}

#[derive(Debug, Clone, Facet)]
pub struct ApiRule {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub severity: ApiSeverity,
    pub enabled: bool,
}

#[derive(Debug, Clone, Facet)]
#[facet(rename_all = "camelCase")]
pub struct ApiSpecCoverage {
    pub spec_name: String,
    /// Absolute path of the root the specification lives in
    pub root_path: String,
    pub status: ApiSpecStatus,
    #[facet(default)]
    pub justification: Option<String>,
}

#[derive(Debug, Clone, Facet)]
#[facet(rename_all = "camelCase")]
pub struct ApiRuleCoverage {
    pub rule: ApiRule,
    pub spec_coverage: Vec<ApiSpecCoverage>,
    pub overall_status: ApiCoverageStatus,
}

/// Status counts over enabled rules
#[derive(Debug, Clone, Default, Facet)]
#[facet(rename_all = "camelCase")]
pub struct ApiSummary {
    pub covered: usize,
    pub partial: usize,
    pub not_covered: usize,
    pub not_applicable: usize,
    pub disabled: usize,
    /// Covered share of applicable enabled rules (0.0 - 100.0)
    pub coverage_percent: f64,
}

impl ApiSummary {
    /// Short label for a status bar, e.g. `guardrails 6/8 (75%)`
    pub fn status_label(&self) -> String {
        let applicable = self.covered + self.partial + self.not_covered;
        format!(
            "guardrails {}/{} ({:.0}%)",
            self.covered, applicable, self.coverage_percent
        )
    }
}

#[derive(Debug, Clone, Facet)]
pub struct ApiConfigIssue {
    pub field: String,
    pub message: String,
}

/// One project root
#[derive(Debug, Clone, Facet)]
#[facet(rename_all = "camelCase")]
pub struct ApiRoot {
    pub path: String,
    pub display_name: String,
    #[facet(default)]
    pub preset: Option<String>,
    /// Rules come from the primary root
    pub shared_rules: bool,
    /// Why the root's configuration was rejected (empty when accepted)
    pub config_issues: Vec<ApiConfigIssue>,
    pub summary: ApiSummary,
    pub coverage: Vec<ApiRuleCoverage>,
}

/// Coverage across every root
#[derive(Debug, Clone, Facet)]
#[facet(rename_all = "camelCase")]
pub struct ApiFlatCoverage {
    pub multi_root: bool,
    pub summary: ApiSummary,
    pub rules: Vec<ApiRuleCoverage>,
}

#[derive(Debug, Clone, Facet)]
pub struct ApiDiagnostic {
    pub kind: ApiDiagnosticKind,
    #[facet(default)]
    pub root: Option<String>,
    pub message: String,
}

/// A complete report of one refresh
#[derive(Debug, Clone, Facet)]
#[facet(rename_all = "camelCase")]
pub struct ApiReport {
    /// Refresh counter of the snapshot this report was built from
    pub version: u64,
    #[facet(default)]
    pub primary_root: Option<String>,
    pub roots: Vec<ApiRoot>,
    pub flat: ApiFlatCoverage,
    pub diagnostics: Vec<ApiDiagnostic>,
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

impl From<Severity> for ApiSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical => ApiSeverity::Critical,
            Severity::High => ApiSeverity::High,
            Severity::Medium => ApiSeverity::Medium,
            Severity::Low => ApiSeverity::Low,
        }
    }
}

impl From<CoverageStatus> for ApiCoverageStatus {
    fn from(status: CoverageStatus) -> Self {
        match status {
            CoverageStatus::Covered => ApiCoverageStatus::Covered,
            CoverageStatus::Partial => ApiCoverageStatus::Partial,
            CoverageStatus::NotCovered => ApiCoverageStatus::NotCovered,
            CoverageStatus::NotApplicable => ApiCoverageStatus::NotApplicable,
        }
    }
}

impl From<SpecStatus> for ApiSpecStatus {
    fn from(status: SpecStatus) -> Self {
        match status {
            SpecStatus::Done => ApiSpecStatus::Done,
            SpecStatus::Todo => ApiSpecStatus::Todo,
            SpecStatus::Partial => ApiSpecStatus::Partial,
            SpecStatus::NotApplicable => ApiSpecStatus::NotApplicable,
        }
    }
}

impl From<DiagnosticKind> for ApiDiagnosticKind {
    fn from(kind: DiagnosticKind) -> Self {
        match kind {
            DiagnosticKind::InvalidConfig => ApiDiagnosticKind::InvalidConfig,
            DiagnosticKind::PresetDivergence => ApiDiagnosticKind::PresetDivergence,
            DiagnosticKind::RuleConflict => ApiDiagnosticKind::RuleConflict,
        }
    }
}

impl From<&Rule> for ApiRule {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id,
            name: rule.name.clone(),
            description: rule.description.clone(),
            severity: rule.severity.into(),
            enabled: rule.enabled,
        }
    }
}

impl From<&SpecCoverage> for ApiSpecCoverage {
    fn from(spec: &SpecCoverage) -> Self {
        Self {
            spec_name: spec.spec_name.clone(),
            root_path: path_string(&spec.root),
            status: spec.status.into(),
            justification: spec.justification.clone(),
        }
    }
}

impl From<&RuleCoverage> for ApiRuleCoverage {
    fn from(coverage: &RuleCoverage) -> Self {
        Self {
            rule: (&coverage.rule).into(),
            spec_coverage: coverage.spec_coverage.iter().map(Into::into).collect(),
            overall_status: coverage.overall.into(),
        }
    }
}

impl From<CoverageSummary> for ApiSummary {
    fn from(summary: CoverageSummary) -> Self {
        Self {
            covered: summary.covered,
            partial: summary.partial,
            not_covered: summary.not_covered,
            not_applicable: summary.not_applicable,
            disabled: summary.disabled,
            coverage_percent: summary.coverage_percent(),
        }
    }
}

impl From<&ConfigIssue> for ApiConfigIssue {
    fn from(issue: &ConfigIssue) -> Self {
        Self {
            field: issue.field.clone(),
            message: issue.message.clone(),
        }
    }
}

impl From<&RootCoverage> for ApiRoot {
    fn from(root: &RootCoverage) -> Self {
        Self {
            path: path_string(root.path()),
            display_name: root.descriptor.display_name.clone(),
            preset: root.rule_set.preset.clone(),
            shared_rules: root.shared_rules,
            config_issues: root
                .invalid_config
                .iter()
                .flat_map(|invalid| invalid.issues.iter().map(ApiConfigIssue::from))
                .collect(),
            summary: root.summary().into(),
            coverage: root.coverage.iter().map(Into::into).collect(),
        }
    }
}

impl From<&FlatCoverage> for ApiFlatCoverage {
    fn from(flat: &FlatCoverage) -> Self {
        Self {
            multi_root: flat.multi_root,
            summary: flat.summary().into(),
            rules: flat.rules.iter().map(Into::into).collect(),
        }
    }
}

impl From<&Diagnostic> for ApiDiagnostic {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self {
            kind: diagnostic.kind.into(),
            root: diagnostic.root.as_deref().map(path_string),
            message: diagnostic.message.clone(),
        }
    }
}

impl ApiReport {
    pub fn from_pass(pass: &Pass, version: u64) -> Self {
        Self {
            version,
            primary_root: pass.primary_root().map(path_string),
            roots: pass.roots().iter().map(Into::into).collect(),
            flat: pass.flat().into(),
            diagnostics: pass.diagnostics().iter().map(Into::into).collect(),
        }
    }
}
