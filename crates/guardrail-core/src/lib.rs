//! guardrail-core - Core library for guardrail compliance coverage
//!
//! This crate provides the building blocks for:
//! - Resolving the effective rule-set of a project root from its
//!   `guardrails.yaml` (baseline catalog, presets, overrides, custom rules)
//! - Scanning specification requirements documents for compliance-matrix rows
//! - Reducing per-specification statuses to one coverage status per rule
//! - Aggregating coverage across several project roots and detecting
//!   conflicting configurations between them
//!
//! # Features
//!
//! - `parallel` - Compute roots concurrently during a refresh (brings in `rayon`)
//!
//! # Compliance matrices
//!
//! Specifications declare their compliance in a six-column table whose first
//! cell is `<id>. <rule name>` and whose last cell is the status:
//!
//! ```markdown
//! | Rule | Owner | Notes | Evidence | Review | Status |
//! |------|-------|-------|----------|--------|--------|
//! | 1. Testing Coverage | qa | | ci | yes | DONE |
//! | 9. Tenant Isolation | | | | | N/A - single tenant |
//! ```
//!
//! # Computing coverage
//!
//! ```
//! use std::path::Path;
//! use guardrail_core::{CoverageStatus, MemoryRoot, Pass, RootDescriptor};
//!
//! let web = RootDescriptor::from_path("/work/web");
//! let pass = Pass::compute_with(&[web], None, |_| {
//!     MemoryRoot::new()
//!         .config("preset: saas\n")
//!         .spec("login", "| 1. Testing Coverage | | | | | DONE |")
//! });
//!
//! let root = pass.root(Path::new("/work/web")).unwrap();
//! assert_eq!(root.rule_set.len(), 13);
//! assert_eq!(pass.flat().get(1).unwrap().overall, CoverageStatus::Covered);
//! ```
//!
//! Roots are identified by absolute path. Display names are for humans and
//! may collide.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod conflict;
pub mod coverage;
pub mod diagnostic;
pub mod matrix;
pub mod resolver;
pub mod root;
pub mod rule;
pub mod sources;

pub use aggregate::{Aggregator, FlatCoverage, Pass, aggregate};
pub use config::{ConfigIssue, DisabledEntry, GuardrailConfig, InvalidConfig, RuleOverride};
pub use conflict::RuleConflict;
pub use coverage::{CoverageStatus, CoverageSummary, RuleCoverage, SpecCoverage};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use matrix::{MatrixRow, SpecStatus};
pub use resolver::{Resolution, RuleSet, resolve};
pub use root::{RootCoverage, RootDescriptor, compute_root};
pub use rule::{Rule, RuleId, Severity};
pub use sources::{FsRoot, Layout, MemoryRoot, RootSource, SpecDocument};
