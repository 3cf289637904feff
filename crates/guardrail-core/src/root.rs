//! Project roots and their independent coverage computation.

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::InvalidConfig;
use crate::coverage::{self, CoverageSummary, RuleCoverage};
use crate::resolver::{self, RuleSet};
use crate::sources::RootSource;

/// A project root as supplied by the host.
///
/// Identity is the absolute `path`. The display name is cosmetic: two
/// distinct roots may well share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RootDescriptor {
    pub path: PathBuf,
    pub display_name: String,
}

impl RootDescriptor {
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
        }
    }

    /// Descriptor named after the trailing path component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, display_name }
    }
}

impl Display for RootDescriptor {
    /// `name (path)`, unambiguous even when display names collide
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.path.display())
    }
}

/// Everything computed for one root in one refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootCoverage {
    pub descriptor: RootDescriptor,
    pub rule_set: RuleSet,
    /// Per-rule coverage, in rule-set order
    pub coverage: Vec<RuleCoverage>,
    /// The root's configuration document was present but rejected
    pub invalid_config: Option<InvalidConfig>,
    /// The rule-set was taken from the primary root rather than resolved
    /// from this root's own configuration
    pub shared_rules: bool,
}

impl RootCoverage {
    pub fn path(&self) -> &Path {
        &self.descriptor.path
    }

    pub fn summary(&self) -> CoverageSummary {
        CoverageSummary::of(&self.coverage)
    }
}

/// Resolve one root's rule-set and compute its coverage.
///
/// With `shared` set, the root's own configuration document is not read;
/// coverage is computed against the shared rule-set instead.
pub fn compute_root(
    descriptor: &RootDescriptor,
    source: &impl RootSource,
    shared: Option<&RuleSet>,
) -> RootCoverage {
    let (rule_set, invalid_config) = match shared {
        Some(rule_set) => (rule_set.clone(), None),
        None => {
            let resolution = resolver::resolve(source.config_document().as_deref());
            (resolution.rule_set, resolution.invalid)
        }
    };

    let documents = source.spec_documents();
    debug!(
        root = %descriptor.path.display(),
        rules = rule_set.len(),
        specs = documents.len(),
        "computing root coverage"
    );
    let coverage = coverage::compute(&rule_set, &descriptor.path, &documents);

    RootCoverage {
        descriptor: descriptor.clone(),
        rule_set,
        coverage,
        invalid_config,
        shared_rules: shared.is_some(),
    }
}
