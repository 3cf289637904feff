//! Multi-root aggregation.
//!
//! A refresh is two steps composed by [`Pass::compute_with`]:
//! [`compute_root`] for every root independently, then [`aggregate`] over
//! the finished results. Nothing is carried over between passes: every
//! refresh builds a new [`Pass`] and the previous one is dropped.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::conflict;
use crate::coverage::{CoverageStatus, CoverageSummary, RuleCoverage, SpecCoverage};
use crate::diagnostic::Diagnostic;
use crate::resolver::RuleSet;
use crate::root::{RootCoverage, RootDescriptor, compute_root};
use crate::rule::{Rule, RuleId, Severity};
use crate::sources::{FsRoot, Layout, RootSource};

/// One coverage list across every active root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatCoverage {
    /// One entry per distinct rule id, in first-seen order
    pub rules: Vec<RuleCoverage>,
    /// More than one root contributed; specification names are prefixed
    pub multi_root: bool,
}

impl FlatCoverage {
    pub fn get(&self, id: RuleId) -> Option<&RuleCoverage> {
        self.rules.iter().find(|entry| entry.rule.id == id)
    }

    pub fn summary(&self) -> CoverageSummary {
        CoverageSummary::of(&self.rules)
    }

    /// Enabled critical rules that nothing covers
    pub fn uncovered_critical(&self) -> impl Iterator<Item = &RuleCoverage> {
        self.rules.iter().filter(|entry| {
            entry.rule.enabled
                && entry.rule.severity == Severity::Critical
                && entry.overall == CoverageStatus::NotCovered
        })
    }

    pub fn is_passing(&self, threshold: f64) -> bool {
        self.uncovered_critical().next().is_none() && self.summary().coverage_percent() >= threshold
    }
}

/// Merge per-root coverage into one list.
///
/// Rules are unioned by id; the first root that defines an id supplies the
/// name, severity and description shown. A rule is enabled in the flat view
/// when any root has it enabled. Specification entries of every root are kept, named
/// `<display name>/<spec>` when more than one root is present, and the
/// overall status is reduced again over the combined entries.
pub fn aggregate(roots: &[RootCoverage]) -> FlatCoverage {
    let multi_root = roots.len() > 1;
    let mut order: Vec<RuleId> = Vec::new();
    let mut merged: HashMap<RuleId, (Rule, Vec<SpecCoverage>)> = HashMap::new();

    for root in roots {
        for entry in &root.coverage {
            let (rule, specs) = merged.entry(entry.rule.id).or_insert_with(|| {
                order.push(entry.rule.id);
                (entry.rule.clone(), Vec::new())
            });
            rule.enabled |= entry.rule.enabled;
            specs.extend(entry.spec_coverage.iter().map(|spec| {
                let mut spec = spec.clone();
                if multi_root {
                    spec.spec_name = format!("{}/{}", root.descriptor.display_name, spec.spec_name);
                }
                spec
            }));
        }
    }

    let rules = order
        .into_iter()
        .filter_map(|id| merged.remove(&id))
        .map(|(rule, specs)| RuleCoverage::new(rule, specs))
        .collect();

    FlatCoverage { rules, multi_root }
}

/// The complete, immutable result of one refresh
#[derive(Debug, Clone, Default)]
pub struct Pass {
    roots: Vec<RootCoverage>,
    by_path: BTreeMap<PathBuf, usize>,
    flat: FlatCoverage,
    diagnostics: Vec<Diagnostic>,
    primary_root: Option<PathBuf>,
}

impl Pass {
    /// Refresh roots on disk.
    pub fn scan(roots: &[RootDescriptor], layout: &Layout, primary: Option<&Path>) -> Self {
        Self::compute_with(roots, primary, |descriptor| {
            FsRoot::new(descriptor.path.clone(), layout)
        })
    }

    /// Refresh roots whose documents come from `source_for`.
    ///
    /// Duplicate paths are processed once. When `primary` names one of the
    /// roots, its rule-set is resolved first and shared with every other
    /// root, and conflict detection is skipped.
    pub fn compute_with<S, F>(roots: &[RootDescriptor], primary: Option<&Path>, source_for: F) -> Self
    where
        S: RootSource,
        F: Fn(&RootDescriptor) -> S + Sync,
    {
        let mut seen = HashSet::new();
        let roots: Vec<&RootDescriptor> = roots
            .iter()
            .filter(|descriptor| {
                let first = seen.insert(descriptor.path.clone());
                if !first {
                    debug!(root = %descriptor.path.display(), "duplicate root ignored");
                }
                first
            })
            .collect();

        let primary_root = primary.and_then(|path| {
            let found = roots.iter().copied().find(|descriptor| descriptor.path == path);
            if found.is_none() {
                warn!(
                    primary = %path.display(),
                    "primary root is not among the active roots, resolving each root's own rule-set"
                );
            }
            found
        });

        let primary_coverage = primary_root
            .map(|descriptor| compute_root(descriptor, &source_for(descriptor), None));
        let shared: Option<&RuleSet> = primary_coverage.as_ref().map(|root| &root.rule_set);

        let compute = |descriptor: &RootDescriptor| -> RootCoverage {
            match &primary_coverage {
                Some(primary) if primary.descriptor.path == descriptor.path => primary.clone(),
                _ => compute_root(descriptor, &source_for(descriptor), shared),
            }
        };

        // Collecting is the join point: aggregation starts only after every
        // root is done.
        #[cfg(feature = "parallel")]
        let computed: Vec<RootCoverage> = roots.par_iter().map(|&descriptor| compute(descriptor)).collect();
        #[cfg(not(feature = "parallel"))]
        let computed: Vec<RootCoverage> = roots.iter().map(|&descriptor| compute(descriptor)).collect();

        let mut diagnostics: Vec<Diagnostic> = computed
            .iter()
            .filter_map(|root| {
                root.invalid_config
                    .as_ref()
                    .map(|invalid| Diagnostic::invalid_config(&root.descriptor, invalid))
            })
            .collect();

        if computed.len() > 1 && primary_root.is_none() {
            let rule_sets: Vec<(&RootDescriptor, &RuleSet)> = computed
                .iter()
                .map(|root| (&root.descriptor, &root.rule_set))
                .collect();
            diagnostics.extend(conflict::detect(&rule_sets));
        }

        for diagnostic in &diagnostics {
            warn!(kind = diagnostic.kind.as_str(), "{}", diagnostic.message);
        }

        let by_path = computed
            .iter()
            .enumerate()
            .map(|(index, root)| (root.descriptor.path.clone(), index))
            .collect();
        let flat = aggregate(&computed);

        Self {
            roots: computed,
            by_path,
            flat,
            diagnostics,
            primary_root: primary_root.map(|descriptor| descriptor.path.clone()),
        }
    }

    /// Per-root results in input order
    pub fn roots(&self) -> &[RootCoverage] {
        &self.roots
    }

    pub fn root(&self, path: &Path) -> Option<&RootCoverage> {
        self.by_path.get(path).map(|&index| &self.roots[index])
    }

    pub fn flat(&self) -> &FlatCoverage {
        &self.flat
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The primary root in effect, if one was designated and active
    pub fn primary_root(&self) -> Option<&Path> {
        self.primary_root.as_deref()
    }
}

/// Owner of the latest refresh result.
///
/// Consumers read [`Pass`] snapshots; only [`Aggregator::refresh`] replaces
/// them.
#[derive(Debug, Default)]
pub struct Aggregator {
    layout: Layout,
    primary_root: Option<PathBuf>,
    current: Arc<Pass>,
}

impl Aggregator {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            primary_root: None,
            current: Arc::new(Pass::default()),
        }
    }

    pub fn with_primary_root(mut self, primary_root: Option<PathBuf>) -> Self {
        self.primary_root = primary_root;
        self
    }

    pub fn set_primary_root(&mut self, primary_root: Option<PathBuf>) {
        self.primary_root = primary_root;
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Rebuild everything from the roots on disk.
    pub fn refresh(&mut self, roots: &[RootDescriptor]) -> Arc<Pass> {
        let pass = Pass::scan(roots, &self.layout, self.primary_root.as_deref());
        self.publish(pass)
    }

    /// Rebuild everything from caller-provided sources.
    pub fn refresh_from<S, F>(&mut self, roots: &[RootDescriptor], source_for: F) -> Arc<Pass>
    where
        S: RootSource,
        F: Fn(&RootDescriptor) -> S + Sync,
    {
        let pass = Pass::compute_with(roots, self.primary_root.as_deref(), source_for);
        self.publish(pass)
    }

    fn publish(&mut self, pass: Pass) -> Arc<Pass> {
        self.current = Arc::new(pass);
        Arc::clone(&self.current)
    }

    pub fn snapshot(&self) -> Arc<Pass> {
        Arc::clone(&self.current)
    }

    pub fn flat_coverage(&self) -> &FlatCoverage {
        self.current.flat()
    }

    pub fn root_coverage(&self, path: &Path) -> Option<&RootCoverage> {
        self.current.root(path)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.current.diagnostics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use crate::sources::MemoryRoot;

    fn sources(entries: Vec<(&str, MemoryRoot)>) -> HashMap<PathBuf, MemoryRoot> {
        entries
            .into_iter()
            .map(|(path, root)| (PathBuf::from(path), root))
            .collect()
    }

    fn run(
        roots: &[RootDescriptor],
        primary: Option<&Path>,
        docs: &HashMap<PathBuf, MemoryRoot>,
    ) -> Pass {
        Pass::compute_with(roots, primary, |descriptor| {
            docs.get(&descriptor.path).cloned().unwrap_or_default()
        })
    }

    #[test]
    fn single_root_keeps_plain_spec_names() {
        let roots = [RootDescriptor::from_path("/w/app")];
        let docs = sources(vec![(
            "/w/app",
            MemoryRoot::new().spec("login", "| 1. Testing Coverage | | | | | DONE |"),
        )]);

        let pass = run(&roots, None, &docs);
        assert!(!pass.flat().multi_root);
        let rule1 = pass.flat().get(1).unwrap();
        assert_eq!(rule1.spec_coverage[0].spec_name, "login");
        assert_eq!(rule1.overall, CoverageStatus::Covered);
        assert!(pass.diagnostics().is_empty());
    }

    #[test]
    fn flat_view_prefixes_and_recomputes() {
        let roots = [
            RootDescriptor::from_path("/w/web"),
            RootDescriptor::from_path("/w/api"),
        ];
        let docs = sources(vec![
            ("/w/web", MemoryRoot::new().spec("login", "| 3. Error Handling | | | | | DONE |")),
            ("/w/api", MemoryRoot::new().spec("orders", "| 3. Error Handling | | | | | TODO |")),
        ]);

        let pass = run(&roots, None, &docs);
        assert!(pass.flat().multi_root);
        let rule3 = pass.flat().get(3).unwrap();
        let names: Vec<&str> = rule3.spec_coverage.iter().map(|s| s.spec_name.as_str()).collect();
        assert_eq!(names, vec!["web/login", "api/orders"]);
        assert_eq!(rule3.overall, CoverageStatus::Partial);

        let web = pass.root(Path::new("/w/web")).unwrap();
        assert_eq!(
            web.coverage.iter().find(|c| c.rule.id == 3).unwrap().overall,
            CoverageStatus::Covered
        );
    }

    #[test]
    fn first_seen_definition_wins_in_flat_view() {
        let roots = [
            RootDescriptor::from_path("/w/a"),
            RootDescriptor::from_path("/w/b"),
        ];
        let docs = sources(vec![(
            "/w/b",
            MemoryRoot::new().config("custom:\n  - { id: 4, name: Docs, severity: low }\n"),
        )]);

        let pass = run(&roots, None, &docs);
        assert_eq!(pass.flat().get(4).unwrap().rule.name, "Documentation");
        assert_eq!(pass.flat().rules.len(), 8);
        assert_eq!(pass.diagnostics().len(), 1);
        assert_eq!(pass.diagnostics()[0].kind, DiagnosticKind::RuleConflict);
    }

    #[test]
    fn primary_root_shares_rules_and_silences_conflicts() {
        let roots = [
            RootDescriptor::from_path("/mono/web"),
            RootDescriptor::from_path("/mono"),
        ];
        let docs = sources(vec![
            ("/mono", MemoryRoot::new().config("preset: fintech\n")),
            (
                "/mono/web",
                MemoryRoot::new()
                    .config("preset: saas\n")
                    .spec("checkout", "| 15. PCI Compliance | | | | | DONE |"),
            ),
        ]);

        let pass = run(&roots, Some(Path::new("/mono")), &docs);
        assert_eq!(pass.primary_root(), Some(Path::new("/mono")));
        assert!(pass.diagnostics().is_empty());

        let web = pass.root(Path::new("/mono/web")).unwrap();
        assert!(web.shared_rules);
        assert_eq!(web.rule_set.preset.as_deref(), Some("fintech"));
        assert!(!web.rule_set.contains(9));
        assert_eq!(
            web.coverage.iter().find(|c| c.rule.id == 15).unwrap().overall,
            CoverageStatus::Covered
        );
        assert!(!pass.root(Path::new("/mono")).unwrap().shared_rules);
    }

    #[test]
    fn unknown_primary_root_falls_back_to_conflict_detection() {
        let roots = [
            RootDescriptor::from_path("/w/a"),
            RootDescriptor::from_path("/w/b"),
        ];
        let docs = sources(vec![
            ("/w/a", MemoryRoot::new().config("preset: saas")),
            ("/w/b", MemoryRoot::new().config("preset: healthcare")),
        ]);

        let pass = run(&roots, Some(Path::new("/elsewhere")), &docs);
        assert!(pass.primary_root().is_none());
        assert_eq!(pass.diagnostics()[0].kind, DiagnosticKind::PresetDivergence);
    }

    #[test]
    fn duplicate_paths_are_processed_once() {
        let roots = [
            RootDescriptor::new("/w/app", "first"),
            RootDescriptor::new("/w/app", "second"),
        ];
        let docs = sources(vec![(
            "/w/app",
            MemoryRoot::new().spec("login", "| 1. Testing Coverage | | | | | DONE |"),
        )]);

        let pass = run(&roots, None, &docs);
        assert_eq!(pass.roots().len(), 1);
        assert_eq!(pass.roots()[0].descriptor.display_name, "first");
        assert!(!pass.flat().multi_root);
    }

    #[test]
    fn invalid_config_is_root_scoped() {
        let roots = [
            RootDescriptor::from_path("/w/broken"),
            RootDescriptor::from_path("/w/fine"),
        ];
        let docs = sources(vec![
            ("/w/broken", MemoryRoot::new().config("disabled: 3\n")),
            ("/w/fine", MemoryRoot::new().config("preset: saas\n")),
        ]);

        let pass = run(&roots, None, &docs);
        let broken = pass.root(Path::new("/w/broken")).unwrap();
        assert_eq!(broken.rule_set, RuleSet::baseline());
        assert!(pass.root(Path::new("/w/fine")).unwrap().rule_set.contains(9));

        let invalid = &pass.diagnostics()[0];
        assert_eq!(invalid.kind, DiagnosticKind::InvalidConfig);
        assert_eq!(invalid.root.as_deref(), Some(Path::new("/w/broken")));
        assert!(invalid.message.contains("disabled"));
    }

    #[test]
    fn passing_needs_threshold_and_critical_rules() {
        let roots = [RootDescriptor::from_path("/w/app")];
        let all_done: String = (1..=8)
            .map(|id| format!("| {id}. Rule | | | | | DONE |\n"))
            .collect();
        let docs = sources(vec![("/w/app", MemoryRoot::new().spec("all", all_done))]);
        let pass = run(&roots, None, &docs);
        assert!(pass.flat().is_passing(100.0));

        // Security Review (critical) left uncovered
        let docs = sources(vec![(
            "/w/app",
            MemoryRoot::new().spec("one", "| 1. Testing Coverage | | | | | DONE |"),
        )]);
        let pass = run(&roots, None, &docs);
        assert!(!pass.flat().is_passing(0.0));
        assert_eq!(pass.flat().uncovered_critical().map(|c| c.rule.id).collect::<Vec<_>>(), vec![2]);

        // Disabling the critical rule lifts the gate
        let docs = sources(vec![(
            "/w/app",
            MemoryRoot::new()
                .config("disabled: [2]")
                .spec("one", "| 1. Testing Coverage | | | | | DONE |"),
        )]);
        let pass = run(&roots, None, &docs);
        assert!(pass.flat().is_passing(10.0));
        assert!(!pass.flat().is_passing(50.0));
    }

    #[test]
    fn rule_disabled_in_one_root_still_gates_the_others() {
        let roots = [
            RootDescriptor::from_path("/w/a"),
            RootDescriptor::from_path("/w/b"),
        ];
        let mostly_done: String = [1, 3, 4, 5, 6, 7, 8]
            .iter()
            .map(|id| format!("| {id}. Rule | | | | | DONE |\n"))
            .collect();
        let docs = sources(vec![
            ("/w/a", MemoryRoot::new().config("disabled: [2]")),
            ("/w/b", MemoryRoot::new().spec("all", mostly_done)),
        ]);

        let pass = run(&roots, None, &docs);
        let a = pass.root(Path::new("/w/a")).unwrap();
        assert!(!a.rule_set.get(2).unwrap().enabled);

        let rule2 = pass.flat().get(2).unwrap();
        assert!(rule2.rule.enabled);
        assert_eq!(rule2.overall, CoverageStatus::NotCovered);
        assert_eq!(pass.flat().uncovered_critical().map(|c| c.rule.id).collect::<Vec<_>>(), vec![2]);
        assert!(!pass.flat().is_passing(0.0));
    }

    #[test]
    fn aggregator_replaces_pass_on_refresh() {
        let mut aggregator = Aggregator::new(Layout::default());
        let docs = sources(vec![(
            "/w/app",
            MemoryRoot::new().spec("login", "| 1. Testing Coverage | | | | | DONE |"),
        )]);

        let first = aggregator.refresh_from(&[RootDescriptor::from_path("/w/app")], |d| {
            docs.get(&d.path).cloned().unwrap_or_default()
        });
        assert!(aggregator.root_coverage(Path::new("/w/app")).is_some());

        aggregator.refresh_from(&[RootDescriptor::from_path("/w/other")], |d| {
            docs.get(&d.path).cloned().unwrap_or_default()
        });
        assert!(aggregator.root_coverage(Path::new("/w/app")).is_none());
        assert!(aggregator.root_coverage(Path::new("/w/other")).is_some());
        assert_eq!(
            aggregator.flat_coverage().get(1).unwrap().overall,
            CoverageStatus::NotCovered
        );

        // Earlier snapshots are unaffected.
        assert!(first.root(Path::new("/w/app")).is_some());
    }
}
