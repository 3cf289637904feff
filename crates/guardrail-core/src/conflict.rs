//! Cross-root configuration conflicts.
//!
//! Two checks run in order and the first one that fires is the only one
//! reported:
//! 1. preset divergence: roots ask for different presets
//! 2. rule identity: one rule id carries a different name or severity in
//!    different roots
//!
//! Neither blocks aggregation. Designating a primary root resolves both.

use std::collections::BTreeMap;

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::resolver::RuleSet;
use crate::rule::{Rule, RuleId, Severity};
use crate::root::RootDescriptor;

/// One rule id defined two different ways
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleConflict {
    pub id: RuleId,
    pub first: RuleDefinitionSite,
    pub other: RuleDefinitionSite,
}

/// Where and how a rule was defined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDefinitionSite {
    pub name: String,
    pub severity: Severity,
    pub root: RootDescriptor,
}

impl RuleDefinitionSite {
    fn new(rule: &Rule, root: &RootDescriptor) -> Self {
        Self {
            name: rule.name.clone(),
            severity: rule.severity,
            root: root.clone(),
        }
    }
}

/// Distinct presets requested across roots, in first-seen order.
pub fn distinct_presets(rule_sets: &[(&RootDescriptor, &RuleSet)]) -> Vec<String> {
    let mut presets: Vec<String> = Vec::new();
    for (_, rule_set) in rule_sets {
        if let Some(preset) = &rule_set.preset
            && !presets.contains(preset)
        {
            presets.push(preset.clone());
        }
    }
    presets
}

/// Every place where a later root redefines a rule id differently from the
/// first root that defined it.
pub fn rule_conflicts(rule_sets: &[(&RootDescriptor, &RuleSet)]) -> Vec<RuleConflict> {
    let mut first_seen: BTreeMap<RuleId, (&Rule, &RootDescriptor)> = BTreeMap::new();
    let mut conflicts = Vec::new();

    for &(root, rule_set) in rule_sets {
        for rule in &rule_set.rules {
            match first_seen.get(&rule.id) {
                None => {
                    first_seen.insert(rule.id, (rule, root));
                }
                Some(&(first, first_root)) if first.conflicts_with(rule) => {
                    conflicts.push(RuleConflict {
                        id: rule.id,
                        first: RuleDefinitionSite::new(first, first_root),
                        other: RuleDefinitionSite::new(rule, root),
                    });
                }
                Some(_) => {}
            }
        }
    }

    conflicts
}

/// Run both checks and report the first one that fires.
pub fn detect(rule_sets: &[(&RootDescriptor, &RuleSet)]) -> Option<Diagnostic> {
    let presets = distinct_presets(rule_sets);
    if presets.len() > 1 {
        return Some(Diagnostic::workspace(
            DiagnosticKind::PresetDivergence,
            format!(
                "roots use different guardrail presets: {}; designate a primary root to share one rule-set",
                presets.join(", ")
            ),
        ));
    }

    let conflicts = rule_conflicts(rule_sets);
    let first = conflicts.first()?;
    let mut message = format!(
        "rule {} is \"{}\" ({}) in {} but \"{}\" ({}) in {}",
        first.id,
        first.first.name,
        first.first.severity,
        first.first.root,
        first.other.name,
        first.other.severity,
        first.other.root,
    );
    if conflicts.len() > 1 {
        message.push_str(&format!(" ({} conflicting definitions in total)", conflicts.len()));
    }
    Some(Diagnostic::workspace(DiagnosticKind::RuleConflict, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;

    fn rule_set(config: &str) -> RuleSet {
        let resolution = resolve(Some(config));
        assert!(resolution.invalid.is_none(), "{config}");
        resolution.rule_set
    }

    #[test]
    fn identical_rule_sets_do_not_conflict() {
        let a = RootDescriptor::from_path("/w/a");
        let b = RootDescriptor::from_path("/w/b");
        let set = rule_set("preset: saas");
        assert!(detect(&[(&a, &set), (&b, &set)]).is_none());
    }

    #[test]
    fn absent_preset_does_not_count_as_divergence() {
        let a = RootDescriptor::from_path("/w/a");
        let b = RootDescriptor::from_path("/w/b");
        let with_preset = rule_set("preset: saas");
        let without = RuleSet::baseline();
        assert_eq!(distinct_presets(&[(&a, &with_preset), (&b, &without)]), vec!["saas"]);
        assert!(detect(&[(&a, &with_preset), (&b, &without)]).is_none());
    }

    #[test]
    fn preset_divergence_names_all_presets_and_stops() {
        let roots = [
            RootDescriptor::from_path("/w/a"),
            RootDescriptor::from_path("/w/b"),
            RootDescriptor::from_path("/w/c"),
        ];
        let saas = rule_set("preset: saas\ncustom:\n  - { id: 4, name: Docs }");
        let fintech = rule_set("preset: fintech");
        let custom = rule_set("preset: custom");

        let diagnostic = detect(&[
            (&roots[0], &saas),
            (&roots[1], &fintech),
            (&roots[2], &custom),
        ])
        .unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::PresetDivergence);
        assert!(diagnostic.message.contains("saas, fintech, custom"));
    }

    #[test]
    fn rule_conflict_cites_first_and_counts_total() {
        let a = RootDescriptor::new("/clients/one/app", "app");
        let b = RootDescriptor::new("/clients/two/app", "app");
        let first = RuleSet::baseline();
        let second = rule_set(
            "custom:\n  - { id: 4, name: Docs }\n  - { id: 8, name: Dependency Hygiene, severity: high }",
        );

        let conflicts = rule_conflicts(&[(&a, &first), (&b, &second)]);
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].id, 4);
        assert_eq!(conflicts[0].first.name, "Documentation");
        assert_eq!(conflicts[0].other.name, "Docs");
        assert_eq!(conflicts[1].other.severity, Severity::High);

        let diagnostic = detect(&[(&a, &first), (&b, &second)]).unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::RuleConflict);
        assert!(diagnostic.message.contains("\"Documentation\" (medium) in app (/clients/one/app)"));
        assert!(diagnostic.message.contains("\"Docs\" (medium) in app (/clients/two/app)"));
        assert!(diagnostic.message.contains("2 conflicting definitions"));
    }

    #[test]
    fn disjoint_ids_are_not_conflicts() {
        let a = RootDescriptor::from_path("/w/a");
        let b = RootDescriptor::from_path("/w/b");
        let saas = rule_set("preset: saas");
        let fintech = rule_set("preset: fintech");
        assert!(rule_conflicts(&[(&a, &saas), (&b, &fintech)]).is_empty());
    }
}
