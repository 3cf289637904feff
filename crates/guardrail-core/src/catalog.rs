//! Built-in guardrail definitions: the baseline every root gets, and the
//! named presets that can be layered on top.
//!
//! The tables are immutable. Every accessor hands out fresh `Rule` values,
//! so callers are free to toggle `enabled` on what they receive.

use crate::rule::{Rule, RuleId, Severity};

/// Preset name meaning "no bundle, only what the config defines".
pub const CUSTOM_PRESET: &str = "custom";

struct RuleDef {
    id: RuleId,
    name: &'static str,
    description: &'static str,
    severity: Severity,
}

impl RuleDef {
    fn to_rule(&self) -> Rule {
        Rule::new(self.id, self.name, self.severity).with_description(self.description)
    }
}

const BASELINE: &[RuleDef] = &[
    RuleDef {
        id: 1,
        name: "Testing Coverage",
        description: "New behavior ships with automated tests that exercise it.",
        severity: Severity::High,
    },
    RuleDef {
        id: 2,
        name: "Security Review",
        description: "Input validation, authn/authz and secret handling have been reviewed.",
        severity: Severity::Critical,
    },
    RuleDef {
        id: 3,
        name: "Error Handling",
        description: "Failure modes are enumerated and handled or surfaced explicitly.",
        severity: Severity::High,
    },
    RuleDef {
        id: 4,
        name: "Documentation",
        description: "User-facing and operator-facing docs are updated.",
        severity: Severity::Medium,
    },
    RuleDef {
        id: 5,
        name: "Performance Budget",
        description: "Latency and resource budgets are stated and measured.",
        severity: Severity::Medium,
    },
    RuleDef {
        id: 6,
        name: "Accessibility",
        description: "UI changes meet the accessibility baseline.",
        severity: Severity::Medium,
    },
    RuleDef {
        id: 7,
        name: "Observability",
        description: "Logs, metrics and traces make the feature diagnosable in production.",
        severity: Severity::Medium,
    },
    RuleDef {
        id: 8,
        name: "Dependency Hygiene",
        description: "New dependencies are justified, pinned and license-checked.",
        severity: Severity::Low,
    },
];

const SAAS: &[RuleDef] = &[
    RuleDef {
        id: 9,
        name: "Tenant Isolation",
        description: "Data and compute are isolated between tenants.",
        severity: Severity::Critical,
    },
    RuleDef {
        id: 10,
        name: "Rate Limiting",
        description: "Per-tenant quotas and rate limits protect shared capacity.",
        severity: Severity::High,
    },
    RuleDef {
        id: 11,
        name: "Usage Metering",
        description: "Billable usage is metered accurately and auditable.",
        severity: Severity::Medium,
    },
    RuleDef {
        id: 12,
        name: "Data Residency",
        description: "Tenant data stays in the region the tenant selected.",
        severity: Severity::High,
    },
    RuleDef {
        id: 13,
        name: "Tenant Lifecycle",
        description: "Onboarding, suspension and deletion of tenants are handled.",
        severity: Severity::Medium,
    },
];

const FINTECH: &[RuleDef] = &[
    RuleDef {
        id: 14,
        name: "Audit Trail",
        description: "Every state change on financial records is attributable and immutable.",
        severity: Severity::Critical,
    },
    RuleDef {
        id: 15,
        name: "PCI Compliance",
        description: "Cardholder data never leaves the PCI scope boundary.",
        severity: Severity::Critical,
    },
    RuleDef {
        id: 16,
        name: "Transaction Idempotency",
        description: "Retries cannot double-apply a money movement.",
        severity: Severity::High,
    },
    RuleDef {
        id: 17,
        name: "Regulatory Reporting",
        description: "Required regulatory reports can be produced from stored data.",
        severity: Severity::High,
    },
    RuleDef {
        id: 18,
        name: "Fraud Monitoring",
        description: "Suspicious activity is detected and escalated.",
        severity: Severity::High,
    },
];

const HEALTHCARE: &[RuleDef] = &[
    RuleDef {
        id: 19,
        name: "PHI Encryption",
        description: "Protected health information is encrypted at rest and in transit.",
        severity: Severity::Critical,
    },
    RuleDef {
        id: 20,
        name: "Access Logging",
        description: "Every read of patient records is logged with the accessor.",
        severity: Severity::Critical,
    },
    RuleDef {
        id: 21,
        name: "Consent Management",
        description: "Patient consent is recorded and enforced before data use.",
        severity: Severity::High,
    },
    RuleDef {
        id: 22,
        name: "Data Retention",
        description: "Records are retained and purged according to policy.",
        severity: Severity::Medium,
    },
    RuleDef {
        id: 23,
        name: "Breach Notification",
        description: "Breaches can be detected and reported within the legal window.",
        severity: Severity::High,
    },
];

const PRESETS: &[(&str, &[RuleDef])] = &[
    ("saas", SAAS),
    ("fintech", FINTECH),
    ("healthcare", HEALTHCARE),
];

/// The rules every root gets, in catalog order.
pub fn baseline_rules() -> Vec<Rule> {
    BASELINE.iter().map(RuleDef::to_rule).collect()
}

/// The extra rules a named preset brings, in catalog order.
///
/// Returns `None` for unknown names and for [`CUSTOM_PRESET`].
pub fn preset(name: &str) -> Option<Vec<Rule>> {
    PRESETS
        .iter()
        .find(|(preset_name, _)| *preset_name == name)
        .map(|(_, defs)| defs.iter().map(RuleDef::to_rule).collect())
}

/// Names of all bundled presets.
pub fn preset_names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}

pub fn is_known_preset(name: &str) -> bool {
    PRESETS.iter().any(|(preset_name, _)| *preset_name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn baseline_has_eight_sequential_ids() {
        let ids: Vec<RuleId> = baseline_rules().iter().map(|r| r.id).collect();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
        assert!(baseline_rules().iter().all(|r| r.enabled));
    }

    #[test]
    fn saas_preset_uses_ids_nine_to_thirteen() {
        let ids: Vec<RuleId> = preset("saas").unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![9, 10, 11, 12, 13]);
    }

    #[test]
    fn custom_and_unknown_presets_have_no_bundle() {
        assert!(preset(CUSTOM_PRESET).is_none());
        assert!(preset("enterprise").is_none());
        assert!(!is_known_preset(CUSTOM_PRESET));
        assert!(is_known_preset("fintech"));
    }

    #[test]
    fn ids_are_unique_across_the_whole_catalog() {
        let mut seen = HashSet::new();
        let all = baseline_rules()
            .into_iter()
            .chain(preset_names().flat_map(|name| preset(name).unwrap()));
        for rule in all {
            assert!(seen.insert(rule.id), "duplicate catalog id {}", rule.id);
        }
    }

    #[test]
    fn accessors_hand_out_independent_copies() {
        let mut first = baseline_rules();
        first[0].enabled = false;
        assert!(baseline_rules()[0].enabled);
    }
}
