//! Effective rule-set resolution for one project root.
//!
//! Layering order:
//! 1. baseline catalog rules
//! 2. the named preset's rules, if the preset is known
//! 3. `overrides` (per-id `enabled` toggles)
//! 4. `disabled` (force-disable by id or name, wins over 3)
//! 5. `custom` rules
//! 6. `selected_ids` (filter and reorder)

use tracing::debug;

use crate::catalog::{self, CUSTOM_PRESET};
use crate::config::{GuardrailConfig, InvalidConfig};
use crate::rule::{Rule, RuleId};

/// The effective rules of one root, plus the raw preset it asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
    /// Raw preset value from the configuration, even if unrecognized
    pub preset: Option<String>,
}

impl RuleSet {
    /// The catalog baseline with no preset
    pub fn baseline() -> Self {
        Self {
            rules: catalog::baseline_rules(),
            preset: None,
        }
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn contains(&self, id: RuleId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Outcome of resolving a root's rule-set
#[derive(Debug, Clone)]
pub struct Resolution {
    pub rule_set: RuleSet,
    /// Set when a configuration document existed but was rejected; the
    /// rule-set is then the plain baseline.
    pub invalid: Option<InvalidConfig>,
}

/// Resolve a rule-set from an optional configuration document.
pub fn resolve(document: Option<&str>) -> Resolution {
    let Some(text) = document else {
        return Resolution {
            rule_set: RuleSet::baseline(),
            invalid: None,
        };
    };

    match GuardrailConfig::parse(text) {
        Ok(config) => Resolution {
            rule_set: apply(&config),
            invalid: None,
        },
        Err(invalid) => Resolution {
            rule_set: RuleSet::baseline(),
            invalid: Some(invalid),
        },
    }
}

/// Layer a validated configuration over the catalog.
pub fn apply(config: &GuardrailConfig) -> RuleSet {
    let mut rules = catalog::baseline_rules();

    if let Some(name) = config.preset.as_deref().filter(|name| *name != CUSTOM_PRESET) {
        match catalog::preset(name) {
            Some(bundle) => rules.extend(bundle),
            None => debug!(preset = name, "unknown preset, no bundle applied"),
        }
    }

    for rule in &mut rules {
        if let Some(enabled) = config.overrides.get(&rule.id).and_then(|o| o.enabled) {
            rule.enabled = enabled;
        }
    }

    for rule in &mut rules {
        if config.disabled.iter().any(|entry| entry.matches(rule)) {
            rule.enabled = false;
        }
    }

    for custom in &config.custom {
        // Ids stay unique within a rule-set: a custom rule reusing an
        // existing id replaces that definition in place.
        match rules.iter_mut().find(|rule| rule.id == custom.id) {
            Some(existing) => {
                debug!(id = custom.id, "custom rule replaces catalog rule");
                *existing = custom.clone();
            }
            None => rules.push(custom.clone()),
        }
    }

    if let Some(selected) = &config.selected_ids {
        rules = selected
            .iter()
            .filter_map(|id| rules.iter().find(|rule| rule.id == *id).cloned())
            .collect();
        // A repeated id in selected_ids must not duplicate the rule.
        let mut seen = std::collections::HashSet::new();
        rules.retain(|rule| seen.insert(rule.id));
    }

    RuleSet {
        rules,
        preset: config.preset.clone(),
    }
}
