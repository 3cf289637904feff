//! Rule-set configuration documents.
//!
//! A root may carry a YAML document (by default `.guardrail/guardrails.yaml`)
//! that layers project-specific changes over the catalog:
//!
//! ```yaml
//! preset: saas
//! overrides:
//!   4: { enabled: false }
//! disabled: [6, "Accessibility"]
//! custom:
//!   - id: 100
//!     name: Feature Flags
//!     severity: low
//! selected_ids: [1, 2, 9, 100]
//! ```
//!
//! The document is parsed into an untyped value and then checked field by
//! field. Either every field is valid and a [`GuardrailConfig`] comes out, or
//! the caller gets every problem found as an [`InvalidConfig`]. Nothing is
//! ever half-applied.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use serde_yaml::{Mapping, Value};

use crate::rule::{Rule, RuleId, Severity};

/// A fully validated rule-set configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardrailConfig {
    /// Raw preset name, kept even when it names no known bundle
    pub preset: Option<String>,
    pub overrides: BTreeMap<RuleId, RuleOverride>,
    pub disabled: Vec<DisabledEntry>,
    pub custom: Vec<Rule>,
    /// When present, restricts and reorders the final rule-set
    pub selected_ids: Option<Vec<RuleId>>,
}

/// Per-rule override entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleOverride {
    pub enabled: Option<bool>,
}

/// One entry of the `disabled` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisabledEntry {
    Id(RuleId),
    /// Either a rule name or a stringified id
    Text(String),
}

impl DisabledEntry {
    pub fn matches(&self, rule: &Rule) -> bool {
        match self {
            DisabledEntry::Id(id) => rule.id == *id,
            DisabledEntry::Text(text) => *text == rule.name || *text == rule.id.to_string(),
        }
    }
}

/// A single problem found while validating a configuration document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted path to the offending field (`custom[1].severity`)
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for ConfigIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every issue found in a rejected configuration document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidConfig {
    pub issues: Vec<ConfigIssue>,
}

impl Display for InvalidConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join("; "))
    }
}

impl std::error::Error for InvalidConfig {}

impl GuardrailConfig {
    /// Parse and validate a configuration document.
    ///
    /// An empty document is a valid, empty configuration.
    pub fn parse(text: &str) -> Result<Self, InvalidConfig> {
        let value: Value = serde_yaml::from_str(text).map_err(|e| InvalidConfig {
            issues: vec![ConfigIssue::new("<document>", format!("malformed YAML: {e}"))],
        })?;

        let mut issues = Vec::new();
        let config = validate_document(&value, &mut issues);
        if issues.is_empty() {
            Ok(config)
        } else {
            Err(InvalidConfig { issues })
        }
    }
}

fn validate_document(value: &Value, issues: &mut Vec<ConfigIssue>) -> GuardrailConfig {
    let mapping = match value {
        Value::Null => return GuardrailConfig::default(),
        Value::Mapping(mapping) => mapping,
        other => {
            issues.push(ConfigIssue::new(
                "<document>",
                format!("expected a mapping at the top level, found {}", kind(other)),
            ));
            return GuardrailConfig::default();
        }
    };

    GuardrailConfig {
        preset: validate_preset(field(mapping, "preset"), issues),
        overrides: validate_overrides(field(mapping, "overrides"), issues),
        disabled: validate_disabled(field(mapping, "disabled"), issues),
        custom: validate_custom(field(mapping, "custom"), issues),
        selected_ids: validate_selected_ids(field(mapping, "selected_ids"), issues),
    }
}

/// Look up a field, treating an explicit `null` like an absent key
fn field<'a>(mapping: &'a Mapping, key: &str) -> Option<&'a Value> {
    mapping.get(key).filter(|value| !value.is_null())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Numeric value as a rule id, if it is a non-negative integer in range
fn as_rule_id(value: &Value) -> Option<RuleId> {
    value.as_u64().and_then(|n| RuleId::try_from(n).ok())
}

fn validate_preset(value: Option<&Value>, issues: &mut Vec<ConfigIssue>) -> Option<String> {
    match value? {
        Value::String(name) => Some(name.clone()),
        other => {
            issues.push(ConfigIssue::new(
                "preset",
                format!("must be a string, found {}", kind(other)),
            ));
            None
        }
    }
}

fn validate_overrides(
    value: Option<&Value>,
    issues: &mut Vec<ConfigIssue>,
) -> BTreeMap<RuleId, RuleOverride> {
    let mut overrides = BTreeMap::new();
    let Some(value) = value else {
        return overrides;
    };
    let Value::Mapping(entries) = value else {
        issues.push(ConfigIssue::new(
            "overrides",
            format!("must be a mapping of rule id to settings, found {}", kind(value)),
        ));
        return overrides;
    };

    for (key, entry) in entries {
        let label = match key {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => kind(other).to_string(),
        };
        let path = format!("overrides.{label}");

        let Value::Mapping(settings) = entry else {
            issues.push(ConfigIssue::new(
                path,
                format!("must be a mapping, found {}", kind(entry)),
            ));
            continue;
        };

        let enabled = match field(settings, "enabled") {
            None => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => {
                issues.push(ConfigIssue::new(
                    format!("{path}.enabled"),
                    format!("must be a boolean, found {}", kind(other)),
                ));
                None
            }
        };

        // Keys that can never name a rule are tolerated and dropped.
        let id = match key {
            Value::String(s) => s.trim().parse::<RuleId>().ok(),
            other => as_rule_id(other),
        };
        if let Some(id) = id {
            overrides.insert(id, RuleOverride { enabled });
        }
    }

    overrides
}

fn validate_disabled(value: Option<&Value>, issues: &mut Vec<ConfigIssue>) -> Vec<DisabledEntry> {
    let Some(value) = value else {
        return Vec::new();
    };
    let Value::Sequence(items) = value else {
        issues.push(ConfigIssue::new(
            "disabled",
            format!("must be a list of rule ids or names, found {}", kind(value)),
        ));
        return Vec::new();
    };

    let mut disabled = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match item {
            Value::String(text) => disabled.push(DisabledEntry::Text(text.clone())),
            Value::Number(_) => {
                if let Some(id) = as_rule_id(item) {
                    disabled.push(DisabledEntry::Id(id));
                }
            }
            other => issues.push(ConfigIssue::new(
                format!("disabled[{index}]"),
                format!("must be a number or a string, found {}", kind(other)),
            )),
        }
    }
    disabled
}

fn validate_custom(value: Option<&Value>, issues: &mut Vec<ConfigIssue>) -> Vec<Rule> {
    let Some(value) = value else {
        return Vec::new();
    };
    let Value::Sequence(items) = value else {
        issues.push(ConfigIssue::new(
            "custom",
            format!("must be a list of rule definitions, found {}", kind(value)),
        ));
        return Vec::new();
    };

    let mut rules = Vec::with_capacity(items.len());
    let mut seen_ids = BTreeSet::new();
    for (index, item) in items.iter().enumerate() {
        let path = format!("custom[{index}]");
        let Value::Mapping(def) = item else {
            issues.push(ConfigIssue::new(
                path,
                format!("must be a mapping, found {}", kind(item)),
            ));
            continue;
        };
        if let Some(rule) = validate_custom_rule(&path, def, issues) {
            if seen_ids.insert(rule.id) {
                rules.push(rule);
            } else {
                issues.push(ConfigIssue::new(
                    format!("{path}.id"),
                    format!("rule id {} is defined more than once", rule.id),
                ));
            }
        }
    }
    rules
}

fn validate_custom_rule(path: &str, def: &Mapping, issues: &mut Vec<ConfigIssue>) -> Option<Rule> {
    let before = issues.len();

    let id = match field(def, "id") {
        Some(value @ Value::Number(_)) => {
            let id = as_rule_id(value);
            if id.is_none() {
                issues.push(ConfigIssue::new(
                    format!("{path}.id"),
                    "must be a non-negative integer",
                ));
            }
            id
        }
        Some(other) => {
            issues.push(ConfigIssue::new(
                format!("{path}.id"),
                format!("must be a number, found {}", kind(other)),
            ));
            None
        }
        None => {
            issues.push(ConfigIssue::new(format!("{path}.id"), "is required"));
            None
        }
    };

    let name = match field(def, "name") {
        Some(Value::String(name)) => Some(name.clone()),
        Some(other) => {
            issues.push(ConfigIssue::new(
                format!("{path}.name"),
                format!("must be a string, found {}", kind(other)),
            ));
            None
        }
        None => {
            issues.push(ConfigIssue::new(format!("{path}.name"), "is required"));
            None
        }
    };

    let description = match field(def, "description") {
        None => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => {
            issues.push(ConfigIssue::new(
                format!("{path}.description"),
                format!("must be a string, found {}", kind(other)),
            ));
            String::new()
        }
    };

    let severity = match field(def, "severity") {
        None => Severity::default(),
        Some(Value::String(text)) => Severity::parse(text).unwrap_or_else(|| {
            issues.push(ConfigIssue::new(
                format!("{path}.severity"),
                format!("must be one of critical, high, medium, low; found {text:?}"),
            ));
            Severity::default()
        }),
        Some(other) => {
            issues.push(ConfigIssue::new(
                format!("{path}.severity"),
                format!("must be a string, found {}", kind(other)),
            ));
            Severity::default()
        }
    };

    let enabled = match field(def, "enabled") {
        None => true,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            issues.push(ConfigIssue::new(
                format!("{path}.enabled"),
                format!("must be a boolean, found {}", kind(other)),
            ));
            true
        }
    };

    if issues.len() != before {
        return None;
    }
    Some(Rule {
        id: id?,
        name: name?,
        description,
        severity,
        enabled,
    })
}

fn validate_selected_ids(
    value: Option<&Value>,
    issues: &mut Vec<ConfigIssue>,
) -> Option<Vec<RuleId>> {
    let value = value?;
    let Value::Sequence(items) = value else {
        issues.push(ConfigIssue::new(
            "selected_ids",
            format!("must be a list of rule ids, found {}", kind(value)),
        ));
        return None;
    };

    let mut ids = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match item {
            // Numbers outside the id range can never match and are dropped.
            Value::Number(_) => ids.extend(as_rule_id(item)),
            other => issues.push(ConfigIssue::new(
                format!("selected_ids[{index}]"),
                format!("must be a number, found {}", kind(other)),
            )),
        }
    }
    Some(ids)
}
