//! Guardrail rules and their severities

use std::fmt::{Display, Formatter};

/// Numeric rule identifier, unique within one root's effective rule-set.
pub type RuleId = u32;

/// How much a guardrail matters when it is not satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    /// All severities, most severe first
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Parse a severity from its lowercase name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A guardrail: a named, severity-tagged compliance requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub enabled: bool,
}

impl Rule {
    pub fn new(id: RuleId, name: impl Into<String>, severity: Severity) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            severity,
            enabled: true,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// True when another root's definition of the same id disagrees on
    /// name or severity.
    pub fn conflicts_with(&self, other: &Rule) -> bool {
        self.id == other.id && (self.name != other.name || self.severity != other.severity)
    }
}
