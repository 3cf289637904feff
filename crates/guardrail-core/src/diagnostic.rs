//! Advisory diagnostics produced during a refresh.
//!
//! Diagnostics never stop a refresh. They are one-shot: each refresh produces
//! a fresh list.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::config::InvalidConfig;
use crate::root::RootDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A root's configuration document was rejected
    InvalidConfig,
    /// Roots ask for different presets
    PresetDivergence,
    /// One rule id is defined differently by different roots
    RuleConflict,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::InvalidConfig => "invalid-config",
            DiagnosticKind::PresetDivergence => "preset-divergence",
            DiagnosticKind::RuleConflict => "rule-conflict",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The root concerned, for root-scoped diagnostics
    pub root: Option<PathBuf>,
    pub message: String,
}

impl Diagnostic {
    pub fn invalid_config(root: &RootDescriptor, invalid: &InvalidConfig) -> Self {
        Self {
            kind: DiagnosticKind::InvalidConfig,
            root: Some(root.path.clone()),
            message: format!(
                "guardrail configuration of {root} is invalid, using baseline rules: {invalid}"
            ),
        }
    }

    pub fn workspace(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            root: None,
            message: message.into(),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)
    }
}
