//! Host settings.
//!
//! Settings live at `.config/guardrail/config.yaml` relative to the workspace
//! directory. Every field is optional; command-line flags and environment
//! variables win over the file.
//!
//! ```yaml
//! specs_dir: docs/specs
//! config_path: .guardrail/guardrails.yaml
//! requirements_file: requirements.md
//! primary_root: /work/monorepo
//! ```

use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use guardrail_core::Layout;
use guardrail_core::sources::{DEFAULT_CONFIG_PATH, DEFAULT_REQUIREMENTS_FILE, DEFAULT_SPECS_DIR};
use serde::Deserialize;
use tracing::debug;

/// Location of the settings file, relative to the workspace directory
pub const SETTINGS_FILE: &str = ".config/guardrail/config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Specifications directory, relative to each root
    pub specs_dir: PathBuf,
    /// Rule-set configuration document, relative to each root
    pub config_path: PathBuf,
    /// Requirements document name inside each specification
    pub requirements_file: String,
    /// Root whose rule-set every other root shares
    pub primary_root: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            specs_dir: PathBuf::from(DEFAULT_SPECS_DIR),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            requirements_file: DEFAULT_REQUIREMENTS_FILE.to_string(),
            primary_root: None,
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub specs_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub requirements_file: Option<String>,
    pub primary_root: Option<PathBuf>,
}

impl Settings {
    /// Parse a settings document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(text).wrap_err("Malformed guardrail settings")?;
        // An empty document is null, not a mapping.
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(value).wrap_err("Invalid guardrail settings")
    }

    /// Load settings for a workspace directory; a missing file means
    /// defaults. A relative `primary_root` is taken relative to `workspace`.
    pub fn load(workspace: &Path) -> Result<Self> {
        let path = workspace.join(SETTINGS_FILE);
        let mut settings = match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_yaml(&text)
                .wrap_err_with(|| format!("Failed to load settings from {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(e)
                    .wrap_err_with(|| format!("Failed to read settings from {}", path.display()));
            }
        };
        if let Some(primary) = &settings.primary_root
            && primary.is_relative()
        {
            settings.primary_root = Some(workspace.join(primary));
        }
        Ok(settings)
    }

    pub fn apply(&mut self, overrides: SettingsOverrides) {
        if let Some(specs_dir) = overrides.specs_dir {
            self.specs_dir = specs_dir;
        }
        if let Some(config_path) = overrides.config_path {
            self.config_path = config_path;
        }
        if let Some(requirements_file) = overrides.requirements_file {
            self.requirements_file = requirements_file;
        }
        if let Some(primary_root) = overrides.primary_root {
            self.primary_root = Some(primary_root);
        }
    }

    pub fn layout(&self) -> Layout {
        Layout {
            specs_dir: self.specs_dir.clone(),
            config_path: self.config_path.clone(),
            requirements_file: self.requirements_file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_defaults() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
        assert_eq!(Settings::from_yaml("\n# nothing\n").unwrap(), Settings::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let settings = Settings::from_yaml("specs_dir: docs/specs\n").unwrap();
        assert_eq!(settings.specs_dir, PathBuf::from("docs/specs"));
        assert_eq!(settings.config_path, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(settings.primary_root.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Settings::from_yaml("spec_dir: docs\n").unwrap_err();
        assert!(format!("{err:?}").contains("spec_dir"));
    }

    #[test]
    fn overrides_win() {
        let mut settings = Settings::from_yaml("requirements_file: REQ.md\n").unwrap();
        settings.apply(SettingsOverrides {
            requirements_file: Some("requirements.md".into()),
            primary_root: Some("/mono".into()),
            ..Default::default()
        });
        assert_eq!(settings.requirements_file, "requirements.md");
        assert_eq!(settings.primary_root.as_deref(), Some(Path::new("/mono")));
        assert_eq!(settings.layout().specs_dir, PathBuf::from(DEFAULT_SPECS_DIR));
    }

    #[test]
    fn load_resolves_relative_primary_root() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "primary_root: services/core\n").unwrap();

        let settings = Settings::load(temp.path()).unwrap();
        assert_eq!(settings.primary_root, Some(temp.path().join("services/core")));
    }

    #[test]
    fn load_without_file_is_defaults() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load(temp.path()).unwrap(), Settings::default());
    }
}
