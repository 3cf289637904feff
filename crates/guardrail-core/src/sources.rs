//! Where a root's documents come from.
//!
//! The computation never touches the filesystem directly: it asks a
//! [`RootSource`] for the configuration document and for the requirements
//! document of every specification. [`FsRoot`] reads a project root on disk,
//! [`MemoryRoot`] serves documents held in memory (tests, unsaved editor
//! buffers).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Default location of the specifications directory, relative to a root
pub const DEFAULT_SPECS_DIR: &str = ".guardrail/specs";
/// Default location of the rule-set configuration, relative to a root
pub const DEFAULT_CONFIG_PATH: &str = ".guardrail/guardrails.yaml";
/// Default name of the requirements document inside a specification
pub const DEFAULT_REQUIREMENTS_FILE: &str = "requirements.md";

/// One specification's requirements document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDocument {
    /// Specification name (its sub-directory name)
    pub name: String,
    pub text: String,
}

impl SpecDocument {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Provider of the documents that make up one project root
pub trait RootSource {
    /// The rule-set configuration document, if the root has a readable one
    fn config_document(&self) -> Option<String>;

    /// Requirements documents of every specification that has one,
    /// ordered by specification name
    fn spec_documents(&self) -> Vec<SpecDocument>;
}

/// Relative locations of the documents inside a root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub specs_dir: PathBuf,
    pub config_path: PathBuf,
    pub requirements_file: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            specs_dir: PathBuf::from(DEFAULT_SPECS_DIR),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            requirements_file: DEFAULT_REQUIREMENTS_FILE.to_string(),
        }
    }
}

/// A project root on disk
pub struct FsRoot<'a> {
    root: PathBuf,
    layout: &'a Layout,
}

impl<'a> FsRoot<'a> {
    pub fn new(root: impl Into<PathBuf>, layout: &'a Layout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }
}

/// Read a document, treating every failure as "absent".
fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "document not readable, treating as absent");
            None
        }
    }
}

impl RootSource for FsRoot<'_> {
    fn config_document(&self) -> Option<String> {
        read_optional(&self.root.join(&self.layout.config_path))
    }

    fn spec_documents(&self) -> Vec<SpecDocument> {
        let specs_dir = self.root.join(&self.layout.specs_dir);
        let entries = match std::fs::read_dir(&specs_dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %specs_dir.display(), error = %e, "specs directory not readable");
                }
                debug!(path = %specs_dir.display(), "no specs directory");
                return Vec::new();
            }
        };

        let mut documents: Vec<SpecDocument> = entries
            .filter_map(|entry| entry.ok())
            // Follows symlinks, unlike `DirEntry::file_type`
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                // Specifications without a requirements document are drafts.
                let text = read_optional(&entry.path().join(&self.layout.requirements_file))?;
                Some(SpecDocument { name, text })
            })
            .collect();

        documents.sort_by(|a, b| a.name.cmp(&b.name));
        documents
    }
}

/// In-memory root documents
#[derive(Debug, Clone, Default)]
pub struct MemoryRoot {
    config: Option<String>,
    specs: Vec<SpecDocument>,
}

impl MemoryRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration document
    pub fn config(mut self, text: impl Into<String>) -> Self {
        self.config = Some(text.into());
        self
    }

    /// Add a specification's requirements document
    pub fn spec(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.specs.push(SpecDocument::new(name, text));
        self
    }
}

impl RootSource for MemoryRoot {
    fn config_document(&self) -> Option<String> {
        self.config.clone()
    }

    fn spec_documents(&self) -> Vec<SpecDocument> {
        let mut specs = self.specs.clone();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }
}

impl<S: RootSource + ?Sized> RootSource for &S {
    fn config_document(&self) -> Option<String> {
        (**self).config_document()
    }

    fn spec_documents(&self) -> Vec<SpecDocument> {
        (**self).spec_documents()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn fs_root_reads_config_and_sorted_specs() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let layout = Layout::default();

        write(&root.join(".guardrail/guardrails.yaml"), "preset: saas\n");
        write(&root.join(".guardrail/specs/zeta/requirements.md"), "zeta");
        write(&root.join(".guardrail/specs/alpha/requirements.md"), "alpha");
        // Draft: directory without a requirements document
        std::fs::create_dir_all(root.join(".guardrail/specs/draft")).unwrap();
        // Stray file next to the spec directories
        write(&root.join(".guardrail/specs/README.md"), "not a spec");

        let source = FsRoot::new(root, &layout);
        assert_eq!(source.config_document().as_deref(), Some("preset: saas\n"));

        let names: Vec<String> = source.spec_documents().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn fs_root_without_documents_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let layout = Layout::default();
        let source = FsRoot::new(temp.path(), &layout);
        assert!(source.config_document().is_none());
        assert!(source.spec_documents().is_empty());
    }

    #[test]
    fn fs_root_honours_custom_layout() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let layout = Layout {
            specs_dir: PathBuf::from("docs/specs"),
            config_path: PathBuf::from("guardrails.yml"),
            requirements_file: "REQUIREMENTS.md".to_string(),
        };
        write(&root.join("guardrails.yml"), "preset: fintech\n");
        write(&root.join("docs/specs/payments/REQUIREMENTS.md"), "rows");

        let source = FsRoot::new(root, &layout);
        assert!(source.config_document().is_some());
        assert_eq!(source.spec_documents(), vec![SpecDocument::new("payments", "rows")]);
    }

    #[cfg(unix)]
    #[test]
    fn fs_root_follows_symlinked_spec_directories() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let layout = Layout::default();

        write(&root.join("shared/billing/requirements.md"), "billing");
        std::fs::create_dir_all(root.join(".guardrail/specs")).unwrap();
        std::os::unix::fs::symlink(root.join("shared/billing"), root.join(".guardrail/specs/billing"))
            .unwrap();

        let source = FsRoot::new(root, &layout);
        assert_eq!(source.spec_documents(), vec![SpecDocument::new("billing", "billing")]);
    }

    #[test]
    fn memory_root_orders_specs_by_name() {
        let source = MemoryRoot::new().spec("b", "").spec("a", "");
        let names: Vec<String> = source.spec_documents().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(source.config_document().is_none());
    }
}
