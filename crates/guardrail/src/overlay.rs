//! Unsaved document contents layered over the files on disk.
//!
//! An editor host registers open buffers by absolute path; refreshes then
//! read the buffer instead of the file. Buffers for files that do not exist
//! on disk yet are picked up too.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use guardrail_core::{FsRoot, Layout, RootSource, SpecDocument};

/// Open documents keyed by absolute path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentOverlay {
    documents: BTreeMap<PathBuf, String>,
}

impl DocumentOverlay {
    pub fn insert(&mut self, path: PathBuf, content: String) {
        self.documents.insert(path, content);
    }

    pub fn remove(&mut self, path: &Path) -> Option<String> {
        self.documents.remove(path)
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.documents.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Requirements documents under `specs_dir` named `requirements_file`
    fn requirements_under<'a>(
        &'a self,
        specs_dir: &'a Path,
        requirements_file: &'a str,
    ) -> impl Iterator<Item = (String, &'a str)> + 'a {
        self.documents
            .range(specs_dir.to_path_buf()..)
            .take_while(move |(path, _)| path.starts_with(specs_dir))
            .filter_map(move |(path, content)| {
                if path.file_name()? != requirements_file {
                    return None;
                }
                let spec_dir = path.parent()?;
                if spec_dir.parent()? != specs_dir {
                    return None;
                }
                let name = spec_dir.file_name()?.to_string_lossy().into_owned();
                Some((name, content.as_str()))
            })
    }
}

/// A root on disk with open documents taking precedence
pub struct OverlayRoot<'a> {
    root: PathBuf,
    layout: &'a Layout,
    overlay: &'a DocumentOverlay,
}

impl<'a> OverlayRoot<'a> {
    pub fn new(root: impl Into<PathBuf>, layout: &'a Layout, overlay: &'a DocumentOverlay) -> Self {
        Self {
            root: root.into(),
            layout,
            overlay,
        }
    }

    fn disk(&self) -> FsRoot<'a> {
        FsRoot::new(self.root.clone(), self.layout)
    }
}

impl RootSource for OverlayRoot<'_> {
    fn config_document(&self) -> Option<String> {
        match self.overlay.get(&self.root.join(&self.layout.config_path)) {
            Some(content) => Some(content.to_string()),
            None => self.disk().config_document(),
        }
    }

    fn spec_documents(&self) -> Vec<SpecDocument> {
        let mut documents = self.disk().spec_documents();
        if self.overlay.is_empty() {
            return documents;
        }

        let specs_dir = self.root.join(&self.layout.specs_dir);
        for (name, content) in self
            .overlay
            .requirements_under(&specs_dir, &self.layout.requirements_file)
        {
            match documents.iter_mut().find(|document| document.name == name) {
                Some(document) => document.text = content.to_string(),
                None => documents.push(SpecDocument::new(name, content)),
            }
        }

        documents.sort_by(|a, b| a.name.cmp(&b.name));
        documents
    }
}
