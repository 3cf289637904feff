//! guardrail library - Guardrail compliance coverage across project roots
//!
//! This library exposes the host side of guardrail for testing and
//! embedding: settings, the refresh [`engine::Engine`], editor buffer
//! overlays and report rendering.

pub mod engine;
pub mod output;
pub mod overlay;
pub mod settings;

use std::path::PathBuf;

use eyre::{Result, WrapErr};
use guardrail_core::RootDescriptor;

/// Turn root paths into descriptors with absolute paths.
///
/// Relative paths are taken relative to the current directory. Every root
/// must be an existing directory.
pub fn root_descriptors(paths: &[PathBuf]) -> Result<Vec<RootDescriptor>> {
    paths
        .iter()
        .map(|path| -> Result<RootDescriptor> {
            let absolute = std::path::absolute(path)
                .wrap_err_with(|| format!("Failed to resolve root {}", path.display()))?;
            if !absolute.is_dir() {
                eyre::bail!("Root {} is not a directory", absolute.display());
            }
            Ok(RootDescriptor::from_path(absolute))
        })
        .collect()
}
