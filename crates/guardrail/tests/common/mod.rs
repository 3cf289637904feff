//! Common test utilities.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Write a file, creating parent directories.
pub fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().expect("path has a parent"))
        .expect("Failed to create parent dir");
    std::fs::write(path, content).expect("Failed to write file");
}

/// A compliance matrix row
pub fn row(id: u32, name: &str, status: &str) -> String {
    format!("| {id}. {name} | owner | | | | {status} |")
}

/// Add a specification with the given matrix rows to a root.
pub fn add_spec(root: &Path, name: &str, rows: &[String]) -> PathBuf {
    let path = root
        .join(".guardrail/specs")
        .join(name)
        .join("requirements.md");
    let content = format!(
        "# {name}\n\n| Rule | Owner | Notes | Evidence | Review | Status |\n|---|---|---|---|---|---|\n{}\n",
        rows.join("\n")
    );
    write(&path, &content);
    path
}

/// Set a root's guardrail configuration.
pub fn set_config(root: &Path, yaml: &str) -> PathBuf {
    let path = root.join(".guardrail/guardrails.yaml");
    write(&path, yaml);
    path
}

/// Create a temporary workspace with two roots that share a display name:
/// `clients/one/app` (preset saas) and `clients/two/app` (preset fintech).
pub fn create_temp_workspace() -> (tempfile::TempDir, PathBuf, PathBuf) {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");

    let one = temp.path().join("clients/one/app");
    let two = temp.path().join("clients/two/app");

    set_config(&one, "preset: saas\n");
    add_spec(
        &one,
        "signup",
        &[
            row(1, "Testing Coverage", "DONE"),
            row(9, "Tenant Isolation", "N/A - single tenant"),
        ],
    );

    set_config(&two, "preset: fintech\n");
    add_spec(
        &two,
        "payments",
        &[
            row(1, "Testing Coverage", "TODO"),
            row(15, "PCI Compliance", "DONE"),
        ],
    );

    (temp, one, two)
}
