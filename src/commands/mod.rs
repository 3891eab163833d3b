pub mod init;
pub mod report;
pub mod schema;
pub mod status;
pub mod summary;

use std::path::{Path, PathBuf};

use anyhow::Context;

/// Resolve the project root from the flag or the current directory.
pub(crate) fn resolve_project_root(flag: Option<&Path>) -> anyhow::Result<PathBuf> {
    flag.map_or_else(
        || std::env::current_dir().context("resolve current directory"),
        |p| Ok(p.to_path_buf()),
    )
}
