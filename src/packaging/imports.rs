//! Artifact staging
//!
//! Applies a recipe's copy rules after the build: for each
//! (source subdirectory, glob pattern, destination subdirectory) triple,
//! copies matching files from the unpacked dependency packages into the
//! consumer-visible layout. No ordering guarantees, no conflict resolution,
//! no retries.

use super::BuildError;
use crate::recipe::Recipe;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of a staging run
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageReport {
    /// Destination paths of every file copied
    pub copied: Vec<PathBuf>,
}

/// Apply a recipe's import rules
///
/// Globs are expanded under `package_root`; matches land under `stage_dir`.
/// A rule that matches nothing is not an error.
pub fn stage_imports(
    recipe: &Recipe,
    package_root: &Path,
    stage_dir: &Path,
) -> Result<StageReport, BuildError> {
    let mut report = StageReport::default();

    for rule in &recipe.imports {
        let pattern = package_root
            .join(&rule.src)
            .join(&rule.pattern)
            .display()
            .to_string();

        let matches = glob::glob(&pattern).map_err(|source| BuildError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;

        let dst_dir = stage_dir.join(&rule.dst);

        for entry in matches {
            let src_path = entry?;
            if !src_path.is_file() {
                continue;
            }

            // File name is always present for a glob match on a file.
            let file_name = match src_path.file_name() {
                Some(name) => name.to_os_string(),
                None => continue,
            };

            fs::create_dir_all(&dst_dir)?;
            let dst_path = dst_dir.join(file_name);
            fs::copy(&src_path, &dst_path)?;

            tracing::debug!("Staged {:?} -> {:?}", src_path, dst_path);
            report.copied.push(dst_path);
        }
    }

    Ok(report)
}
