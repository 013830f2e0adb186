//! Packaging pipeline
//!
//! Drives a recipe through the build: target OS guard, delegation of
//! configure/build/install to the external build tool, and post-build
//! artifact staging.

pub mod cmake;
pub mod configure;
pub mod imports;

pub use cmake::CmakeDriver;
pub use configure::{configure, TargetOs};
pub use imports::{stage_imports, StageReport};

use crate::recipe::Recipe;
use std::path::PathBuf;
use thiserror::Error;

/// Packaging pipeline errors
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} not currently supported")]
    UnsupportedOs(TargetOs),

    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("glob walk failed: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("build tool failed ({step}): {stderr}")]
    Tool { step: String, stderr: String },

    #[error("failed to spawn build tool: {0}")]
    Spawn(String),
}

/// Directory layout for a packaging run
#[derive(Debug, Clone)]
pub struct PackageOptions {
    /// Directory holding the exported sources (CMakeLists.txt etc.)
    pub source_dir: PathBuf,

    /// Out-of-tree build directory
    pub build_dir: PathBuf,

    /// Install prefix handed to the build tool
    pub install_dir: PathBuf,

    /// Root under which dependency packages were unpacked
    pub package_root: PathBuf,

    /// Root of the consumer-visible staging layout
    pub stage_dir: PathBuf,

    /// Target operating system
    pub target_os: TargetOs,
}

/// Run the full packaging pipeline for a recipe
///
/// The guard runs first: on a rejected target no build step is ever invoked.
/// Build tool failures are propagated verbatim.
pub fn package(recipe: &Recipe, options: &PackageOptions) -> Result<StageReport, BuildError> {
    configure(recipe, options.target_os)?;

    let driver = CmakeDriver::new(&options.source_dir, &options.build_dir)
        .install_prefix(&options.install_dir)
        .verbose(true);

    driver.configure()?;
    driver.build()?;
    driver.install()?;

    let report = stage_imports(recipe, &options.package_root, &options.stage_dir)?;

    tracing::info!(
        "Packaged '{}' {}: {} artifacts staged",
        recipe.name,
        recipe.version,
        report.copied.len()
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_fires_before_any_build_step() {
        // None of these directories exist; if the build tool ran first the
        // error would be Spawn or Tool rather than UnsupportedOs.
        let options = PackageOptions {
            source_dir: PathBuf::from("/nonexistent/src"),
            build_dir: PathBuf::from("/nonexistent/build"),
            install_dir: PathBuf::from("/nonexistent/install"),
            package_root: PathBuf::from("/nonexistent/packages"),
            stage_dir: PathBuf::from("/nonexistent/stage"),
            target_os: TargetOs::Windows,
        };

        let err = package(&Recipe::atlas_recorder(), &options).unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedOs(TargetOs::Windows)));
    }
}
