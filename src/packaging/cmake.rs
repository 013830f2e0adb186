//! CMake driver
//!
//! Thin wrapper around the external build tool. Configure, build, and
//! install run as separate `cmake` invocations; exit status and stderr are
//! propagated verbatim into [`BuildError`].

use super::BuildError;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Invokes cmake's configure/build/install steps for an out-of-tree build
pub struct CmakeDriver {
    source_dir: PathBuf,
    build_dir: PathBuf,
    install_prefix: Option<PathBuf>,
    verbose: bool,
}

impl CmakeDriver {
    pub fn new(source_dir: &Path, build_dir: &Path) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            build_dir: build_dir.to_path_buf(),
            install_prefix: None,
            verbose: false,
        }
    }

    pub fn install_prefix(mut self, prefix: &Path) -> Self {
        self.install_prefix = Some(prefix.to_path_buf());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run the configure step
    pub fn configure(&self) -> Result<(), BuildError> {
        let mut args = vec![
            "-S".to_string(),
            self.source_dir.display().to_string(),
            "-B".to_string(),
            self.build_dir.display().to_string(),
        ];

        if let Some(prefix) = &self.install_prefix {
            args.push(format!("-DCMAKE_INSTALL_PREFIX={}", prefix.display()));
        }

        self.run("configure", &args)
    }

    /// Run the build step
    pub fn build(&self) -> Result<(), BuildError> {
        let mut args = vec![
            "--build".to_string(),
            self.build_dir.display().to_string(),
        ];

        if self.verbose {
            args.push("--verbose".to_string());
        }

        self.run("build", &args)
    }

    /// Run the install step
    pub fn install(&self) -> Result<(), BuildError> {
        let args = vec![
            "--install".to_string(),
            self.build_dir.display().to_string(),
        ];

        self.run("install", &args)
    }

    fn run(&self, step: &str, args: &[String]) -> Result<(), BuildError> {
        tracing::info!("Running cmake {}: {:?}", step, args);

        let output = Command::new("cmake")
            .args(args)
            .output()
            .map_err(|e| BuildError::Spawn(format!("cmake {}: {}", step, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(BuildError::Tool {
                step: step.to_string(),
                stderr,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_builder() {
        let driver = CmakeDriver::new(Path::new("/src"), Path::new("/build"))
            .install_prefix(Path::new("/install"))
            .verbose(true);
        assert_eq!(driver.source_dir, Path::new("/src"));
        assert_eq!(driver.build_dir, Path::new("/build"));
        assert_eq!(driver.install_prefix.as_deref(), Some(Path::new("/install")));
        assert!(driver.verbose);
    }
}
