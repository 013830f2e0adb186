//! Package recipe schema
//!
//! Defines the declarative model for the `atlas_recorder` package: metadata,
//! pinned dependency coordinates, source export patterns, artifact import
//! rules, and the libraries exposed to downstream consumers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error raised when a dependency coordinate string cannot be parsed
#[derive(Error, Debug)]
#[error("invalid dependency coordinate '{0}', expected 'name/version@channel'")]
pub struct ParseCoordinateError(pub String);

/// A pinned dependency coordinate: `name/version@channel`
///
/// The channel identifies where within the package repository the versioned
/// dependency is sourced from (e.g. `camposs/stable`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DependencyRef {
    /// Package name
    pub name: String,

    /// Pinned version
    pub version: String,

    /// Distribution channel (user/channel pair)
    pub channel: String,
}

impl DependencyRef {
    pub fn new(name: &str, version: &str, channel: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            channel: channel.to_string(),
        }
    }

    /// Render the coordinate in its canonical `name/version@channel` form
    pub fn coordinate(&self) -> String {
        format!("{}/{}@{}", self.name, self.version, self.channel)
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.coordinate())
    }
}

impl FromStr for DependencyRef {
    type Err = ParseCoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (pkg, channel) = s
            .split_once('@')
            .ok_or_else(|| ParseCoordinateError(s.to_string()))?;
        let (name, version) = pkg
            .split_once('/')
            .ok_or_else(|| ParseCoordinateError(s.to_string()))?;

        if name.is_empty() || version.is_empty() || channel.is_empty() {
            return Err(ParseCoordinateError(s.to_string()));
        }

        Ok(Self::new(name, version, channel))
    }
}

impl From<DependencyRef> for String {
    fn from(dep: DependencyRef) -> String {
        dep.coordinate()
    }
}

impl TryFrom<String> for DependencyRef {
    type Error = ParseCoordinateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A post-build artifact staging rule
///
/// Copies files matching `pattern` from a package's `src` subdirectory into
/// the consumer-visible `dst` subdirectory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRule {
    /// Source subdirectory inside the dependency package
    pub src: String,

    /// Glob pattern matched against file names under `src`
    pub pattern: String,

    /// Destination subdirectory in the staging layout
    pub dst: String,
}

impl CopyRule {
    pub fn new(src: &str, pattern: &str, dst: &str) -> Self {
        Self {
            src: src.to_string(),
            pattern: pattern.to_string(),
            dst: dst.to_string(),
        }
    }
}

/// The package recipe: everything the packaging pipeline needs to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Package name used for artifact identification
    pub name: String,

    /// Package version string
    pub version: String,

    /// Short description
    pub description: String,

    /// Upstream project URL
    pub url: String,

    /// License tag
    pub license: String,

    /// Pinned dependency coordinates
    pub requires: Vec<DependencyRef>,

    /// Source patterns deployed with the package
    pub exports_sources: Vec<String>,

    /// Library names exposed to downstream consumers
    pub exported_libs: Vec<String>,

    /// Artifact staging rules applied after the build
    pub imports: Vec<CopyRule>,
}

impl Recipe {
    /// The built-in recipe for the `atlas_recorder` artifact
    pub fn atlas_recorder() -> Self {
        Self {
            name: "export_mkv_k4a".to_string(),
            version: "0.1.0".to_string(),
            description: "export_mkv_k4a".to_string(),
            url: "https://github.com/TUM-CAMP-NARVIS/export_mkv_k4a".to_string(),
            license: "GPL".to_string(),
            requires: vec![
                DependencyRef::new("kinect-azure-sensor-sdk", "1.4.1", "camposs/stable"),
                DependencyRef::new("bzip2", "1.0.8", "conan/stable"),
                DependencyRef::new("boost", "1.75.0", "camposs/stable"),
            ],
            exports_sources: vec![
                "cmake/*".to_string(),
                "include/*".to_string(),
                "src/*".to_string(),
                "CMakeLists.txt".to_string(),
            ],
            exported_libs: vec!["atlas_recorder".to_string()],
            imports: vec![
                CopyRule::new("bin", "*.dll", "bin"),
                CopyRule::new("lib", "*.dll", "bin"),
                CopyRule::new("lib", "*.dylib*", "lib"),
                CopyRule::new("lib", "*.so*", "lib"),
                CopyRule::new("lib", "*.a", "lib"),
                CopyRule::new("bin", "*", "bin"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        let dep: DependencyRef = "bzip2/1.0.8@conan/stable".parse().unwrap();
        assert_eq!(dep.name, "bzip2");
        assert_eq!(dep.version, "1.0.8");
        assert_eq!(dep.channel, "conan/stable");
        assert_eq!(dep.coordinate(), "bzip2/1.0.8@conan/stable");
    }

    #[test]
    fn test_parse_coordinate_rejects_malformed() {
        assert!("bzip2".parse::<DependencyRef>().is_err());
        assert!("bzip2@conan/stable".parse::<DependencyRef>().is_err());
        assert!("bzip2/1.0.8".parse::<DependencyRef>().is_err());
        assert!("/1.0.8@conan/stable".parse::<DependencyRef>().is_err());
    }

    #[test]
    fn test_builtin_dependency_pins() {
        let recipe = Recipe::atlas_recorder();
        let coordinates: Vec<String> =
            recipe.requires.iter().map(|d| d.coordinate()).collect();
        assert_eq!(
            coordinates,
            vec![
                "kinect-azure-sensor-sdk/1.4.1@camposs/stable",
                "bzip2/1.0.8@conan/stable",
                "boost/1.75.0@camposs/stable",
            ]
        );
    }

    #[test]
    fn test_builtin_exported_lib() {
        let recipe = Recipe::atlas_recorder();
        assert_eq!(recipe.exported_libs, vec!["atlas_recorder"]);
    }

    #[test]
    fn test_builtin_copy_rules() {
        let recipe = Recipe::atlas_recorder();
        let expected = [
            ("bin", "*.dll", "bin"),
            ("lib", "*.dll", "bin"),
            ("lib", "*.dylib*", "lib"),
            ("lib", "*.so*", "lib"),
            ("lib", "*.a", "lib"),
            ("bin", "*", "bin"),
        ];
        assert_eq!(recipe.imports.len(), expected.len());
        // The mapping is a set of pairs; order of application is not part of
        // the contract.
        for (src, pattern, dst) in expected {
            assert!(
                recipe
                    .imports
                    .contains(&CopyRule::new(src, pattern, dst)),
                "missing copy rule {} {} {}",
                src,
                pattern,
                dst
            );
        }
    }
}
