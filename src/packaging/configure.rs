//! Configuration guard
//!
//! The only decision made at configure time: the target operating system.
//! Windows is rejected outright, before the build tool runs.

use super::BuildError;
use crate::recipe::Recipe;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Target operating system for a packaging run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
    Windows,
    Linux,
    Macos,
    Other,
}

impl TargetOs {
    /// The OS this process is running on
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            TargetOs::Windows
        } else if cfg!(target_os = "macos") {
            TargetOs::Macos
        } else if cfg!(target_os = "linux") {
            TargetOs::Linux
        } else {
            TargetOs::Other
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetOs::Windows => "Windows",
            TargetOs::Linux => "Linux",
            TargetOs::Macos => "Macos",
            TargetOs::Other => "Other",
        };
        write!(f, "{}", name)
    }
}

impl From<&str> for TargetOs {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "windows" => TargetOs::Windows,
            "linux" => TargetOs::Linux,
            "macos" | "darwin" => TargetOs::Macos,
            _ => TargetOs::Other,
        }
    }
}

/// Validate the target OS for a recipe
///
/// Fails hard on Windows; every other value proceeds.
pub fn configure(recipe: &Recipe, target: TargetOs) -> Result<(), BuildError> {
    if target == TargetOs::Windows {
        return Err(BuildError::UnsupportedOs(target));
    }

    tracing::debug!("Configured '{}' for {}", recipe.name, target);
    Ok(())
}
