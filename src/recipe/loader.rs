//! Recipe file read/write operations
//!
//! Recipes live in a `recipe.toml` file next to the sources they describe.
//! When no file is present, callers fall back to the built-in
//! `atlas_recorder` recipe.

use super::schema::{ParseCoordinateError, Recipe};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Recipe-related errors
#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Coordinate(#[from] ParseCoordinateError),

    #[error("Recipe file not found: {0}")]
    NotFound(String),
}

/// Default recipe file name
pub const RECIPE_FILE: &str = "recipe.toml";

/// Read a recipe from a TOML file
pub fn read_recipe(path: &Path) -> Result<Recipe, RecipeError> {
    if !path.exists() {
        return Err(RecipeError::NotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path)?;
    let recipe: Recipe = toml::from_str(&content)?;

    tracing::debug!("Loaded recipe '{}' from {:?}", recipe.name, path);

    Ok(recipe)
}

/// Write a recipe to a TOML file
pub fn write_recipe(recipe: &Recipe, path: &Path) -> Result<(), RecipeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(recipe)?;
    fs::write(path, content)?;

    tracing::debug!("Saved recipe '{}' to {:?}", recipe.name, path);

    Ok(())
}

/// Load the recipe at `path`, or the built-in one when `path` is `None`
pub fn load_or_builtin(path: Option<&Path>) -> Result<Recipe, RecipeError> {
    match path {
        Some(p) => read_recipe(p),
        None => Ok(Recipe::atlas_recorder()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_and_read_recipe() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECIPE_FILE);

        let recipe = Recipe::atlas_recorder();
        write_recipe(&recipe, &path).unwrap();

        let loaded = read_recipe(&path).unwrap();
        assert_eq!(loaded, recipe);
    }

    #[test]
    fn test_missing_recipe_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(
            read_recipe(&path),
            Err(RecipeError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_or_builtin_falls_back() {
        let recipe = load_or_builtin(None).unwrap();
        assert_eq!(recipe.name, "export_mkv_k4a");
    }

    #[test]
    fn test_malformed_coordinate_in_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(RECIPE_FILE);

        let mut content = toml::to_string_pretty(&Recipe::atlas_recorder()).unwrap();
        content = content.replace("bzip2/1.0.8@conan/stable", "bzip2-1.0.8");
        std::fs::write(&path, content).unwrap();

        assert!(matches!(read_recipe(&path), Err(RecipeError::Toml(_))));
    }
}
