//! Package recipe module
//!
//! The declarative side of the packaging pipeline: the recipe describes the
//! `atlas_recorder` artifact (metadata, pinned dependencies, staging rules,
//! exported libraries) and is consumed by [`crate::packaging`].

pub mod loader;
pub mod schema;

pub use loader::{load_or_builtin, read_recipe, write_recipe, RecipeError, RECIPE_FILE};
pub use schema::{CopyRule, DependencyRef, Recipe};
