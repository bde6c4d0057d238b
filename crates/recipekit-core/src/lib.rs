//! Lifecycle engine for recipekit build recipes.
//!
//! This crate turns a parsed recipe plus a settings tuple into the artifacts a
//! CMake build consumes: the resolved requirement list, per-package option
//! values, a toolchain file, a consistently renamed presets document, patched
//! generated `*-data.cmake` files, and imported license files. The two
//! in-place transformations (`presets::rename_presets` and
//! `syslibs::patch_system_libs`) are usable on their own as well.

pub mod concurrency;
pub mod deps;
pub mod engine;
pub mod files;
pub mod presets;
pub mod syslibs;
pub mod toolchain;

pub use concurrency::GeneratorLock;
pub use deps::DependencyFolders;
pub use engine::{
    Engine, GenerateReport, ImportReport, ImportedPackage, Layout, OptionValues,
    ResolvedRequirement,
};
pub use files::{copy_matching, write_atomic, CopyMode};
pub use presets::{
    rename_preset_document, rename_presets, Orphan, PresetRenameOutcome, RenameReport, RenameRule,
    RenamedPreset,
};
pub use syslibs::{patch_system_libs, strip_system_lib, PatchFailure, PatchReport};
pub use toolchain::{generate_toolchain, toolchain_variables, write_base_presets, CMakeValue};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("recipe error: {0}")]
    Recipe(#[from] recipekit_schema::RecipeError),
    #[error("profile error: {0}")]
    Profile(#[from] recipekit_schema::ProfileError),
    #[error("settings error: {0}")]
    Settings(#[from] recipekit_schema::SettingsError),
    #[error("failed to update presets {path}: {message}")]
    Presets { path: PathBuf, message: String },
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("dependency '{0}' has no install folder (pass --dep {0}=<path> or list it in the profile)")]
    MissingDependency(String),
    #[error("invalid dependency folder '{0}', expected '<package>=<path>'")]
    InvalidDependencyFlag(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
