//! Recipe parsing, build settings, condition predicates and profiles for recipekit.
//!
//! This crate defines the schema layer: the TOML recipe format (`RecipeV1`),
//! the settings tuple every decision is keyed on (`Settings`), platform
//! predicates (`When`), package references (`PackageRef`), settings profiles
//! (`Profile`), and the built-in recipe templates.

pub mod condition;
pub mod profile;
pub mod recipe;
pub mod reference;
pub mod settings;
pub mod template;
pub mod types;

pub use condition::{OptionFlags, Pattern, When};
pub use profile::{default_profile_path, load_profile, parse_profile_file, Profile, ProfileError};
pub use recipe::{
    parse_recipe_file, parse_recipe_str, split_option_key, ConditionalVariables, ConfigureRule,
    CopyRule, GenerateSection, ImportsSection, OptionValue, PackageSection, PresetNaming,
    RecipeError, RecipeV1, Requirement, SystemLibsPatch, ToolRequirement, ToolchainSection,
    DEFAULT_RECIPE_FILE,
};
pub use reference::{PackageRef, ReferenceError};
pub use settings::{Arch, BuildType, Compiler, Os, Settings, SettingsError, SettingsOverrides};
pub use template::{get_template, list_templates, Template, BUILTIN_TEMPLATES};
pub use types::{InvalidPackageName, PackageName, PresetName};
