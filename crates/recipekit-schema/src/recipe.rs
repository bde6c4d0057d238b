use crate::condition::{OptionFlags, When};
use crate::reference::{PackageRef, ReferenceError};
use crate::settings::SettingsError;
use crate::types::PackageName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const RECIPE_VERSION: u32 = 1;
pub const DEFAULT_RECIPE_FILE: &str = "recipekit.toml";

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("failed to read recipe file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse recipe: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported recipe_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("package.name must not be empty")]
    EmptyPackageName,
    #[error("invalid package reference: {0}")]
    Reference(#[from] ReferenceError),
    #[error("invalid condition in {context}: {source}")]
    Condition {
        context: String,
        source: SettingsError,
    },
    #[error("package '{0}' is required more than once without a condition or override")]
    DuplicateRequirement(String),
    #[error("invalid option key '{0}', expected '<package|*>:<option>'")]
    InvalidOptionKey(String),
    #[error("generate.patch_system_libs.token must not be empty")]
    EmptyPatchToken,
    #[error("copy rule for '{0}' has an empty pattern")]
    EmptyCopyPattern(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RecipeV1 {
    pub recipe_version: u32,
    pub package: PackageSection,
    #[serde(default)]
    pub options: OptionFlags,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Requirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_requires: Vec<ToolRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configure: Vec<ConfigureRule>,
    #[serde(default)]
    pub toolchain: ToolchainSection,
    #[serde(default)]
    pub generate: GenerateSection,
    #[serde(default)]
    pub imports: ImportsSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PackageSection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// A `[[requires]]` entry: a dependency declaration with an optional
/// platform predicate.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Requirement {
    #[serde(rename = "ref")]
    pub reference: PackageRef,
    /// Force this version over whatever transitive dependencies ask for.
    #[serde(default, rename = "override")]
    pub force: bool,
    #[serde(default, skip_serializing_if = "When::is_empty")]
    pub when: When,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolRequirement {
    #[serde(rename = "ref")]
    pub reference: PackageRef,
    #[serde(default, skip_serializing_if = "When::is_empty")]
    pub when: When,
}

/// Option value assigned by a `[[configure]]` rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigureRule {
    #[serde(default, skip_serializing_if = "When::is_empty")]
    pub when: When,
    /// `"<package>:<option>"` or `"*:<option>"` to value.
    pub options: BTreeMap<String, OptionValue>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ToolchainSection {
    #[serde(default = "default_toolchain_file")]
    pub file: String,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional: Vec<ConditionalVariables>,
}

impl Default for ToolchainSection {
    fn default() -> Self {
        Self {
            file: default_toolchain_file(),
            variables: BTreeMap::new(),
            conditional: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConditionalVariables {
    pub when: When,
    pub variables: BTreeMap<String, String>,
}

/// How configure presets are renamed after generation.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresetNaming {
    /// Name derived from the settings tuple; stable across runs.
    #[default]
    Settings,
    /// Old name plus `<arch>-<8 random hex chars>`; unique per run.
    Random,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GenerateSection {
    #[serde(default = "default_presets_file")]
    pub presets: String,
    #[serde(default)]
    pub preset_naming: PresetNaming,
    #[serde(default)]
    pub patch_system_libs: SystemLibsPatch,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub copy: Vec<CopyRule>,
}

impl Default for GenerateSection {
    fn default() -> Self {
        Self {
            presets: default_presets_file(),
            preset_naming: PresetNaming::default(),
            patch_system_libs: SystemLibsPatch::default(),
            copy: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SystemLibsPatch {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_patch_token")]
    pub token: String,
    #[serde(default = "default_data_patterns")]
    pub patterns: Vec<String>,
}

impl Default for SystemLibsPatch {
    fn default() -> Self {
        Self {
            enabled: true,
            token: default_patch_token(),
            patterns: default_data_patterns(),
        }
    }
}

/// Copy files out of a dependency's install folder into the source tree.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CopyRule {
    pub dependency: PackageName,
    /// Folder inside the dependency's install folder.
    #[serde(default)]
    pub src: String,
    pub pattern: String,
    /// Destination, relative to the source folder.
    pub dst: String,
    #[serde(default, skip_serializing_if = "When::is_empty")]
    pub when: When,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ImportsSection {
    #[serde(default = "default_true")]
    pub licenses: bool,
    #[serde(default = "default_licenses_dst")]
    pub dst: String,
    #[serde(default = "default_license_pattern")]
    pub pattern: String,
}

impl Default for ImportsSection {
    fn default() -> Self {
        Self {
            licenses: true,
            dst: default_licenses_dst(),
            pattern: default_license_pattern(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_toolchain_file() -> String {
    "conan_toolchain.cmake".to_owned()
}

fn default_presets_file() -> String {
    "CMakePresets.json".to_owned()
}

fn default_patch_token() -> String {
    "stdc++".to_owned()
}

pub fn default_data_patterns() -> Vec<String> {
    vec!["*-data.cmake".to_owned(), "*-*-*-data.cmake".to_owned()]
}

fn default_licenses_dst() -> String {
    "licenses".to_owned()
}

fn default_license_pattern() -> String {
    "license*".to_owned()
}

impl RecipeV1 {
    /// Structural checks that TOML parsing alone cannot express.
    pub fn validate(&self) -> Result<(), RecipeError> {
        if self.recipe_version != RECIPE_VERSION {
            return Err(RecipeError::UnsupportedVersion(self.recipe_version));
        }
        if self.package.name.trim().is_empty() {
            return Err(RecipeError::EmptyPackageName);
        }

        let mut unconditional = BTreeSet::new();
        for (idx, req) in self.requires.iter().enumerate() {
            check_when(&req.when, || format!("requires[{idx}] ({})", req.reference))?;
            if req.when.is_empty()
                && !req.force
                && !unconditional.insert(req.reference.name.clone())
            {
                return Err(RecipeError::DuplicateRequirement(
                    req.reference.name.to_string(),
                ));
            }
        }
        for (idx, req) in self.tool_requires.iter().enumerate() {
            check_when(&req.when, || format!("tool_requires[{idx}] ({})", req.reference))?;
        }
        for (idx, rule) in self.configure.iter().enumerate() {
            check_when(&rule.when, || format!("configure[{idx}]"))?;
            for key in rule.options.keys() {
                if split_option_key(key).is_none() {
                    return Err(RecipeError::InvalidOptionKey(key.clone()));
                }
            }
        }
        for (idx, cond) in self.toolchain.conditional.iter().enumerate() {
            check_when(&cond.when, || format!("toolchain.conditional[{idx}]"))?;
        }
        if self.generate.patch_system_libs.token.trim().is_empty() {
            return Err(RecipeError::EmptyPatchToken);
        }
        for rule in &self.generate.copy {
            check_when(&rule.when, || format!("generate.copy ({})", rule.dependency))?;
            if rule.pattern.trim().is_empty() {
                return Err(RecipeError::EmptyCopyPattern(rule.dependency.to_string()));
            }
        }
        Ok(())
    }
}

fn check_when(when: &When, context: impl FnOnce() -> String) -> Result<(), RecipeError> {
    when.validate().map_err(|source| RecipeError::Condition {
        context: context(),
        source,
    })
}

/// Split `"pkg:option"` into its parts. Both halves must be non-empty.
pub fn split_option_key(key: &str) -> Option<(&str, &str)> {
    let (pkg, opt) = key.split_once(':')?;
    let (pkg, opt) = (pkg.trim(), opt.trim());
    if pkg.is_empty() || opt.is_empty() || opt.contains(':') {
        return None;
    }
    Some((pkg, opt))
}

pub fn parse_recipe_str(input: &str) -> Result<RecipeV1, RecipeError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_recipe_file(path: impl AsRef<Path>) -> Result<RecipeV1, RecipeError> {
    let content = fs::read_to_string(path)?;
    parse_recipe_str(&content)
}
