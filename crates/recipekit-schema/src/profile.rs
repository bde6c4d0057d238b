use crate::settings::{Settings, SettingsError, SettingsOverrides};
use crate::types::PackageName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PROFILE_NAME: &str = "default.toml";
pub const HOME_ENV: &str = "RECIPEKIT_HOME";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse profile {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// A settings profile: the settings tuple to build for, plus where the
/// dependency packages are installed.
///
/// ```toml
/// [settings]
/// os = "Linux"
/// arch = "x86_64"
/// compiler = "gcc"
/// compiler_version = "13"
/// build_type = "Release"
///
/// [dependencies]
/// imgui = "/opt/pkgs/imgui/1.91.5"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    #[serde(default)]
    pub settings: SettingsOverrides,
    #[serde(default)]
    pub dependencies: BTreeMap<PackageName, PathBuf>,
}

impl Profile {
    /// Host detection, then this profile, then `overrides` on top.
    pub fn resolve(&self, overrides: SettingsOverrides) -> Result<Settings, ProfileError> {
        let merged = SettingsOverrides::detected()
            .merge(self.settings.clone())
            .merge(overrides);
        Ok(merged.resolve()?)
    }
}

pub fn parse_profile_str(input: &str, origin: &Path) -> Result<Profile, ProfileError> {
    toml::from_str(input).map_err(|source| ProfileError::Parse {
        path: origin.to_path_buf(),
        source,
    })
}

pub fn parse_profile_file(path: impl AsRef<Path>) -> Result<Profile, ProfileError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_profile_str(&content, path)
}

/// Location of the default profile: `$RECIPEKIT_HOME/profiles/default.toml`,
/// else `~/.config/recipekit/profiles/default.toml`.
pub fn default_profile_path() -> Option<PathBuf> {
    if let Ok(home) = std::env::var(HOME_ENV) {
        if !home.is_empty() {
            return Some(PathBuf::from(home).join("profiles").join(DEFAULT_PROFILE_NAME));
        }
    }
    let home = std::env::var("HOME").ok()?;
    Some(
        PathBuf::from(home)
            .join(".config/recipekit/profiles")
            .join(DEFAULT_PROFILE_NAME),
    )
}

/// Load the given profile, or the default one if it exists, or an empty
/// profile otherwise.
pub fn load_profile(explicit: Option<&Path>) -> Result<Profile, ProfileError> {
    if let Some(path) = explicit {
        return parse_profile_file(path);
    }
    match default_profile_path() {
        Some(path) if path.is_file() => parse_profile_file(&path),
        _ => Ok(Profile::default()),
    }
}
