use crate::CoreError;
use recipekit_schema::{PackageName, Profile};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Install folders of resolved dependency packages, keyed by package name.
///
/// The package manager that resolved the graph supplies these, either through
/// the profile's `[dependencies]` table or `--dep <name>=<path>` flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyFolders {
    folders: BTreeMap<PackageName, PathBuf>,
}

impl DependencyFolders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            folders: profile.dependencies.clone(),
        }
    }

    /// Parse a `<name>=<path>` flag. The name must be a valid package name.
    pub fn parse_flag(flag: &str) -> Result<(PackageName, PathBuf), CoreError> {
        let invalid = || CoreError::InvalidDependencyFlag(flag.to_owned());
        let (name, path) = flag.split_once('=').ok_or_else(invalid)?;
        let path = path.trim();
        if path.is_empty() {
            return Err(invalid());
        }
        let name = PackageName::parse(name.trim()).map_err(|_| invalid())?;
        Ok((name, PathBuf::from(path)))
    }

    /// Apply `--dep` flags on top of whatever the profile provided.
    pub fn with_flags<S: AsRef<str>>(mut self, flags: &[S]) -> Result<Self, CoreError> {
        for flag in flags {
            let (name, path) = Self::parse_flag(flag.as_ref())?;
            self.insert(name, path);
        }
        Ok(self)
    }

    pub fn insert(&mut self, name: PackageName, folder: PathBuf) {
        self.folders.insert(name, folder);
    }

    pub fn get(&self, name: &str) -> Result<&Path, CoreError> {
        self.folders
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| CoreError::MissingDependency(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.folders.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PackageName, &Path)> {
        self.folders.iter().map(|(k, v)| (k, v.as_path()))
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}
