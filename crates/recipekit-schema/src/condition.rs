use crate::settings::{Arch, BuildType, Compiler, Os, Settings, SettingsError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Match against a single setting value.
///
/// `"Linux"` requires equality, `"!Windows"` requires inequality, and a list
/// matches when any entry does. Lists may not hold negated entries; see
/// [`When::validate`]. Comparison ignores ASCII case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pattern {
    One(String),
    AnyOf(Vec<String>),
}

impl Pattern {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::One(p) => matches_one(p, value),
            Pattern::AnyOf(ps) => ps.iter().any(|p| matches_one(p, value)),
        }
    }

    fn entries(&self) -> Vec<&str> {
        match self {
            Pattern::One(p) => vec![p.as_str()],
            Pattern::AnyOf(ps) => ps.iter().map(String::as_str).collect(),
        }
    }
}

fn matches_one(pattern: &str, value: &str) -> bool {
    let pattern = pattern.trim();
    match pattern.strip_prefix('!') {
        Some(negated) => !negated.trim().eq_ignore_ascii_case(value),
        None => pattern.eq_ignore_ascii_case(value),
    }
}

/// Recipe-level option flags that conditions may also test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionFlags {
    #[serde(default)]
    pub shared: bool,
    #[serde(default = "default_true")]
    pub fpic: bool,
}

impl Default for OptionFlags {
    fn default() -> Self {
        Self {
            shared: false,
            fpic: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Platform predicate attached to requirements, option rules, toolchain
/// variables and copy rules. Absent fields always match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct When {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler_version: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_type: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fpic: Option<bool>,
}

impl When {
    /// Evaluate the settings predicates only.
    pub fn matches(&self, settings: &Settings) -> bool {
        let fields = [
            (&self.os, settings.os.as_str()),
            (&self.arch, settings.arch.as_str()),
            (&self.compiler, settings.compiler.as_str()),
            (&self.compiler_version, settings.compiler_version.trim()),
            (&self.build_type, settings.build_type.as_str()),
        ];
        fields
            .iter()
            .all(|(pattern, value)| pattern.as_ref().is_none_or(|p| p.matches(value)))
    }

    /// Evaluate settings predicates and option flags together.
    pub fn matches_with(&self, settings: &Settings, flags: OptionFlags) -> bool {
        self.matches(settings)
            && self.shared.is_none_or(|s| s == flags.shared)
            && self.fpic.is_none_or(|f| f == flags.fpic)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reject patterns naming values that no setting can take, so typos
    /// like `os = "Linx"` fail loudly instead of never matching.
    ///
    /// Negated entries inside a list are rejected too: any-of over
    /// `["!Windows", "!Macos"]` would match every value.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let fields = [
            ("os", &self.os),
            ("arch", &self.arch),
            ("compiler", &self.compiler),
            ("compiler_version", &self.compiler_version),
            ("build_type", &self.build_type),
        ];
        for (setting, pattern) in fields {
            if let Some(Pattern::AnyOf(entries)) = pattern {
                if let Some(negated) = entries.iter().find(|e| e.trim().starts_with('!')) {
                    return Err(SettingsError::NegatedListEntry(setting, negated.clone()));
                }
            }
        }
        check_values::<Os>(self.os.as_ref())?;
        check_values::<Arch>(self.arch.as_ref())?;
        check_values::<Compiler>(self.compiler.as_ref())?;
        check_values::<BuildType>(self.build_type.as_ref())?;
        Ok(())
    }
}

fn check_values<T>(pattern: Option<&Pattern>) -> Result<(), SettingsError>
where
    T: FromStr<Err = SettingsError>,
{
    let Some(pattern) = pattern else {
        return Ok(());
    };
    for entry in pattern.entries() {
        let value = entry.trim();
        value.strip_prefix('!').unwrap_or(value).parse::<T>()?;
    }
    Ok(())
}
