use crate::types::PackageName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("invalid package reference '{0}', expected '<name>/<version>[@<user>/<channel>]'")]
    Malformed(String),
    #[error("invalid package name '{0}' (allowed: letters, digits, '_', '.', '+', '-')")]
    InvalidName(String),
}

/// A package reference such as `fmt/11.0.2`, `fmt/[~11.1]` or
/// `m4/1.4.20@local/stable`.
///
/// Version ranges are carried verbatim; resolution belongs to the package
/// manager that consumes the requirement list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageRef {
    pub name: PackageName,
    pub version: String,
    pub user_channel: Option<(String, String)>,
}

impl PackageRef {
    pub fn is_version_range(&self) -> bool {
        self.version.starts_with('[') && self.version.ends_with(']')
    }
}

impl FromStr for PackageRef {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let malformed = || ReferenceError::Malformed(s.to_owned());

        let (main, user_channel) = match raw.split_once('@') {
            Some((main, uc)) => {
                let (user, channel) = uc.split_once('/').ok_or_else(malformed)?;
                if user.is_empty() || channel.is_empty() || channel.contains('/') {
                    return Err(malformed());
                }
                (main, Some((user.to_owned(), channel.to_owned())))
            }
            None => (raw, None),
        };

        let (name, version) = main.split_once('/').ok_or_else(malformed)?;
        if version.is_empty() || version.contains('/') {
            return Err(malformed());
        }
        let name = PackageName::parse(name).map_err(|e| ReferenceError::InvalidName(e.0))?;

        Ok(PackageRef {
            name,
            version: version.to_owned(),
            user_channel,
        })
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)?;
        if let Some((user, channel)) = &self.user_channel {
            write!(f, "@{user}/{channel}")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for PackageRef {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PackageRef> for String {
    fn from(value: PackageRef) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_reference() {
        let r: PackageRef = "fmt/11.0.2".parse().unwrap();
        assert_eq!(r.name, "fmt");
        assert_eq!(r.version, "11.0.2");
        assert!(r.user_channel.is_none());
        assert!(!r.is_version_range());
    }

    #[test]
    fn parses_user_channel() {
        let r: PackageRef = "m4/1.4.20@local/stable".parse().unwrap();
        assert_eq!(
            r.user_channel,
            Some(("local".to_owned(), "stable".to_owned()))
        );
        assert_eq!(r.to_string(), "m4/1.4.20@local/stable");
    }

    #[test]
    fn keeps_version_range_verbatim() {
        let r: PackageRef = "nlohmann_json/[~3.12]".parse().unwrap();
        assert_eq!(r.version, "[~3.12]");
        assert!(r.is_version_range());
        assert_eq!(r.to_string(), "nlohmann_json/[~3.12]");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["fmt", "fmt/", "/1.0", "a/b/c", "m4/1.0@local", "m4/1.0@/stable"] {
            assert!(bad.parse::<PackageRef>().is_err(), "accepted '{bad}'");
        }
    }

    #[test]
    fn rejects_bad_name_characters() {
        assert_eq!(
            "sdl image/2.8.2".parse::<PackageRef>(),
            Err(ReferenceError::InvalidName("sdl image".to_owned()))
        );
    }

    #[test]
    fn deserializes_from_toml_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            r#ref: PackageRef,
        }
        let w: Wrapper = toml::from_str(r#"ref = "glm/1.0.1""#).unwrap();
        assert_eq!(w.r#ref.name, "glm");
    }
}
