//! Build settings: the (os, arch, compiler, compiler version, build type) tuple
//! every recipe decision is keyed on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid value '{value}' for setting '{setting}' (expected one of: {expected})")]
    UnknownValue {
        setting: &'static str,
        value: String,
        expected: String,
    },
    #[error("unknown setting '{0}' (expected os, arch, compiler, compiler_version, build_type)")]
    UnknownSetting(String),
    #[error("invalid setting override '{0}', expected '<setting>=<value>'")]
    InvalidOverride(String),
    #[error("setting '{0}' is not defined (set it in the profile or with -s {0}=<value>)")]
    Missing(&'static str),
    #[error("invalid settings combination: {0}")]
    InvalidCombination(String),
    #[error("negated entry '{1}' is not allowed in a list for setting '{0}' (use a single \"!value\" pattern)")]
    NegatedListEntry(&'static str, String),
}

macro_rules! setting_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $setting:literal { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical spelling, as used in profiles and preset names.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = SettingsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| SettingsError::UnknownValue {
                        setting: $setting,
                        value: s.to_owned(),
                        expected: Self::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }

        impl TryFrom<String> for $name {
            type Error = SettingsError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_owned()
            }
        }
    };
}

setting_enum!(
    /// Target operating system.
    Os, "os" {
        Linux => "Linux",
        Windows => "Windows",
        Macos => "Macos",
        Emscripten => "Emscripten",
        Android => "Android",
        Ios => "iOS",
        FreeBsd => "FreeBSD",
    }
);

setting_enum!(
    /// Target CPU architecture.
    Arch, "arch" {
        X86 => "x86",
        X86_64 => "x86_64",
        Armv7 => "armv7",
        Armv8 => "armv8",
        Wasm => "wasm",
    }
);

setting_enum!(
    Compiler, "compiler" {
        Gcc => "gcc",
        Clang => "clang",
        AppleClang => "apple-clang",
        Msvc => "msvc",
        Emcc => "emcc",
    }
);

setting_enum!(
    /// CMake build configuration.
    BuildType, "build_type" {
        Debug => "Debug",
        Release => "Release",
        RelWithDebInfo => "RelWithDebInfo",
        MinSizeRel => "MinSizeRel",
    }
);

/// A complete, validated settings tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub os: Os,
    pub arch: Arch,
    pub compiler: Compiler,
    pub compiler_version: String,
    pub build_type: BuildType,
}

impl Settings {
    /// Reject combinations no toolchain can produce.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.compiler_version.trim().is_empty() {
            return Err(SettingsError::Missing("compiler_version"));
        }
        if self.compiler == Compiler::Msvc && self.os != Os::Windows {
            return Err(SettingsError::InvalidCombination(format!(
                "compiler msvc requires os Windows, got {}",
                self.os
            )));
        }
        if self.compiler == Compiler::AppleClang && !matches!(self.os, Os::Macos | Os::Ios) {
            return Err(SettingsError::InvalidCombination(format!(
                "compiler apple-clang requires os Macos or iOS, got {}",
                self.os
            )));
        }
        if self.os == Os::Emscripten && self.arch != Arch::Wasm {
            return Err(SettingsError::InvalidCombination(format!(
                "os Emscripten requires arch wasm, got {}",
                self.arch
            )));
        }
        if self.arch == Arch::Wasm && self.os != Os::Emscripten {
            return Err(SettingsError::InvalidCombination(format!(
                "arch wasm requires os Emscripten, got {}",
                self.os
            )));
        }
        Ok(())
    }

    /// Deterministic preset name: `<build_type>-<os>-<arch>-<compiler>-<version>`,
    /// with build type and os lowercased.
    pub fn preset_name(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.build_type.as_str().to_lowercase(),
            self.os.as_str().to_lowercase(),
            self.arch,
            self.compiler,
            self.compiler_version.trim()
        )
    }

    /// Look up a setting by its profile key.
    pub fn value(&self, key: &str) -> Option<&str> {
        match key {
            "os" => Some(self.os.as_str()),
            "arch" => Some(self.arch.as_str()),
            "compiler" => Some(self.compiler.as_str()),
            "compiler_version" | "compiler.version" => Some(self.compiler_version.trim()),
            "build_type" => Some(self.build_type.as_str()),
            _ => None,
        }
    }
}

/// Partially specified settings. Profiles deserialize into this, CLI `-s`
/// overrides parse into it, and layers are merged before producing [`Settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<Os>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<Arch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<Compiler>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_type: Option<BuildType>,
}

impl SettingsOverrides {
    /// Settings inferred from the host this process runs on.
    ///
    /// The compiler is left unset so [`resolve`](Self::resolve) can pick the
    /// default for whichever OS wins the merge. The compiler version is never
    /// guessed.
    pub fn detected() -> Self {
        let os = match std::env::consts::OS {
            "linux" => Some(Os::Linux),
            "windows" => Some(Os::Windows),
            "macos" => Some(Os::Macos),
            "freebsd" => Some(Os::FreeBsd),
            "android" => Some(Os::Android),
            "ios" => Some(Os::Ios),
            _ => None,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => Some(Arch::X86_64),
            "x86" => Some(Arch::X86),
            "aarch64" => Some(Arch::Armv8),
            "arm" => Some(Arch::Armv7),
            "wasm32" => Some(Arch::Wasm),
            _ => None,
        };
        Self {
            os,
            arch,
            compiler: None,
            compiler_version: None,
            build_type: Some(BuildType::Release),
        }
    }

    /// Parse `key=value` pairs as given on the command line.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Self, SettingsError> {
        let mut out = Self::default();
        for pair in pairs {
            let pair = pair.as_ref();
            let Some((key, value)) = pair.split_once('=') else {
                return Err(SettingsError::InvalidOverride(pair.to_owned()));
            };
            let value = value.trim();
            match key.trim() {
                "os" => out.os = Some(value.parse()?),
                "arch" => out.arch = Some(value.parse()?),
                "compiler" => out.compiler = Some(value.parse()?),
                "compiler_version" | "compiler.version" => {
                    out.compiler_version = Some(value.to_owned());
                }
                "build_type" => out.build_type = Some(value.parse()?),
                other => return Err(SettingsError::UnknownSetting(other.to_owned())),
            }
        }
        Ok(out)
    }

    /// Layer `top` over `self`; fields set in `top` win.
    #[must_use]
    pub fn merge(self, top: Self) -> Self {
        Self {
            os: top.os.or(self.os),
            arch: top.arch.or(self.arch),
            compiler: top.compiler.or(self.compiler),
            compiler_version: top.compiler_version.or(self.compiler_version),
            build_type: top.build_type.or(self.build_type),
        }
    }

    /// Produce complete settings, failing on the first missing field or
    /// invalid combination. An unset compiler defaults from the resolved OS.
    pub fn resolve(self) -> Result<Settings, SettingsError> {
        let os = self.os.ok_or(SettingsError::Missing("os"))?;
        let settings = Settings {
            os,
            arch: self.arch.ok_or(SettingsError::Missing("arch"))?,
            compiler: self.compiler.unwrap_or_else(|| default_compiler(os)),
            compiler_version: self
                .compiler_version
                .ok_or(SettingsError::Missing("compiler_version"))?,
            build_type: self.build_type.ok_or(SettingsError::Missing("build_type"))?,
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn default_compiler(os: Os) -> Compiler {
    match os {
        Os::Windows => Compiler::Msvc,
        Os::Macos | Os::Ios => Compiler::AppleClang,
        Os::FreeBsd | Os::Android => Compiler::Clang,
        Os::Emscripten => Compiler::Emcc,
        Os::Linux => Compiler::Gcc,
    }
}
