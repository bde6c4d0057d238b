use crate::files::write_atomic;
use crate::CoreError;
use recipekit_schema::{BuildType, Compiler, OptionFlags, Os, Settings, ToolchainSection};
use serde_json::json;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A value for a CMake cache variable in the toolchain file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CMakeValue {
    Str(String),
    Bool(bool),
}

impl CMakeValue {
    fn render(&self, name: &str) -> String {
        match self {
            CMakeValue::Str(s) => format!("set({name} \"{}\")", escape(s)),
            CMakeValue::Bool(b) => format!(
                "set({name} {} CACHE BOOL \"\" FORCE)",
                if *b { "ON" } else { "OFF" }
            ),
        }
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Variables the toolchain file sets, in output order.
///
/// Fixed build variables come first, then the recipe's unconditional
/// variables (sorted by name), then each matching conditional block in
/// declaration order. A later assignment to a name already present
/// replaces its value in place.
pub fn toolchain_variables(
    section: &ToolchainSection,
    settings: &Settings,
    flags: OptionFlags,
) -> Vec<(String, CMakeValue)> {
    let mut vars: Vec<(String, CMakeValue)> = Vec::new();
    let mut set = |name: &str, value: CMakeValue| {
        if let Some(slot) = vars.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            vars.push((name.to_owned(), value));
        }
    };

    set(
        "CMAKE_BUILD_TYPE",
        CMakeValue::Str(settings.build_type.to_string()),
    );
    if settings.os != Os::Windows && flags.fpic {
        set("CMAKE_POSITION_INDEPENDENT_CODE", CMakeValue::Bool(true));
    }
    set("BUILD_SHARED_LIBS", CMakeValue::Bool(flags.shared));

    for (name, value) in &section.variables {
        set(name, CMakeValue::Str(value.clone()));
    }
    for block in &section.conditional {
        if !block.when.matches_with(settings, flags) {
            continue;
        }
        for (name, value) in &block.variables {
            set(name, CMakeValue::Str(value.clone()));
        }
    }
    vars
}

/// Write the toolchain file into `dir` and return its path.
pub fn generate_toolchain(
    dir: &Path,
    section: &ToolchainSection,
    settings: &Settings,
    flags: OptionFlags,
) -> Result<PathBuf, CoreError> {
    let mut out = String::new();
    let _ = writeln!(out, "# Generated by recipekit. Changes will be overwritten.");
    let _ = writeln!(out, "# Settings: {}", settings.preset_name());
    out.push('\n');
    for (name, value) in toolchain_variables(section, settings, flags) {
        out.push_str(&value.render(&name));
        out.push('\n');
    }

    let path = dir.join(&section.file);
    write_atomic(&path, out.as_bytes())?;
    info!("wrote toolchain {}", path.display());
    Ok(path)
}

fn cmake_generator(settings: &Settings) -> &'static str {
    match (settings.os, settings.compiler) {
        (_, Compiler::Msvc) => "Visual Studio 17 2022",
        (Os::Windows, _) => "MinGW Makefiles",
        _ => "Unix Makefiles",
    }
}

/// Write a minimal presets document pointing at `toolchain` when
/// `presets_path` does not exist yet.
///
/// Returns the path when a file was written, `None` when one was already
/// there.
pub fn write_base_presets(
    presets_path: &Path,
    toolchain: &Path,
    settings: &Settings,
) -> Result<Option<PathBuf>, CoreError> {
    if presets_path.exists() {
        debug!("keeping existing presets {}", presets_path.display());
        return Ok(None);
    }

    let name = format!("conan-{}", settings.build_type.as_str().to_lowercase());
    let binary_dir = match settings.build_type {
        BuildType::Debug => "build/Debug",
        BuildType::Release => "build/Release",
        BuildType::RelWithDebInfo => "build/RelWithDebInfo",
        BuildType::MinSizeRel => "build/MinSizeRel",
    };
    let doc = json!({
        "version": 3,
        "cmakeMinimumRequired": { "major": 3, "minor": 15, "patch": 0 },
        "configurePresets": [{
            "name": name,
            "displayName": format!("'{name}' config"),
            "generator": cmake_generator(settings),
            "binaryDir": binary_dir,
            "toolchainFile": toolchain.to_string_lossy(),
            "cacheVariables": { "CMAKE_BUILD_TYPE": settings.build_type.as_str() }
        }],
        "buildPresets": [{ "name": name, "configurePreset": name }],
        "testPresets": [{ "name": name, "configurePreset": name }]
    });

    let mut content = serde_json::to_string_pretty(&doc)?;
    content.push('\n');
    write_atomic(presets_path, content.as_bytes())?;
    info!("wrote base presets {}", presets_path.display());
    Ok(Some(presets_path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipekit_schema::{Arch, ConditionalVariables, Pattern, When};
    use std::collections::BTreeMap;

    fn linux() -> Settings {
        Settings {
            os: Os::Linux,
            arch: Arch::X86_64,
            compiler: Compiler::Gcc,
            compiler_version: "13".to_owned(),
            build_type: BuildType::Release,
        }
    }

    fn web() -> Settings {
        Settings {
            os: Os::Emscripten,
            arch: Arch::Wasm,
            compiler: Compiler::Emcc,
            compiler_version: "3.1".to_owned(),
            build_type: BuildType::Debug,
        }
    }

    fn web_section() -> ToolchainSection {
        ToolchainSection {
            variables: BTreeMap::from([("PLATFORM".to_owned(), "Desktop".to_owned())]),
            conditional: vec![ConditionalVariables {
                when: When {
                    os: Some(Pattern::One("Emscripten".to_owned())),
                    ..When::default()
                },
                variables: BTreeMap::from([
                    ("PLATFORM".to_owned(), "Web".to_owned()),
                    ("CMAKE_EXE_LINKER_FLAGS".to_owned(), "-s USE_GLFW=3".to_owned()),
                ]),
            }],
            ..ToolchainSection::default()
        }
    }

    fn names(vars: &[(String, CMakeValue)]) -> Vec<&str> {
        vars.iter().map(|(n, _)| n.as_str()).collect()
    }

    #[test]
    fn fixed_variables_come_first() {
        let vars = toolchain_variables(&ToolchainSection::default(), &linux(), OptionFlags::default());
        assert_eq!(
            names(&vars),
            ["CMAKE_BUILD_TYPE", "CMAKE_POSITION_INDEPENDENT_CODE", "BUILD_SHARED_LIBS"]
        );
        assert_eq!(vars[2].1, CMakeValue::Bool(false));
    }

    #[test]
    fn no_pic_on_windows() {
        let settings = Settings {
            os: Os::Windows,
            ..linux()
        };
        let vars = toolchain_variables(&ToolchainSection::default(), &settings, OptionFlags::default());
        assert!(!names(&vars).contains(&"CMAKE_POSITION_INDEPENDENT_CODE"));
    }

    #[test]
    fn conditional_block_overrides_in_place() {
        let vars = toolchain_variables(&web_section(), &web(), OptionFlags::default());
        let platform = vars.iter().position(|(n, _)| n == "PLATFORM").unwrap();
        assert_eq!(vars[platform].1, CMakeValue::Str("Web".to_owned()));
        assert_eq!(names(&vars).last(), Some(&"CMAKE_EXE_LINKER_FLAGS"));
        assert_eq!(names(&vars).iter().filter(|n| **n == "PLATFORM").count(), 1);
    }

    #[test]
    fn conditional_block_skipped_when_not_matching() {
        let vars = toolchain_variables(&web_section(), &linux(), OptionFlags::default());
        assert!(vars.contains(&("PLATFORM".to_owned(), CMakeValue::Str("Desktop".to_owned()))));
        assert!(!names(&vars).contains(&"CMAKE_EXE_LINKER_FLAGS"));
    }

    #[test]
    fn toolchain_file_is_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let section = ToolchainSection {
            variables: BTreeMap::from([("ODD".to_owned(), r#"a "b" c:\d"#.to_owned())]),
            ..ToolchainSection::default()
        };
        let path = generate_toolchain(dir.path(), &section, &linux(), OptionFlags::default()).unwrap();
        assert_eq!(path, dir.path().join("conan_toolchain.cmake"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains(r#"set(ODD "a \"b\" c:\\d")"#));
        assert!(text.contains("set(CMAKE_BUILD_TYPE \"Release\")"));
        assert!(text.contains("set(CMAKE_POSITION_INDEPENDENT_CODE ON CACHE BOOL \"\" FORCE)"));
        assert!(text.contains("set(BUILD_SHARED_LIBS OFF CACHE BOOL \"\" FORCE)"));
    }

    #[test]
    fn base_presets_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let presets = dir.path().join("CMakePresets.json");
        let toolchain = dir.path().join("build/conan_toolchain.cmake");

        let written = write_base_presets(&presets, &toolchain, &web()).unwrap();
        assert_eq!(written.as_deref(), Some(presets.as_path()));

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&presets).unwrap()).unwrap();
        assert_eq!(doc["configurePresets"][0]["name"], "conan-debug");
        assert_eq!(doc["configurePresets"][0]["generator"], "Unix Makefiles");
        assert_eq!(doc["buildPresets"][0]["configurePreset"], "conan-debug");
        assert_eq!(doc["testPresets"][0]["configurePreset"], "conan-debug");

        std::fs::write(&presets, "{}").unwrap();
        assert_eq!(write_base_presets(&presets, &toolchain, &web()).unwrap(), None);
        assert_eq!(std::fs::read_to_string(&presets).unwrap(), "{}");
    }

    #[test]
    fn generator_follows_platform() {
        let msvc = Settings {
            os: Os::Windows,
            compiler: Compiler::Msvc,
            ..linux()
        };
        let mingw = Settings {
            os: Os::Windows,
            ..linux()
        };
        assert_eq!(cmake_generator(&msvc), "Visual Studio 17 2022");
        assert_eq!(cmake_generator(&mingw), "MinGW Makefiles");
        assert_eq!(cmake_generator(&linux()), "Unix Makefiles");
    }
}
