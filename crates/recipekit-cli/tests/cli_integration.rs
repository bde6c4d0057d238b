//! CLI subprocess integration tests.
//!
//! These tests invoke the `recipekit` binary as a subprocess and verify
//! exit codes, stdout content, and JSON output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const LINUX: [&str; 10] = [
    "-s",
    "os=Linux",
    "-s",
    "arch=x86_64",
    "-s",
    "compiler=gcc",
    "-s",
    "compiler_version=13",
    "-s",
    "build_type=Release",
];

/// A binary isolated from the user's default profile.
fn recipekit_bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_recipekit"));
    cmd.env("RECIPEKIT_HOME", home);
    cmd.env_remove("RECIPEKIT_LOG");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_recipe(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("recipekit.toml");
    std::fs::write(&path, body).unwrap();
    path
}

const RECIPE: &str = r#"recipe_version = 1

[package]
name = "game"

[[requires]]
ref = "fmt/[~11.1]"

[[requires]]
ref = "sdl/2.30.9"
override = true
when = { os = "!Emscripten" }

[[tool_requires]]
ref = "cmake/[>3.14]"

[[configure]]
when = { arch = "armv8" }
options = { "sdl:alsa" = true }
"#;

#[test]
fn cli_version_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = recipekit_bin(home.path()).arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("recipekit"));
}

#[test]
fn cli_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    let output = recipekit_bin(home.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = stdout(&output);
    for cmd in ["generate", "rename-presets", "patch-syslibs", "requirements"] {
        assert!(text.contains(cmd), "help must list '{cmd}': {text}");
    }
}

#[test]
fn cli_new_writes_recipe_and_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = dir.path().join("recipekit.toml");

    let output = recipekit_bin(dir.path())
        .args(["new", "demo", "--template", "sdl-imgui", "--recipe"])
        .arg(&recipe)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    let text = std::fs::read_to_string(&recipe).unwrap();
    assert!(text.contains("name = \"demo\""));
    assert!(text.contains("imgui"));

    let output = recipekit_bin(dir.path())
        .args(["new", "demo", "--recipe"])
        .arg(&recipe)
        .stdin(std::process::Stdio::null())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--force"));

    let output = recipekit_bin(dir.path())
        .args(["new", "other", "--force", "--recipe"])
        .arg(&recipe)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(std::fs::read_to_string(&recipe)
        .unwrap()
        .contains("name = \"other\""));
}

#[test]
fn cli_requirements_json_follows_settings() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = write_recipe(dir.path(), RECIPE);

    let output = recipekit_bin(dir.path())
        .args(["requirements", "--json", "--recipe"])
        .arg(&recipe)
        .args(LINUX)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let refs: Vec<&str> = json["requires"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["reference"].as_str().unwrap())
        .collect();
    assert_eq!(refs, ["fmt/[~11.1]", "sdl/2.30.9"]);
    assert_eq!(json["requires"][1]["override"], true);
    assert_eq!(json["tool_requires"][0], "cmake/[>3.14]");

    let output = recipekit_bin(dir.path())
        .args(["requirements", "--json", "--recipe"])
        .arg(&recipe)
        .args(["-s", "os=Emscripten", "-s", "arch=wasm", "-s", "compiler=emcc"])
        .args(["-s", "compiler_version=3.1", "-s", "build_type=Release"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["requires"].as_array().unwrap().len(), 1);
}

#[test]
fn cli_configure_prints_options() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = write_recipe(dir.path(), RECIPE);
    let output = recipekit_bin(dir.path())
        .args(["configure", "--recipe"])
        .arg(&recipe)
        .args(LINUX)
        .args(["-s", "arch=armv8"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("*:shared = False"), "{text}");
    assert!(text.contains("sdl:alsa"), "{text}");
}

#[test]
fn cli_generate_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = write_recipe(dir.path(), RECIPE);
    let source = dir.path().join("project");
    let generators = source.join("build/generators");
    std::fs::create_dir_all(&generators).unwrap();
    std::fs::write(
        generators.join("sdl-release-x86_64-data.cmake"),
        "set(sdl_SYSTEM_LIBS_RELEASE m stdc++ dl)\n",
    )
    .unwrap();

    let output = recipekit_bin(dir.path())
        .args(["generate", "--json", "--recipe"])
        .arg(&recipe)
        .arg("--source")
        .arg(&source)
        .args(LINUX)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["base_presets_written"], true);
    assert_eq!(json["presets"]["status"], "renamed");
    assert_eq!(json["presets"]["mapping"][0]["new"], "release-linux-x86_64-gcc-13");
    assert_eq!(json["system_libs"]["patched"].as_array().unwrap().len(), 1);

    let data = std::fs::read_to_string(generators.join("sdl-release-x86_64-data.cmake")).unwrap();
    assert_eq!(data, "set(sdl_SYSTEM_LIBS_RELEASE m  dl)\n");
    assert!(generators.join("conan_toolchain.cmake").is_file());
}

#[test]
fn cli_rename_presets_standalone() {
    let dir = tempfile::tempdir().unwrap();
    let presets = dir.path().join("CMakePresets.json");
    std::fs::write(
        &presets,
        r#"{"configurePresets":[{"name":"conan-debug"}],"buildPresets":[{"name":"conan-debug","configurePreset":"conan-debug"},{"name":"lone","configurePreset":"gone"}]}"#,
    )
    .unwrap();

    let output = recipekit_bin(dir.path())
        .arg("rename-presets")
        .arg(&presets)
        .args(LINUX)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["orphans"][0]["name"], "lone");

    let text = std::fs::read_to_string(&presets).unwrap();
    assert!(text.starts_with("{\n    \"configurePresets\""), "{text}");
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["buildPresets"][0]["configurePreset"], "release-linux-x86_64-gcc-13");
    assert_eq!(doc["buildPresets"][1]["configurePreset"], "gone");
}

#[test]
fn cli_rename_presets_missing_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let output = recipekit_bin(dir.path())
        .arg("rename-presets")
        .arg(dir.path().join("absent.json"))
        .args(LINUX)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("does not exist"));
    assert!(!dir.path().join("absent.json").exists());
}

#[test]
fn cli_patch_syslibs_custom_token() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("gl-data.cmake");
    std::fs::write(&file, "set(gl_SYSTEM_LIBS GL GLU)\n").unwrap();

    let output = recipekit_bin(dir.path())
        .arg("patch-syslibs")
        .arg(dir.path())
        .args(["--token", "GLU", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["scanned"], 1);
    assert_eq!(
        std::fs::read_to_string(&file).unwrap(),
        "set(gl_SYSTEM_LIBS GL )\n"
    );
}

#[test]
fn cli_invalid_recipe_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = write_recipe(dir.path(), "recipe_version = 7\n[package]\nname = \"x\"\n");
    let output = recipekit_bin(dir.path())
        .args(["requirements", "--recipe"])
        .arg(&recipe)
        .args(LINUX)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", stderr(&output));
}

#[test]
fn cli_missing_recipe_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let output = recipekit_bin(dir.path())
        .args(["configure", "--recipe"])
        .arg(dir.path().join("nope.toml"))
        .args(LINUX)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", stderr(&output));
}

#[test]
fn cli_invalid_settings_exit_3() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = write_recipe(dir.path(), RECIPE);
    let output = recipekit_bin(dir.path())
        .args(["requirements", "--recipe"])
        .arg(&recipe)
        .args(LINUX)
        .args(["-s", "compiler=msvc"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", stderr(&output));
    assert!(stderr(&output).contains("settings error"));

    let output = recipekit_bin(dir.path())
        .args(["profile", "show", "-s", "os=Plan9"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", stderr(&output));
}

#[test]
fn cli_profile_show_reads_default_profile() {
    let home = tempfile::tempdir().unwrap();
    let profiles = home.path().join("profiles");
    std::fs::create_dir_all(&profiles).unwrap();
    std::fs::write(
        profiles.join("default.toml"),
        "[settings]\nos = \"Windows\"\narch = \"x86_64\"\ncompiler = \"gcc\"\ncompiler_version = \"13\"\nbuild_type = \"Debug\"\n",
    )
    .unwrap();

    let output = recipekit_bin(home.path())
        .args(["profile", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["preset_name"], "debug-windows-x86_64-gcc-13");
}

#[test]
fn cli_missing_dependency_folder_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = write_recipe(
        dir.path(),
        r#"recipe_version = 1

[package]
name = "app"

[[generate.copy]]
dependency = "imgui"
src = "res/bindings"
pattern = "*sdl2*"
dst = "src/bindings"
"#,
    );
    let output = recipekit_bin(dir.path())
        .args(["generate", "--recipe"])
        .arg(&recipe)
        .arg("--source")
        .arg(dir.path())
        .args(LINUX)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1), "{}", stderr(&output));
    assert!(stderr(&output).contains("--dep imgui=<path>"));
}

#[test]
fn cli_dep_with_invalid_package_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = write_recipe(dir.path(), RECIPE);
    let output = recipekit_bin(dir.path())
        .args(["generate", "--recipe"])
        .arg(&recipe)
        .arg("--source")
        .arg(dir.path())
        .args(["--dep", "bad name=/x"])
        .args(LINUX)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1), "{}", stderr(&output));
    assert!(stderr(&output).contains("invalid dependency folder 'bad name=/x'"));
}

#[test]
fn cli_completions_bash() {
    let home = tempfile::tempdir().unwrap();
    let output = recipekit_bin(home.path())
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("recipekit"));
}

#[test]
fn cli_man_pages_include_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("man");
    let output = recipekit_bin(dir.path())
        .arg("man-pages")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(out.join("recipekit.1").is_file());
    assert!(out.join("recipekit-generate.1").is_file());
    assert!(out.join("recipekit-profile-show.1").is_file());
}
