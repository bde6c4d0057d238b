pub mod completions;
pub mod configure;
pub mod generate;
pub mod imports;
pub mod man_pages;
pub mod new;
pub mod patch_syslibs;
pub mod profile;
pub mod rename_presets;
pub mod requirements;

use indicatif::{ProgressBar, ProgressStyle};
use recipekit_core::{DependencyFolders, Engine, Layout};
use recipekit_schema::{load_profile, Profile, ProfileError, Settings, SettingsOverrides};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_RECIPE_ERROR: u8 = 2;
pub const EXIT_SETTINGS_ERROR: u8 = 3;

/// Global inputs shared by every command that needs settings or a recipe.
#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    pub recipe: &'a Path,
    pub profile: Option<&'a Path>,
    pub settings: &'a [String],
    pub deps: &'a [String],
}

impl Session<'_> {
    pub fn load_profile(&self) -> Result<Profile, String> {
        if let Some(path) = self.profile {
            tracing::debug!("using profile {}", path.display());
        }
        load_profile(self.profile).map_err(|e| match e {
            ProfileError::Settings(e) => format!("settings error: {e}"),
            other => format!("profile error: {other}"),
        })
    }

    /// Host detection, then the profile, then `-s` overrides.
    pub fn resolve_settings(&self, profile: &Profile) -> Result<Settings, String> {
        let overrides = SettingsOverrides::from_pairs(self.settings)
            .map_err(|e| format!("settings error: {e}"))?;
        profile.resolve(overrides).map_err(|e| match e {
            ProfileError::Settings(e) => format!("settings error: {e}"),
            other => format!("profile error: {other}"),
        })
    }

    pub fn settings(&self) -> Result<Settings, String> {
        let profile = self.load_profile()?;
        self.resolve_settings(&profile)
    }

    pub fn engine(&self, layout: Layout) -> Result<Engine, String> {
        let profile = self.load_profile()?;
        let settings = self.resolve_settings(&profile)?;
        let deps = DependencyFolders::from_profile(&profile)
            .with_flags(self.deps)
            .map_err(|e| e.to_string())?;
        Engine::load(self.recipe, settings, deps, layout).map_err(|e| e.to_string())
    }
}

/// Layout rooted at `source` (default: the current directory).
pub fn layout(source: Option<&Path>, generators: Option<&Path>) -> Layout {
    let source = source.map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let layout = Layout::new(source);
    match generators {
        Some(dir) => layout.with_generators(dir),
        None => layout,
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_status(status: &str) -> String {
    use console::Style;
    match status {
        "renamed" | "patched" | "written" => Style::new().green().apply_to(status).to_string(),
        "skipped" | "unchanged" => Style::new().dim().apply_to(status).to_string(),
        "orphan" => Style::new().yellow().apply_to(status).to_string(),
        "failed" => Style::new().red().bold().apply_to(status).to_string(),
        other => other.to_owned(),
    }
}
