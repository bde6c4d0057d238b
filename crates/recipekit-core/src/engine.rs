use crate::concurrency::{GeneratorLock, LOCK_FILE};
use crate::deps::DependencyFolders;
use crate::files::{copy_matching, CopyMode};
use crate::presets::{rename_presets, PresetRenameOutcome, RenameRule};
use crate::syslibs::{patch_system_libs, PatchReport};
use crate::toolchain::{generate_toolchain, write_base_presets};
use crate::CoreError;
use recipekit_schema::{
    parse_recipe_file, OptionValue, Os, PackageName, PackageRef, RecipeV1, Settings,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Folders the lifecycle hooks read from and write into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Project root. Presets, copied bindings and licenses land here.
    pub source: PathBuf,
    /// Where the toolchain file is written and `*-data.cmake` files are
    /// patched.
    pub generators: PathBuf,
}

impl Layout {
    /// `source` with generators under `<source>/build/generators`.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let generators = source.join("build").join("generators");
        Self { source, generators }
    }

    pub fn with_generators(mut self, generators: impl Into<PathBuf>) -> Self {
        self.generators = generators.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRequirement {
    pub reference: PackageRef,
    #[serde(rename = "override")]
    pub force: bool,
}

/// Resolved package options, keyed by `"<package>:<option>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OptionValues(BTreeMap<String, OptionValue>);

impl OptionValues {
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: OptionValue) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateReport {
    pub toolchain: PathBuf,
    pub presets_file: PathBuf,
    pub base_presets_written: bool,
    /// `None` when renaming failed; the failure is logged.
    pub presets: Option<PresetRenameOutcome>,
    /// `None` when patching is disabled in the recipe.
    pub system_libs: Option<PatchReport>,
    pub copied: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedPackage {
    pub package: PackageName,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub packages: Vec<ImportedPackage>,
}

impl ImportReport {
    pub fn file_count(&self) -> usize {
        self.packages.iter().map(|p| p.files.len()).sum()
    }
}

/// Runs the recipe lifecycle hooks for one settings tuple.
pub struct Engine {
    recipe: RecipeV1,
    settings: Settings,
    deps: DependencyFolders,
    layout: Layout,
}

impl Engine {
    pub fn new(
        recipe: RecipeV1,
        settings: Settings,
        deps: DependencyFolders,
        layout: Layout,
    ) -> Self {
        Self {
            recipe,
            settings,
            deps,
            layout,
        }
    }

    /// Parse the recipe at `recipe_path` and build a validated engine.
    pub fn load(
        recipe_path: &Path,
        settings: Settings,
        deps: DependencyFolders,
        layout: Layout,
    ) -> Result<Self, CoreError> {
        debug!("loading recipe {}", recipe_path.display());
        let recipe = parse_recipe_file(recipe_path)?;
        let engine = Self::new(recipe, settings, deps, layout);
        engine.validate()?;
        Ok(engine)
    }

    pub fn recipe(&self) -> &RecipeV1 {
        &self.recipe
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.settings.validate()?;
        self.recipe.validate()?;
        Ok(())
    }

    /// Requirements whose condition matches the current settings, in recipe
    /// order. A later entry for a package already listed replaces it.
    pub fn requirements(&self) -> Result<Vec<ResolvedRequirement>, CoreError> {
        self.validate()?;
        let flags = self.recipe.options;
        let mut out: Vec<ResolvedRequirement> = Vec::new();
        for req in &self.recipe.requires {
            if !req.when.matches_with(&self.settings, flags) {
                debug!("skipping requirement {} for {}", req.reference, self.settings.preset_name());
                continue;
            }
            let resolved = ResolvedRequirement {
                reference: req.reference.clone(),
                force: req.force,
            };
            match out
                .iter_mut()
                .find(|r| r.reference.name == req.reference.name)
            {
                Some(slot) => *slot = resolved,
                None => out.push(resolved),
            }
        }
        info!("{} requirement(s) for {}", out.len(), self.settings.preset_name());
        Ok(out)
    }

    pub fn tool_requirements(&self) -> Result<Vec<PackageRef>, CoreError> {
        self.validate()?;
        let flags = self.recipe.options;
        Ok(self
            .recipe
            .tool_requires
            .iter()
            .filter(|r| r.when.matches_with(&self.settings, flags))
            .map(|r| r.reference.clone())
            .collect())
    }

    /// Option values: recipe-wide `shared`/`fPIC` defaults, then matching
    /// `[[configure]]` rules in declaration order.
    pub fn configure(&self) -> Result<OptionValues, CoreError> {
        self.validate()?;
        let flags = self.recipe.options;
        let mut values = OptionValues::default();

        values.set("*:shared", OptionValue::Bool(flags.shared));
        if self.settings.os != Os::Windows && flags.fpic {
            values.set("*:fPIC", OptionValue::Bool(true));
        }

        for rule in &self.recipe.configure {
            if !rule.when.matches_with(&self.settings, flags) {
                continue;
            }
            for (key, value) in &rule.options {
                values.set(key.clone(), value.clone());
            }
        }
        debug!("resolved {} option value(s)", values.len());
        Ok(values)
    }

    /// Write the toolchain and base presets, rename presets, patch the
    /// generated data files and run the copy rules.
    pub fn generate(&self) -> Result<GenerateReport, CoreError> {
        self.validate()?;
        let generators = &self.layout.generators;
        std::fs::create_dir_all(generators)?;
        let _lock = GeneratorLock::acquire(&generators.join(LOCK_FILE))?;
        info!(
            "generating for {} into {}",
            self.settings.preset_name(),
            generators.display()
        );

        let flags = self.recipe.options;
        let section = &self.recipe.generate;

        let toolchain =
            generate_toolchain(generators, &self.recipe.toolchain, &self.settings, flags)?;

        let presets_file = self.layout.source.join(&section.presets);
        let base_presets_written =
            write_base_presets(&presets_file, &toolchain, &self.settings)?.is_some();

        let rule = RenameRule::new(section.preset_naming, &self.settings);
        let presets = match rename_presets(&presets_file, &rule) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!("preset rename failed: {e}");
                None
            }
        };

        let system_libs = if section.patch_system_libs.enabled {
            Some(patch_system_libs(
                generators,
                &section.patch_system_libs.patterns,
                &section.patch_system_libs.token,
            )?)
        } else {
            debug!("system library patching disabled");
            None
        };

        let mut copied = Vec::new();
        for rule in &section.copy {
            if !rule.when.matches_with(&self.settings, flags) {
                continue;
            }
            let folder = self.deps.get(rule.dependency.as_str())?;
            let src = folder.join(&rule.src);
            let dst = self.layout.source.join(&rule.dst);
            let files = copy_matching(&src, &rule.pattern, &dst, CopyMode::default())?;
            if files.is_empty() {
                warn!(
                    "copy rule for {} matched nothing in {}",
                    rule.dependency,
                    src.display()
                );
            }
            copied.extend(files);
        }

        Ok(GenerateReport {
            toolchain,
            presets_file,
            base_presets_written,
            presets,
            system_libs,
            copied,
        })
    }

    /// Copy license files of every required package into
    /// `<source>/<imports.dst>/<package>/`.
    pub fn imports(&self) -> Result<ImportReport, CoreError> {
        self.validate()?;
        let mut report = ImportReport::default();
        let section = &self.recipe.imports;
        if !section.licenses {
            debug!("license import disabled");
            return Ok(report);
        }

        let mode = CopyMode {
            keep_path: true,
            ignore_case: true,
        };
        for req in self.requirements()? {
            let name = req.reference.name;
            let Ok(folder) = self.deps.get(name.as_str()) else {
                warn!("no install folder for {name}, skipping its licenses");
                continue;
            };
            let dst = self.layout.source.join(&section.dst).join(name.as_str());
            let files = copy_matching(folder, &section.pattern, &dst, mode)?;
            debug!("imported {} file(s) from {name}", files.len());
            report.packages.push(ImportedPackage {
                package: name,
                files,
            });
        }
        info!("imported {} license file(s)", report.file_count());
        Ok(report)
    }
}
