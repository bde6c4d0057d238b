//! Renaming of CMake presets so that several generated configurations can
//! coexist in one source tree without name clashes.
//!
//! Configure presets get a new name; build and test presets that point at a
//! renamed configure preset follow it, so the three lists stay consistent.

use crate::files::write_atomic;
use crate::CoreError;
use recipekit_schema::{PresetName, PresetNaming, Settings};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

const CONFIGURE_PRESETS: &str = "configurePresets";
const DEPENDENT_LISTS: [&str; 2] = ["buildPresets", "testPresets"];

/// How new configure preset names are derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameRule {
    /// Every configure preset is named after the settings tuple.
    Fixed(String),
    /// Every configure preset keeps its name with this suffix appended.
    Suffixed(String),
}

impl RenameRule {
    pub fn new(naming: PresetNaming, settings: &Settings) -> Self {
        match naming {
            PresetNaming::Settings => RenameRule::Fixed(settings.preset_name()),
            PresetNaming::Random => {
                let id = uuid::Uuid::new_v4().simple().to_string();
                RenameRule::Suffixed(format!("{}-{}", settings.arch, &id[..8]))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedPreset {
    pub old: PresetName,
    pub new: PresetName,
}

/// A build or test preset whose `configurePreset` names no known configure
/// preset. It is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Orphan {
    pub list: &'static str,
    pub name: String,
    pub configure_preset: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    pub mapping: Vec<RenamedPreset>,
    pub orphans: Vec<Orphan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PresetRenameOutcome {
    /// The presets file does not exist; nothing was written.
    Skipped,
    Renamed(RenameReport),
}

/// Rename the presets in the JSON file at `path` in place.
///
/// An absent file is not an error. Unknown fields and key order survive the
/// rewrite; output is indented with four spaces.
pub fn rename_presets(path: &Path, rule: &RenameRule) -> Result<PresetRenameOutcome, CoreError> {
    if !path.exists() {
        debug!("no presets file at {}, skipping rename", path.display());
        return Ok(PresetRenameOutcome::Skipped);
    }

    let presets_error = |message: String| CoreError::Presets {
        path: path.to_path_buf(),
        message,
    };

    let content = std::fs::read_to_string(path).map_err(|e| presets_error(e.to_string()))?;
    let mut doc: Value = serde_json::from_str(&content).map_err(|e| presets_error(e.to_string()))?;

    let report = rename_preset_document(&mut doc, rule).map_err(presets_error)?;

    let mut out = Vec::with_capacity(content.len() + 64);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    doc.serialize(&mut ser)?;
    out.push(b'\n');
    write_atomic(path, &out).map_err(|e| presets_error(e.to_string()))?;

    info!(
        "renamed {} configure preset(s) in {}",
        report.mapping.len(),
        path.display()
    );
    Ok(PresetRenameOutcome::Renamed(report))
}

/// Apply `rule` to an in-memory presets document.
///
/// Errors are structural: the document or one of its lists has the wrong
/// shape, or a configure preset has no name.
pub fn rename_preset_document(doc: &mut Value, rule: &RenameRule) -> Result<RenameReport, String> {
    let root = doc
        .as_object_mut()
        .ok_or_else(|| "presets document is not a JSON object".to_owned())?;

    let mut report = RenameReport::default();
    let mut lookup: HashMap<String, String> = HashMap::new();

    if let Some(list) = preset_list(root, CONFIGURE_PRESETS)? {
        let mut used = HashSet::new();
        for (idx, preset) in list.iter_mut().enumerate() {
            let record = preset
                .as_object_mut()
                .ok_or_else(|| format!("{CONFIGURE_PRESETS}[{idx}] is not an object"))?;
            let old = record
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| format!("{CONFIGURE_PRESETS}[{idx}] has no name"))?
                .to_owned();

            let (candidate, display) = match rule {
                RenameRule::Fixed(base) => (base.clone(), None),
                RenameRule::Suffixed(suffix) => {
                    let shown = record
                        .get("displayName")
                        .and_then(Value::as_str)
                        .unwrap_or(&old);
                    (format!("{old}-{suffix}"), Some(format!("{shown} ({suffix})")))
                }
            };
            let new = claim_unique(candidate, &mut used);

            record.insert("name".to_owned(), Value::String(new.clone()));
            record.insert(
                "displayName".to_owned(),
                Value::String(display.unwrap_or_else(|| new.clone())),
            );
            debug!("configure preset '{old}' -> '{new}'");
            lookup.insert(old.clone(), new.clone());
            report.mapping.push(RenamedPreset {
                old: PresetName::new(old),
                new: PresetName::new(new),
            });
        }
        for preset in list.iter_mut() {
            if let Some(record) = preset.as_object_mut() {
                remap_inherits(record, &lookup);
            }
        }
    }

    for list_name in DEPENDENT_LISTS {
        let Some(list) = preset_list(root, list_name)? else {
            continue;
        };

        // Records that keep their name reserve it first, so renamed records
        // never collide with them.
        let mut used = HashSet::new();
        let mut targets = Vec::with_capacity(list.len());
        for (idx, preset) in list.iter().enumerate() {
            let record = preset
                .as_object()
                .ok_or_else(|| format!("{list_name}[{idx}] is not an object"))?;
            let reference = record.get("configurePreset").and_then(Value::as_str);
            let target = reference.and_then(|r| lookup.get(r)).cloned();
            if target.is_none() {
                if let Some(name) = record.get("name").and_then(Value::as_str) {
                    used.insert(name.to_owned());
                }
                if let Some(reference) = reference {
                    let name = record
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned();
                    warn!(
                        "{list_name} entry '{name}' references unknown configure preset '{reference}', leaving it unchanged"
                    );
                    report.orphans.push(Orphan {
                        list: list_name,
                        name,
                        configure_preset: reference.to_owned(),
                    });
                }
            }
            targets.push(target);
        }

        let mut renamed: HashMap<String, String> = HashMap::new();
        for (preset, target) in list.iter_mut().zip(targets) {
            let Some(target) = target else {
                continue;
            };
            let Some(record) = preset.as_object_mut() else {
                continue;
            };
            let name = claim_unique(target.clone(), &mut used);
            if let Some(old) = record.get("name").and_then(Value::as_str) {
                renamed.insert(old.to_owned(), name.clone());
            }
            record.insert("name".to_owned(), Value::String(name));
            record.insert("configurePreset".to_owned(), Value::String(target));
        }
        for preset in list.iter_mut() {
            if let Some(record) = preset.as_object_mut() {
                remap_inherits(record, &renamed);
            }
        }
    }

    Ok(report)
}

/// Point `inherits` (a name or a list of names) at the renamed presets.
fn remap_inherits(record: &mut Map<String, Value>, renamed: &HashMap<String, String>) {
    let remap = |value: &mut Value| {
        if let Some(new) = value.as_str().and_then(|old| renamed.get(old)) {
            *value = Value::String(new.clone());
        }
    };
    match record.get_mut("inherits") {
        Some(Value::Array(parents)) => parents.iter_mut().for_each(remap),
        Some(parent) => remap(parent),
        None => {}
    }
}

fn preset_list<'a>(
    root: &'a mut Map<String, Value>,
    key: &str,
) -> Result<Option<&'a mut Vec<Value>>, String> {
    match root.get_mut(key) {
        None => Ok(None),
        Some(value) => value
            .as_array_mut()
            .map(Some)
            .ok_or_else(|| format!("{key} is not a list")),
    }
}

/// Return `candidate`, or `candidate-2`, `candidate-3`, ... whichever is
/// still free, and mark it used.
fn claim_unique(candidate: String, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let mut n = 2;
    loop {
        let next = format!("{candidate}-{n}");
        if used.insert(next.clone()) {
            return next;
        }
        n += 1;
    }
}
