use super::{colorize_status, json_pretty, Session, EXIT_SUCCESS};
use recipekit_core::{rename_presets, PresetRenameOutcome, RenameRule};
use recipekit_schema::PresetNaming;
use std::path::Path;

pub fn run(session: &Session<'_>, file: &Path, random: bool, json: bool) -> Result<u8, String> {
    let settings = session.settings()?;

    let naming = if random {
        PresetNaming::Random
    } else {
        PresetNaming::Settings
    };
    let rule = RenameRule::new(naming, &settings);
    let outcome = rename_presets(file, &rule).map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&outcome)?);
        return Ok(EXIT_SUCCESS);
    }
    match outcome {
        PresetRenameOutcome::Skipped => {
            println!("{} {} does not exist", colorize_status("skipped"), file.display());
        }
        PresetRenameOutcome::Renamed(report) => {
            for entry in &report.mapping {
                println!("{} {} -> {}", colorize_status("renamed"), entry.old, entry.new);
            }
            for orphan in &report.orphans {
                println!(
                    "{} {} '{}' references unknown '{}'",
                    colorize_status("orphan"),
                    orphan.list,
                    orphan.name,
                    orphan.configure_preset
                );
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
