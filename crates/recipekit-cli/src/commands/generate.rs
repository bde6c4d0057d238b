use super::{colorize_status, json_pretty, layout, spin_fail, spin_ok, spinner, Session, EXIT_SUCCESS};
use recipekit_core::{GenerateReport, PresetRenameOutcome};
use std::path::Path;

pub fn run(
    session: &Session<'_>,
    source: Option<&Path>,
    generators: Option<&Path>,
    json: bool,
) -> Result<u8, String> {
    let engine = session.engine(layout(source, generators))?;

    let pb = if json {
        None
    } else {
        Some(spinner(&format!(
            "generating for {}...",
            engine.settings().preset_name()
        )))
    };
    let report = match engine.generate() {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "generate finished");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "generate failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(EXIT_SUCCESS)
}

fn print_report(report: &GenerateReport) {
    println!("toolchain: {}", report.toolchain.display());
    let base = if report.base_presets_written {
        colorize_status("written")
    } else {
        colorize_status("unchanged")
    };
    println!("presets:   {} ({base})", report.presets_file.display());

    match &report.presets {
        Some(PresetRenameOutcome::Renamed(rename)) => {
            for entry in &rename.mapping {
                println!("  {} {} -> {}", colorize_status("renamed"), entry.old, entry.new);
            }
            for orphan in &rename.orphans {
                println!(
                    "  {} {} '{}' -> '{}'",
                    colorize_status("orphan"),
                    orphan.list,
                    orphan.name,
                    orphan.configure_preset
                );
            }
        }
        Some(PresetRenameOutcome::Skipped) => println!("  {}", colorize_status("skipped")),
        None => println!("  {} (see warnings)", colorize_status("failed")),
    }

    if let Some(patch) = &report.system_libs {
        println!(
            "system libs: {} scanned, {} patched, {} failed",
            patch.scanned,
            patch.patched.len(),
            patch.failed.len()
        );
        for failure in &patch.failed {
            println!(
                "  {} {}: {}",
                colorize_status("failed"),
                failure.path.display(),
                failure.error
            );
        }
    }
    if !report.copied.is_empty() {
        println!("copied {} file(s)", report.copied.len());
    }
}
