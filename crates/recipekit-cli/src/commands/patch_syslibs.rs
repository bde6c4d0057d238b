use super::{colorize_status, json_pretty, EXIT_SUCCESS};
use recipekit_core::patch_system_libs;
use recipekit_schema::recipe::default_data_patterns;
use std::path::Path;

pub fn run(dir: &Path, token: &str, patterns: &[String], json: bool) -> Result<u8, String> {
    if token.trim().is_empty() {
        return Err("--token must not be empty".to_owned());
    }
    if !dir.is_dir() {
        return Err(format!("{} is not a directory", dir.display()));
    }
    let patterns = if patterns.is_empty() {
        default_data_patterns()
    } else {
        patterns.to_vec()
    };

    let report = patch_system_libs(dir, &patterns, token).map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&report)?);
        return Ok(EXIT_SUCCESS);
    }
    for path in &report.patched {
        println!("{} {}", colorize_status("patched"), path.display());
    }
    for failure in &report.failed {
        println!(
            "{} {}: {}",
            colorize_status("failed"),
            failure.path.display(),
            failure.error
        );
    }
    println!(
        "{} file(s) scanned, {} patched",
        report.scanned,
        report.patched.len()
    );
    Ok(EXIT_SUCCESS)
}
