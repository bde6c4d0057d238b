use super::{json_pretty, layout, Session, EXIT_SUCCESS};
use std::path::Path;

pub fn run(session: &Session<'_>, source: Option<&Path>, json: bool) -> Result<u8, String> {
    let engine = session.engine(layout(source, None))?;
    let report = engine.imports().map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&report)?);
    } else if report.packages.is_empty() {
        println!("no licenses imported");
    } else {
        for pkg in &report.packages {
            println!("{}: {} file(s)", pkg.package, pkg.files.len());
            for file in &pkg.files {
                println!("  {}", file.display());
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
