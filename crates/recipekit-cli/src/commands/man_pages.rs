use super::EXIT_SUCCESS;
use clap::{Command, CommandFactory};
use recipekit_core::write_atomic;
use std::path::{Path, PathBuf};

fn render(cmd: &Command, page: &str, dir: &Path, written: &mut Vec<PathBuf>) -> Result<(), String> {
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .render(&mut buf)
        .map_err(|e| format!("man page render failed: {e}"))?;
    let path = dir.join(format!("{page}.1"));
    write_atomic(&path, &buf).map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    written.push(path);

    // `profile show` becomes recipekit-profile-show.1
    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        let sub_page = format!("{page}-{}", sub.get_name());
        render(sub, &sub_page, dir, written)?;
    }
    Ok(())
}

pub fn run<C: CommandFactory>(dir: &Path) -> Result<u8, String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("failed to create dir: {e}"))?;
    let mut written = Vec::new();
    render(&C::command(), "recipekit", dir, &mut written)?;
    println!("{} man page(s) written to {}", written.len(), dir.display());
    Ok(EXIT_SUCCESS)
}
