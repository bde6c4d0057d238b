use super::EXIT_SUCCESS;
use clap::CommandFactory;
use clap_complete::Shell;
use std::path::Path;

const BIN_NAME: &str = "recipekit";

/// Print completions for `shell`, or write them into `out_dir`.
pub fn run<C: CommandFactory>(shell: Shell, out_dir: Option<&Path>) -> Result<u8, String> {
    let mut cmd = C::command();
    match out_dir {
        None => clap_complete::generate(shell, &mut cmd, BIN_NAME, &mut std::io::stdout()),
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("failed to create {}: {e}", dir.display()))?;
            let path = clap_complete::generate_to(shell, &mut cmd, BIN_NAME, dir)
                .map_err(|e| format!("failed to write completions: {e}"))?;
            eprintln!("completions written to {}", path.display());
        }
    }
    Ok(EXIT_SUCCESS)
}
