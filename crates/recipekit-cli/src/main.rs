mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{Session, EXIT_FAILURE, EXIT_RECIPE_ERROR, EXIT_SETTINGS_ERROR};
use recipekit_schema::DEFAULT_RECIPE_FILE;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "recipekit",
    version,
    about = "Settings-aware CMake build recipes: requirements, toolchain, presets and generated-file patching"
)]
struct Cli {
    /// Path to the recipe TOML file.
    #[arg(long, default_value = DEFAULT_RECIPE_FILE, global = true)]
    recipe: PathBuf,

    /// Settings profile (default: $RECIPEKIT_HOME/profiles/default.toml if present).
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Override a setting, e.g. `-s os=Linux -s build_type=Debug`.
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE", global = true)]
    settings: Vec<String>,

    /// Install folder of a dependency package, e.g. `--dep imgui=/opt/imgui`.
    #[arg(long = "dep", value_name = "NAME=PATH", global = true)]
    deps: Vec<String>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a new recipe from a built-in template.
    New {
        /// Package name recorded in the recipe.
        name: String,
        /// Template to start from (minimal, sdl-imgui, emscripten).
        #[arg(long)]
        template: Option<String>,
        /// Overwrite an existing recipe without asking.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Show the requirements that apply to the current settings.
    Requirements,
    /// Show the resolved package option values.
    Configure,
    /// Write the toolchain, rename presets, patch data files and run copy rules.
    Generate {
        /// Project source folder.
        #[arg(long)]
        source: Option<PathBuf>,
        /// Generators folder (default: <source>/build/generators).
        #[arg(long)]
        generators: Option<PathBuf>,
    },
    /// Copy dependency license files into the source tree.
    Imports {
        /// Project source folder.
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Rename the presets in a CMakePresets.json file.
    RenamePresets {
        /// Presets file to rewrite in place.
        #[arg(default_value = "CMakePresets.json")]
        file: PathBuf,
        /// Append an architecture and random suffix instead of the settings name.
        #[arg(long, default_value_t = false)]
        random: bool,
    },
    /// Remove a library from SYSTEM_LIBS lists in generated *-data.cmake files.
    PatchSyslibs {
        /// Folder containing the generated files.
        dir: PathBuf,
        /// Library token to remove.
        #[arg(long, default_value = "stdc++")]
        token: String,
        /// File glob, repeatable (default: *-data.cmake and *-*-*-data.cmake).
        #[arg(long = "pattern")]
        patterns: Vec<String>,
    },
    /// Inspect settings profiles.
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
        /// Write into this directory instead of stdout.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum ProfileCommand {
    /// Print the settings every command would resolve to.
    Show,
}

fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("recipe error:")
        || msg.starts_with("failed to parse recipe")
        || msg.starts_with("failed to read recipe")
        || msg.starts_with("profile error:")
    {
        EXIT_RECIPE_ERROR
    } else if msg.starts_with("settings error:") {
        EXIT_SETTINGS_ERROR
    } else {
        EXIT_FAILURE
    }
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RECIPEKIT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let session = Session {
        recipe: &cli.recipe,
        profile: cli.profile.as_deref(),
        settings: &cli.settings,
        deps: &cli.deps,
    };
    let json_output = cli.json;

    let result = match &cli.command {
        Commands::New {
            name,
            template,
            force,
        } => commands::new::run(&cli.recipe, name, template.as_deref(), *force, json_output),
        Commands::Requirements => commands::requirements::run(&session, json_output),
        Commands::Configure => commands::configure::run(&session, json_output),
        Commands::Generate { source, generators } => commands::generate::run(
            &session,
            source.as_deref(),
            generators.as_deref(),
            json_output,
        ),
        Commands::Imports { source } => {
            commands::imports::run(&session, source.as_deref(), json_output)
        }
        Commands::RenamePresets { file, random } => {
            commands::rename_presets::run(&session, file, *random, json_output)
        }
        Commands::PatchSyslibs {
            dir,
            token,
            patterns,
        } => commands::patch_syslibs::run(dir, token, patterns, json_output),
        Commands::Profile {
            command: ProfileCommand::Show,
        } => commands::profile::show(&session, json_output),
        Commands::Completions { shell, out_dir } => {
            commands::completions::run::<Cli>(*shell, out_dir.as_deref())
        }
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}
