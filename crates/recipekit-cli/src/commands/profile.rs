use super::{json_pretty, Session, EXIT_SUCCESS};
use recipekit_schema::default_profile_path;

pub fn show(session: &Session<'_>, json: bool) -> Result<u8, String> {
    let profile = session.load_profile()?;
    let settings = session.resolve_settings(&profile)?;

    let source = session
        .profile
        .map(|p| p.display().to_string())
        .or_else(|| {
            default_profile_path()
                .filter(|p| p.is_file())
                .map(|p| p.display().to_string())
        });

    if json {
        let payload = serde_json::json!({
            "profile": source,
            "settings": settings,
            "preset_name": settings.preset_name(),
            "dependencies": profile.dependencies,
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("profile:          {}", source.as_deref().unwrap_or("(none, host defaults)"));
    println!("os:               {}", settings.os);
    println!("arch:             {}", settings.arch);
    println!("compiler:         {}", settings.compiler);
    println!("compiler_version: {}", settings.compiler_version);
    println!("build_type:       {}", settings.build_type);
    println!("preset name:      {}", settings.preset_name());
    if !profile.dependencies.is_empty() {
        println!("dependencies:");
        for (name, path) in &profile.dependencies {
            println!("  {name} = {}", path.display());
        }
    }
    Ok(EXIT_SUCCESS)
}
