use super::{json_pretty, layout, Session, EXIT_SUCCESS};

pub fn run(session: &Session<'_>, json: bool) -> Result<u8, String> {
    let engine = session.engine(layout(None, None))?;
    let requires = engine.requirements().map_err(|e| e.to_string())?;
    let tool_requires = engine.tool_requirements().map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "settings": engine.settings(),
            "requires": requires,
            "tool_requires": tool_requires,
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("requirements for {}", engine.settings().preset_name());
    if requires.is_empty() {
        println!("  (none)");
    }
    for req in &requires {
        if req.force {
            println!("  {} (override)", req.reference);
        } else {
            println!("  {}", req.reference);
        }
    }
    if !tool_requires.is_empty() {
        println!("tool requirements:");
        for tool in &tool_requires {
            println!("  {tool}");
        }
    }
    Ok(EXIT_SUCCESS)
}
