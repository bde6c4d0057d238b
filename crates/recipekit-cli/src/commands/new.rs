use super::{json_pretty, EXIT_SUCCESS};
use dialoguer::Confirm;
use recipekit_core::write_atomic;
use recipekit_schema::{get_template, list_templates, parse_recipe_str, RecipeV1};
use std::io::{stderr, stdin, IsTerminal};
use std::path::Path;

const DEFAULT_TEMPLATE: &str = "minimal";

fn template_names() -> String {
    list_templates()
        .iter()
        .map(|t| t.name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn load_template(name: &str) -> Result<RecipeV1, String> {
    let template = get_template(name)
        .ok_or_else(|| format!("unknown template '{name}' (expected: {})", template_names()))?;
    parse_recipe_str(template.recipe).map_err(|e| format!("template parse error: {e}"))
}

fn ensure_can_write(dest: &Path, force: bool, is_tty: bool) -> Result<(), String> {
    if !dest.exists() || force {
        return Ok(());
    }
    let refusal = || {
        format!(
            "refusing to overwrite existing {} (pass --force)",
            dest.display()
        )
    };
    if !is_tty {
        return Err(refusal());
    }
    let overwrite = Confirm::new()
        .with_prompt(format!("overwrite {}?", dest.display()))
        .default(false)
        .interact()
        .map_err(|e| format!("prompt failed: {e}"))?;
    if overwrite {
        Ok(())
    } else {
        Err(refusal())
    }
}

fn render(name: &str, template: &str) -> Result<String, String> {
    let mut recipe = load_template(template)?;
    recipe.package.name = name.to_owned();
    recipe
        .validate()
        .map_err(|e| format!("recipe error: {e}"))?;
    let body =
        toml::to_string_pretty(&recipe).map_err(|e| format!("TOML serialization failed: {e}"))?;
    Ok(format!("# recipekit recipe for {name} (template: {template})\n\n{body}"))
}

pub fn run(
    dest: &Path,
    name: &str,
    template: Option<&str>,
    force: bool,
    json: bool,
) -> Result<u8, String> {
    if name.trim().is_empty() {
        return Err("package name must not be empty".to_owned());
    }
    let template = template.unwrap_or(DEFAULT_TEMPLATE);
    let content = render(name, template)?;

    let is_tty = stdin().is_terminal() && stderr().is_terminal();
    ensure_can_write(dest, force, is_tty)?;
    write_atomic(dest, content.as_bytes())
        .map_err(|e| format!("failed to write {}: {e}", dest.display()))?;

    if json {
        let payload = serde_json::json!({
            "status": "written",
            "path": dest,
            "name": name,
            "template": template,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("wrote {} for '{name}'", dest.display());
        println!("template: {template}");
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipekit_schema::DEFAULT_RECIPE_FILE;

    #[test]
    fn every_template_renders_a_valid_recipe() {
        for template in list_templates() {
            let text = render("demo", template.name).unwrap();
            let recipe = parse_recipe_str(&text).unwrap();
            assert_eq!(recipe.package.name, "demo");
            recipe.validate().unwrap();
        }
    }

    #[test]
    fn unknown_template_lists_choices() {
        let err = render("demo", "nope").unwrap_err();
        assert!(err.contains("minimal"));
        assert!(err.contains("sdl-imgui"));
    }

    #[test]
    fn refuses_overwrite_without_tty() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join(DEFAULT_RECIPE_FILE);
        std::fs::write(&dest, "keep").unwrap();
        assert!(ensure_can_write(&dest, false, false).is_err());
        assert!(ensure_can_write(&dest, true, false).is_ok());
    }
}
