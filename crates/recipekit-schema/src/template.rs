use serde::Serialize;

/// A built-in recipe that `recipekit new` can start from.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub description: &'static str,
    pub recipe: &'static str,
}

pub const BUILTIN_TEMPLATES: &[Template] = &[
    Template {
        name: "minimal",
        description: "Empty recipe with default toolchain, presets and patching",
        recipe: r#"recipe_version = 1

[package]
name = "app"
version = "0.1.0"
"#,
    },
    Template {
        name: "sdl-imgui",
        description: "Desktop stack: fmt, nlohmann_json, imgui, glm and SDL2 with satellite libraries",
        recipe: r#"recipe_version = 1

[package]
name = "app"
version = "0.1.0"

[options]
shared = false
fpic = true

[[requires]]
ref = "fmt/11.0.2"

[[requires]]
ref = "nlohmann_json/3.11.3"

[[requires]]
ref = "imgui/1.91.5"

[[requires]]
ref = "glm/1.0.1"

[[requires]]
ref = "libffi/3.4.8"
override = true

[[requires]]
ref = "sdl/2.32.2"
override = true
when = { os = "!Emscripten" }

[[requires]]
ref = "sdl_image/2.8.2"
when = { os = "!Emscripten" }

[[requires]]
ref = "sdl_ttf/2.24.0"
when = { os = "!Emscripten" }

[[requires]]
ref = "sdl_mixer/2.8.0"
when = { os = "!Emscripten" }

[[requires]]
ref = "sdl_net/2.2.0"
when = { os = "!Emscripten" }

[[requires]]
ref = "glew/2.2.0"
when = { os = "Windows", compiler = "gcc" }

[[tool_requires]]
ref = "cmake/[>3.14]"

[[configure]]
when = { arch = "armv8" }
options = { "sdl:libunwind" = false, "sdl:alsa" = true, "sdl:pulse" = true }

[[configure]]
when = { os = "Windows", compiler = "gcc" }
options = { "freetype:with_png" = false, "freetype:with_brotli" = false, "freetype:with_zlib" = false, "freetype:with_bzip2" = false }

[[generate.copy]]
dependency = "imgui"
src = "res/bindings"
pattern = "*opengl3*"
dst = "src/bindings"

[[generate.copy]]
dependency = "imgui"
src = "res/bindings"
pattern = "*sdl2*"
dst = "src/bindings"
"#,
    },
    Template {
        name: "emscripten",
        description: "Web build: GLFW through Emscripten, random preset suffixes",
        recipe: r#"recipe_version = 1

[package]
name = "app"
version = "0.1.0"

[[requires]]
ref = "fmt/[~11.1]"

[[requires]]
ref = "nlohmann_json/[~3.12]"

[[toolchain.conditional]]
when = { os = "Emscripten" }
variables = { PLATFORM = "Web", CMAKE_EXE_LINKER_FLAGS = "-s USE_GLFW=3" }

[generate]
preset_naming = "random"
"#,
    },
];

pub fn get_template(name: &str) -> Option<&'static Template> {
    BUILTIN_TEMPLATES.iter().find(|t| t.name == name)
}

pub fn list_templates() -> &'static [Template] {
    BUILTIN_TEMPLATES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_templates_parse_and_validate() {
        for template in BUILTIN_TEMPLATES {
            let result = crate::parse_recipe_str(template.recipe)
                .map_err(|e| e.to_string())
                .and_then(|r| r.validate().map_err(|e| e.to_string()));
            assert!(
                result.is_ok(),
                "template '{}' is invalid: {:?}",
                template.name,
                result.err()
            );
        }
    }

    #[test]
    fn get_template_by_name() {
        assert!(get_template("sdl-imgui").is_some());
        assert!(get_template("nonexistent").is_none());
    }

    #[test]
    fn all_templates_have_unique_names() {
        let mut names: Vec<&str> = BUILTIN_TEMPLATES.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), BUILTIN_TEMPLATES.len());
    }
}
