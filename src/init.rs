use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use dialoguer::Input;
use skillpack_skills::index::DEFAULT_ENTRY_DOCUMENT;
use skillpack_skills::validate::{validate_description, validate_name};

const RESOURCE_DIRS: [&str; 3] = ["references", "scripts", "assets"];

const PLACEHOLDER_DESCRIPTION: &str =
    "[TODO: what this skill does and when it should be used]";

/// Scaffold `<parent>/<name>`, prompting for a description when none is given.
pub fn run(name: &str, parent: &Path, description: Option<String>) -> anyhow::Result<PathBuf> {
    validate_name(name)?;

    let description = match description {
        Some(d) => d,
        None => Input::new()
            .with_prompt("Description")
            .default(PLACEHOLDER_DESCRIPTION.to_owned())
            .interact_text()?,
    };

    scaffold(name, parent, &description)
}

pub(crate) fn scaffold(name: &str, parent: &Path, description: &str) -> anyhow::Result<PathBuf> {
    validate_name(name)?;
    validate_description(description)?;

    let dir = parent.join(name);
    if dir.exists() {
        bail!("{} already exists", dir.display());
    }

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    std::fs::write(
        dir.join(DEFAULT_ENTRY_DOCUMENT),
        render_skill_md(name, description),
    )
    .context("failed to write entry document")?;
    for sub in RESOURCE_DIRS {
        std::fs::create_dir(dir.join(sub))
            .with_context(|| format!("failed to create {sub}/"))?;
    }

    Ok(dir)
}

pub(crate) fn render_skill_md(name: &str, description: &str) -> String {
    format!(
        "---\n\
         name: {name}\n\
         description: {}\n\
         ---\n\
         \n\
         # {}\n\
         \n\
         [TODO: one paragraph on what this skill helps with]\n\
         \n\
         ## Instructions\n\
         \n\
         [TODO: step-by-step guidance the agent should follow]\n\
         \n\
         ## Resources\n\
         \n\
         - `references/`: documentation loaded only when needed\n\
         - `scripts/`: helpers the agent can run\n\
         - `assets/`: templates and files used in output\n",
        yaml_quote(description),
        title_case(name),
    )
}

fn yaml_quote(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{escaped}\"")
}

fn title_case(name: &str) -> String {
    name.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
