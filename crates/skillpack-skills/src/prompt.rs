use std::fmt::Write;

use crate::frontmatter::SkillMetadata;
use crate::loader::ProgressiveLoader;
use crate::resource::ResourceKind;

const OS_NAMES: &[&str] = &["linux", "macos", "windows"];

// XML tag patterns (lowercase) that could break prompt structure if injected verbatim.
// Matching is case-insensitive; the replacement is always the canonical escaped form.
const SANITIZE_PATTERNS: &[(&str, &str)] = &[
    ("</skill>", "&lt;/skill&gt;"),
    ("<skill", "&lt;skill"),
    ("</instructions>", "&lt;/instructions&gt;"),
    ("<instructions", "&lt;instructions"),
    ("</reference>", "&lt;/reference&gt;"),
    ("<reference", "&lt;reference"),
    ("</available_skills>", "&lt;/available_skills&gt;"),
    ("<available_skills", "&lt;available_skills"),
];

/// Case-insensitive replacement of `pattern` (given in lowercase) with `replacement` in `src`.
fn replace_case_insensitive(src: &str, pattern: &str, replacement: &str) -> String {
    let lower = src.to_ascii_lowercase();
    let mut out = String::with_capacity(src.len());
    let mut skip_until = 0;
    for (pos, ch) in src.char_indices() {
        if pos < skip_until {
            continue;
        }
        if lower[pos..].starts_with(pattern) {
            out.push_str(replacement);
            skip_until = pos + pattern.len();
        } else {
            out.push(ch);
        }
    }
    out
}

/// Escape tags that would break the prompt structure when a body is emitted verbatim.
#[must_use]
pub fn sanitize_skill_body(body: &str) -> String {
    let mut out = body.to_string();
    for (pattern, replacement) in SANITIZE_PATTERNS {
        out = replace_case_insensitive(&out, pattern, replacement);
    }
    out
}

/// Escape a value placed inside a double-quoted attribute.
fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn should_include_reference(path: &str, os_family: &str) -> bool {
    let filename = path.rsplit('/').next().unwrap_or(path);
    let stem = filename.strip_suffix(".md").unwrap_or(filename);
    if OS_NAMES.contains(&stem) {
        stem == os_family
    } else {
        true
    }
}

/// Render the always-resident metadata tier.
#[must_use]
pub fn format_metadata_tier<'a>(metadata: impl IntoIterator<Item = &'a SkillMetadata>) -> String {
    let mut out = String::from("<available_skills>\n");
    let mut any = false;
    for meta in metadata {
        any = true;
        let _ = writeln!(
            out,
            "  <skill name=\"{}\" description=\"{}\" />",
            escape_attr(&meta.name),
            escape_attr(&meta.description),
        );
    }
    if !any {
        return String::new();
    }
    out.push_str("</available_skills>");
    out
}

/// Render every loaded body together with the resources pulled in for it.
///
/// References that are available but not loaded are listed by path so the model can
/// ask for them; OS-specific references (`linux.md`, `macos.md`, `windows.md`) are
/// only listed for `os_family`.
#[must_use]
pub fn format_loaded(loader: &ProgressiveLoader, os_family: &str) -> String {
    let mut out = String::new();

    for name in loader.loaded_bodies() {
        let Some(body) = loader.body(name) else {
            continue;
        };
        let _ = write!(
            out,
            "<skill name=\"{name}\">\n  <instructions>\n{}\n  </instructions>\n",
            sanitize_skill_body(body),
        );

        for (path, bytes) in loader.resources(name) {
            match std::str::from_utf8(bytes) {
                Ok(text) => {
                    let _ = writeln!(
                        out,
                        "  <reference path=\"{}\">\n{}\n  </reference>",
                        escape_attr(path),
                        sanitize_skill_body(text),
                    );
                }
                Err(_) => {
                    let _ = writeln!(
                        out,
                        "  <resource path=\"{}\" bytes=\"{}\" />",
                        escape_attr(path),
                        bytes.len()
                    );
                }
            }
        }

        if let Some(package) = loader.index().get(name) {
            let unloaded: Vec<&str> = package
                .resources_of_kind(ResourceKind::Reference)
                .filter(|path| should_include_reference(path, os_family))
                .filter(|path| loader.resource(name, path).is_none())
                .collect();
            if !unloaded.is_empty() {
                out.push_str("  <available_references>\n");
                for path in unloaded {
                    let _ = writeln!(out, "    {path}");
                }
                out.push_str("  </available_references>\n");
            }
        }

        out.push_str("</skill>\n");
    }

    out
}
