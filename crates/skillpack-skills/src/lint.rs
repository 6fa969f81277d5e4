//! Authoring checks for a single skill directory.
//!
//! Hard failures (unreadable entry document, bad metadata, invalid name or
//! description) come back as errors. Everything else is a [`LintWarning`]: the skill
//! would still be indexed, but an author probably wants to fix it.

use std::fmt;
use std::path::Path;

use crate::error::SkillError;
use crate::frontmatter::parse_front_matter;
use crate::package::read_entry;
use crate::validate::validate_metadata;

const ALLOWED_KEYS: &[&str] = &["name", "description", "license", "allowed-tools", "metadata"];

const PLACEHOLDER: &str = "[TODO";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintWarning {
    UnexpectedKey(String),
    HyphenPlacement,
    DirectoryMismatch { name: String, directory: String },
    EmptyBody,
    Placeholder { line: usize },
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedKey(key) => write!(
                f,
                "unexpected front matter key `{key}` (allowed: {})",
                ALLOWED_KEYS.join(", ")
            ),
            Self::HyphenPlacement => {
                f.write_str("name should not start or end with `-` or contain `--`")
            }
            Self::DirectoryMismatch { name, directory } => {
                write!(f, "name `{name}` differs from directory `{directory}`")
            }
            Self::EmptyBody => f.write_str("instructions body is empty"),
            Self::Placeholder { line } => write!(f, "line {line}: unresolved `[TODO` placeholder"),
        }
    }
}

/// Check one skill directory the way an author would before publishing it.
///
/// # Errors
///
/// Returns an error if the entry document cannot be read or exceeds
/// `max_body_bytes`, its metadata block is malformed, or the name or description
/// fails validation.
pub fn lint_skill_dir(
    dir: &Path,
    entry_document: &str,
    max_body_bytes: u64,
) -> Result<Vec<LintWarning>, SkillError> {
    let text = read_entry(&dir.join(entry_document), max_body_bytes)?;
    let front = parse_front_matter(&text)?;
    let metadata = validate_metadata(front.metadata)?;

    let mut warnings: Vec<LintWarning> = front
        .keys
        .into_iter()
        .filter(|key| !ALLOWED_KEYS.contains(&key.as_str()))
        .map(LintWarning::UnexpectedKey)
        .collect();

    let name = metadata.name.as_str();
    if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
        warnings.push(LintWarning::HyphenPlacement);
    }

    if let Some(directory) = dir.file_name().and_then(|n| n.to_str())
        && directory != name
    {
        warnings.push(LintWarning::DirectoryMismatch {
            name: name.to_owned(),
            directory: directory.to_owned(),
        });
    }

    if front.body.trim().is_empty() {
        warnings.push(LintWarning::EmptyBody);
    }

    warnings.extend(
        text.lines()
            .enumerate()
            .filter(|(_, line)| line.contains(PLACEHOLDER))
            .map(|(i, _)| LintWarning::Placeholder { line: i + 1 }),
    );

    Ok(warnings)
}
