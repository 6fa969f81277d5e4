//! Extraction of the `---` delimited YAML header at the top of a skill entry document.

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::SkillError;

const DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SkillMetadata {
    pub name: String,
    pub description: String,
}

/// Required fields read as plain text, so `name: 2024` stays `"2024"`.
#[derive(Deserialize)]
struct RequiredFields {
    name: String,
    description: String,
}

/// Parsed header plus whatever follows the closing marker.
#[derive(Debug)]
pub struct FrontMatter<'a> {
    pub metadata: SkillMetadata,
    /// Every top-level key present in the header, in document order.
    pub keys: Vec<String>,
    pub body: &'a str,
}

/// Parse the metadata block and return only the required fields.
///
/// # Errors
///
/// See [`parse_front_matter`].
pub fn parse_metadata(text: &str) -> Result<SkillMetadata, SkillError> {
    parse_front_matter(text).map(|fm| fm.metadata)
}

/// Parse the leading metadata block of a skill entry document.
///
/// Leading whitespace and a byte-order mark before the opening marker are tolerated.
/// Scalar values are taken as written, so `name: 2024` yields the name `2024`.
///
/// # Errors
///
/// Returns `MalformedMetadata` when the block is absent, unterminated or not a
/// key/value mapping, and `MissingField` when `name` or `description` is absent.
pub fn parse_front_matter(text: &str) -> Result<FrontMatter<'_>, SkillError> {
    let (header, body) = split_header(text)?;

    let value: Value = serde_yaml::from_str(header)
        .map_err(|e| SkillError::MalformedMetadata(format!("invalid YAML: {e}")))?;
    let map = match value {
        Value::Mapping(map) => map,
        Value::Null => Mapping::new(),
        other => {
            return Err(SkillError::MalformedMetadata(format!(
                "expected key/value pairs, found {}",
                kind_of(&other)
            )));
        }
    };

    let mut keys = Vec::with_capacity(map.len());
    for key in map.keys() {
        let Value::String(key) = key else {
            return Err(SkillError::MalformedMetadata(format!(
                "keys must be strings, found {}",
                kind_of(key)
            )));
        };
        keys.push(key.clone());
    }

    require_scalar(&map, "name")?;
    require_scalar(&map, "description")?;
    let fields: RequiredFields = serde_yaml::from_str(header)
        .map_err(|e| SkillError::MalformedMetadata(format!("invalid YAML: {e}")))?;

    let metadata = SkillMetadata {
        name: scalar_text(&map, "name", fields.name)?,
        description: scalar_text(&map, "description", fields.description)?,
    };

    Ok(FrontMatter {
        metadata,
        keys,
        body,
    })
}

fn split_header(text: &str) -> Result<(&str, &str), SkillError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text).trim_start();

    let Some(rest) = text.strip_prefix(DELIMITER) else {
        return Err(SkillError::MalformedMetadata(
            "missing opening `---` marker".into(),
        ));
    };
    let Some((opening, after)) = rest.split_once('\n') else {
        return Err(SkillError::MalformedMetadata(
            "unterminated front matter".into(),
        ));
    };
    if !opening.trim().is_empty() {
        return Err(SkillError::MalformedMetadata(
            "opening `---` marker must be on its own line".into(),
        ));
    }

    let mut offset = 0;
    for line in after.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            return Ok((&after[..offset], &after[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(SkillError::MalformedMetadata(
        "unterminated front matter".into(),
    ))
}

fn require_scalar(map: &Mapping, key: &'static str) -> Result<(), SkillError> {
    match map.get(key) {
        None => Err(SkillError::MissingField(key)),
        Some(v @ (Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_))) => Err(
            SkillError::MalformedMetadata(format!("`{key}` must be a string, found {}", kind_of(v))),
        ),
        Some(_) => Ok(()),
    }
}

fn scalar_text(map: &Mapping, key: &'static str, mut text: String) -> Result<String, SkillError> {
    // An empty value or `~` means absent; a literal `null` is kept as text.
    if matches!(map.get(key), Some(Value::Null)) && matches!(text.as_str(), "" | "~") {
        return Err(SkillError::MissingField(key));
    }
    // Block scalars (`>` / `|`) keep a trailing newline.
    text.truncate(text.trim_end_matches('\n').len());
    Ok(text)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
