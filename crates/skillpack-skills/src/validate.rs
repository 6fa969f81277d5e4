//! Naming and size rules shared by discovery and authoring tooling.

use crate::error::{DescriptionViolation, NameViolation, SkillError};
use crate::frontmatter::SkillMetadata;

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 1024;

/// Check `metadata` against the naming and size rules and hand it back unchanged.
///
/// # Errors
///
/// Returns `InvalidName` or `InvalidDescription` describing the first rule broken.
pub fn validate_metadata(metadata: SkillMetadata) -> Result<SkillMetadata, SkillError> {
    validate_name(&metadata.name)?;
    validate_description(&metadata.description)?;
    Ok(metadata)
}

/// A name is 1 to 64 characters drawn from `a-z`, `0-9` and `-`.
///
/// # Errors
///
/// Returns `InvalidName` carrying the offending name and the rule it breaks.
pub fn validate_name(name: &str) -> Result<(), SkillError> {
    let invalid = |violation| SkillError::InvalidName {
        name: name.to_owned(),
        violation,
    };

    if name.is_empty() {
        return Err(invalid(NameViolation::Empty));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(invalid(NameViolation::InvalidCharacter(c)));
    }
    // All characters are ASCII past this point.
    if name.len() > MAX_NAME_LEN {
        return Err(invalid(NameViolation::TooLong {
            len: name.len(),
            max: MAX_NAME_LEN,
        }));
    }
    Ok(())
}

/// A description is 1 to 1024 characters and never contains `<` or `>`.
///
/// # Errors
///
/// Returns `InvalidDescription` carrying the rule it breaks.
pub fn validate_description(description: &str) -> Result<(), SkillError> {
    let invalid = |violation| SkillError::InvalidDescription { violation };

    let len = description.chars().count();
    if len == 0 {
        return Err(invalid(DescriptionViolation::Empty));
    }
    if len > MAX_DESCRIPTION_LEN {
        return Err(invalid(DescriptionViolation::TooLong {
            len,
            max: MAX_DESCRIPTION_LEN,
        }));
    }
    if let Some(c) = description.chars().find(|c| matches!(c, '<' | '>')) {
        return Err(invalid(DescriptionViolation::AngleBracket(c)));
    }
    Ok(())
}
