use std::path::PathBuf;

/// Which naming rule a skill name broke.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameViolation {
    #[error("name must not be empty")]
    Empty,

    #[error("name is {len} characters, maximum is {max}")]
    TooLong { len: usize, max: usize },

    #[error("character {0:?} is not allowed (use lowercase letters, digits and hyphens)")]
    InvalidCharacter(char),
}

/// Which size/content rule a skill description broke.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptionViolation {
    #[error("description must not be empty")]
    Empty,

    #[error("description is {len} characters, maximum is {max}")]
    TooLong { len: usize, max: usize },

    #[error("description must not contain angle bracket {0:?}")]
    AngleBracket(char),
}

#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watcher error: {0}")]
    Watcher(#[from] notify::Error),

    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    #[error("missing required field `{0}` in metadata")]
    MissingField(&'static str),

    #[error("invalid name {name:?}: {violation}")]
    InvalidName {
        name: String,
        violation: NameViolation,
    },

    #[error("invalid description: {violation}")]
    InvalidDescription { violation: DescriptionViolation },

    #[error(
        "duplicate skill name {name:?}: defined in {} and {}",
        first.display(),
        second.display()
    )]
    DuplicateName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("entry document {} is {size} bytes, limit is {limit}", path.display())]
    BodyTooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    #[error("path {path:?} escapes skill directory {}", root.display())]
    PathEscape { path: String, root: PathBuf },

    #[error("resource not found: {path}")]
    ResourceNotFound { path: String },

    #[error("resource {path} is {size} bytes, limit is {limit}")]
    ResourceTooLarge { path: String, size: u64, limit: u64 },

    #[error("skill not found: {0}")]
    NoSuchPackage(String),

    #[error("skill {skill:?} has no resource {path:?}")]
    NoSuchResource { skill: String, path: String },
}

impl SkillError {
    /// Per-package errors are collected during discovery; everything else aborts.
    #[must_use]
    pub fn is_fatal_to_build(&self) -> bool {
        matches!(self, Self::DuplicateName { .. })
    }
}
