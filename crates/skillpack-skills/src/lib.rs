//! Skill package discovery, validation, and tiered loading.
//!
//! A skill is a directory holding an entry document (`SKILL.md` by default) whose
//! front matter names and describes it, plus optional bundled resources. Only the
//! metadata stays resident; bodies and resources are read on demand by the
//! [`loader::ProgressiveLoader`].

pub mod error;
pub mod frontmatter;
pub mod index;
pub mod lint;
pub mod loader;
pub mod matcher;
pub mod package;
pub mod prompt;
pub mod registry;
pub mod resource;
pub mod validate;
pub mod watcher;

pub use error::SkillError;
pub use frontmatter::SkillMetadata;
pub use index::{IndexOptions, SkillIndex};
pub use loader::{LoadTier, ProgressiveLoader, Transition};
pub use package::SkillPackage;
