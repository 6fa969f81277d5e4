use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::SkillError;
use crate::frontmatter::{SkillMetadata, parse_front_matter};
use crate::index::IndexOptions;
use crate::resource::{ResourceKind, discover_resources};
use crate::validate::validate_metadata;

/// One skill directory: validated metadata plus the files it owns.
///
/// Packages are built during index construction and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SkillPackage {
    metadata: SkillMetadata,
    root: PathBuf,
    body_path: PathBuf,
    content_hash: String,
    resources: BTreeSet<String>,
}

impl SkillPackage {
    #[must_use]
    pub fn metadata(&self) -> &SkillMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    /// Canonical path of the skill directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn body_path(&self) -> &Path {
        &self.body_path
    }

    /// blake3 hex digest of the entry document at discovery time.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Resource paths relative to [`Self::root`], `/`-separated, in sorted order.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(String::as_str)
    }

    pub fn resources_of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &str> {
        self.resources()
            .filter(move |path| ResourceKind::of(path) == kind)
    }

    #[must_use]
    pub fn has_resource(&self, relative_path: &str) -> bool {
        self.resources.contains(relative_path)
    }
}

/// Load one skill directory: read the entry document, parse and validate its header,
/// and enumerate bundled resources.
///
/// # Errors
///
/// Returns the parser or validator error for a bad header, `BodyTooLarge` when the
/// entry document exceeds `options.max_body_bytes`, or an IO error.
pub fn load_package(dir: &Path, options: &IndexOptions) -> Result<SkillPackage, SkillError> {
    let root = dir.canonicalize()?;
    let body_path = root.join(&options.entry_document);
    let text = read_entry(&body_path, options.max_body_bytes)?;

    let metadata = validate_metadata(parse_front_matter(&text)?.metadata)?;
    let content_hash = blake3::hash(text.as_bytes()).to_hex().to_string();
    let resources = discover_resources(&root, &options.entry_document);

    Ok(SkillPackage {
        metadata,
        root,
        body_path,
        content_hash,
        resources,
    })
}

/// Read the instructional body (everything after the metadata block) from disk.
///
/// # Errors
///
/// Returns `BodyTooLarge` when the document grew past `max_body_bytes`, a parser
/// error when the header no longer parses, or an IO error.
pub fn load_body(package: &SkillPackage, max_body_bytes: u64) -> Result<String, SkillError> {
    let text = read_entry(&package.body_path, max_body_bytes)?;
    let body = parse_front_matter(&text)?.body;
    Ok(body.trim_start_matches(['\r', '\n']).to_owned())
}

pub(crate) fn read_entry(path: &Path, limit: u64) -> Result<String, SkillError> {
    let size = std::fs::metadata(path)?.len();
    if size > limit {
        return Err(SkillError::BodyTooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }

    let text = std::fs::read_to_string(path)?;
    // The file may have grown between stat and read.
    let size = text.len() as u64;
    if size > limit {
        return Err(SkillError::BodyTooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }
    Ok(text)
}
