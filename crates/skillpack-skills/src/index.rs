//! Catalog of every skill discovered under one or more root directories.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::SkillError;
use crate::frontmatter::SkillMetadata;
use crate::package::{SkillPackage, load_package};
use crate::resource::DEFAULT_MAX_RESOURCE_BYTES;

pub const DEFAULT_ENTRY_DOCUMENT: &str = "SKILL.md";
pub const DEFAULT_MAX_BODY_BYTES: u64 = 256 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    /// File name of the entry document inside each skill directory.
    pub entry_document: String,
    pub max_body_bytes: u64,
    pub max_resource_bytes: u64,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            entry_document: DEFAULT_ENTRY_DOCUMENT.into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_resource_bytes: DEFAULT_MAX_RESOURCE_BYTES,
        }
    }
}

/// A skill directory that was left out of the index, and why.
#[derive(Debug)]
pub struct DiscoveryError {
    pub dir: PathBuf,
    pub error: SkillError,
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.dir.display(), self.error)
    }
}

/// Immutable snapshot of discovered skills keyed by name.
#[derive(Debug, Default)]
pub struct SkillIndex {
    packages: BTreeMap<String, SkillPackage>,
    options: IndexOptions,
}

impl SkillIndex {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SkillPackage> {
        self.packages.get(name)
    }

    /// Exact-name lookup.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchPackage` when no skill has this name.
    pub fn lookup(&self, name: &str) -> Result<&SkillPackage, SkillError> {
        self.get(name)
            .ok_or_else(|| SkillError::NoSuchPackage(name.to_owned()))
    }

    /// Metadata of every indexed skill. The iterator can be cloned to restart it.
    pub fn list(&self) -> impl Iterator<Item = &SkillMetadata> + Clone {
        self.packages.values().map(SkillPackage::metadata)
    }

    pub fn packages(&self) -> impl Iterator<Item = &SkillPackage> {
        self.packages.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Digest over names, entry document hashes and resource listings.
    ///
    /// Equal fingerprints mean a rescan found nothing to republish.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (name, package) in &self.packages {
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
            hasher.update(package.content_hash().as_bytes());
            for resource in package.resources() {
                hasher.update(&[0]);
                hasher.update(resource.as_bytes());
            }
            hasher.update(&[0xff]);
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Build an index from a single root with default options.
///
/// # Errors
///
/// Fails only with `DuplicateName`; per-skill problems are returned alongside the index.
pub fn build_index(root: &Path) -> Result<(SkillIndex, Vec<DiscoveryError>), SkillError> {
    build_index_with(&[root], &IndexOptions::default())
}

/// Scan every immediate subdirectory of each root for a skill entry document.
///
/// Directories whose skill fails to load are excluded and reported; a name defined
/// twice aborts the whole build since lookups would become ambiguous.
///
/// # Errors
///
/// Returns `DuplicateName` when two directories declare the same skill name.
pub fn build_index_with(
    roots: &[impl AsRef<Path>],
    options: &IndexOptions,
) -> Result<(SkillIndex, Vec<DiscoveryError>), SkillError> {
    let mut packages: BTreeMap<String, SkillPackage> = BTreeMap::new();
    let mut errors = Vec::new();

    for root in roots {
        let root = root.as_ref();
        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("cannot read skill directory {}: {e}", root.display());
                errors.push(DiscoveryError {
                    dir: root.to_path_buf(),
                    error: SkillError::Io(e),
                });
                continue;
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        // Sorted so the pair named in a DuplicateName error is reproducible.
        dirs.sort();

        for dir in dirs {
            if !dir.join(&options.entry_document).is_file() {
                tracing::debug!("skipping {}: no {}", dir.display(), options.entry_document);
                continue;
            }
            let package = match load_package(&dir, options) {
                Ok(package) => package,
                Err(error) => {
                    tracing::warn!("skipping {}: {error}", dir.display());
                    errors.push(DiscoveryError { dir, error });
                    continue;
                }
            };

            match packages.entry(package.name().to_owned()) {
                Entry::Vacant(slot) => {
                    tracing::debug!("discovered skill {} at {}", package.name(), dir.display());
                    slot.insert(package);
                }
                Entry::Occupied(existing) => {
                    return Err(SkillError::DuplicateName {
                        name: existing.key().clone(),
                        first: existing.get().root().to_path_buf(),
                        second: package.root().to_path_buf(),
                    });
                }
            }
        }
    }

    tracing::info!(
        "indexed {} skill(s), {} excluded",
        packages.len(),
        errors.len()
    );

    Ok((
        SkillIndex {
            packages,
            options: options.clone(),
        },
        errors,
    ))
}
