use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::SkillError;
use crate::index::{DiscoveryError, IndexOptions, SkillIndex, build_index_with};

/// Outcome of [`SkillRegistry::rescan`].
#[derive(Debug)]
pub struct Rescan {
    /// Whether a new snapshot was published.
    pub changed: bool,
    pub errors: Vec<DiscoveryError>,
}

/// Owns the current [`SkillIndex`] snapshot and swaps it wholesale on rescan.
///
/// Readers take an `Arc` to the snapshot and keep using it while a rebuild runs;
/// they never observe a partially built index.
#[derive(Debug)]
pub struct SkillRegistry {
    roots: Vec<PathBuf>,
    options: IndexOptions,
    current: watch::Sender<Arc<SkillIndex>>,
}

impl SkillRegistry {
    /// Scan `roots` and publish the first snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` when two skills share a name.
    pub fn open(
        roots: &[impl AsRef<Path>],
        options: IndexOptions,
    ) -> Result<(Self, Vec<DiscoveryError>), SkillError> {
        let roots: Vec<PathBuf> = roots.iter().map(|r| r.as_ref().to_path_buf()).collect();
        let (index, errors) = build_index_with(&roots, &options)?;
        let (current, _) = watch::channel(Arc::new(index));

        Ok((
            Self {
                roots,
                options,
                current,
            },
            errors,
        ))
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<SkillIndex> {
        Arc::clone(&self.current.borrow())
    }

    /// Receiver that is notified each time a new snapshot is published.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<SkillIndex>> {
        self.current.subscribe()
    }

    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Rebuild the index from disk and publish it if anything changed.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName`; the previous snapshot stays published.
    pub fn rescan(&self) -> Result<Rescan, SkillError> {
        let (index, errors) = build_index_with(&self.roots, &self.options).inspect_err(|e| {
            tracing::warn!("rescan failed, keeping previous skill index: {e}");
        })?;

        if index.fingerprint() == self.current.borrow().fingerprint() {
            tracing::debug!("rescan found no changes");
            return Ok(Rescan {
                changed: false,
                errors,
            });
        }

        let count = index.len();
        self.current.send_replace(Arc::new(index));
        tracing::info!("published skill index with {count} skill(s)");

        Ok(Rescan {
            changed: true,
            errors,
        })
    }
}
