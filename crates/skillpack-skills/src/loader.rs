//! Progressive disclosure: per-task residency of skill metadata, bodies and resources.
//!
//! Each package moves through `Unloaded -> MetadataResident -> BodyLoaded`, and a
//! loaded body may pull in any number of resources. The loader only advances tiers;
//! eviction is left to the host.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::SkillError;
use crate::frontmatter::SkillMetadata;
use crate::index::SkillIndex;
use crate::matcher::{TaskContext, TriggerMatcher};
use crate::package::{SkillPackage, load_body};
use crate::resource::{resolve_resource_capped, resource_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadTier {
    Metadata,
    Body,
    Resource,
}

impl fmt::Display for LoadTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => f.write_str("metadata"),
            Self::Body => f.write_str("body"),
            Self::Resource => f.write_str("resource"),
        }
    }
}

/// One tier advance applied by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub skill: String,
    pub tier: LoadTier,
    /// Normalized resource path for `LoadTier::Resource`.
    pub resource: Option<String>,
}

impl Transition {
    fn new(skill: &str, tier: LoadTier) -> Self {
        Self {
            skill: skill.to_owned(),
            tier,
            resource: None,
        }
    }

    fn resource(skill: &str, path: String) -> Self {
        Self {
            skill: skill.to_owned(),
            tier: LoadTier::Resource,
            resource: Some(path),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource {
            Some(path) => write!(f, "{} -> {} ({path})", self.skill, self.tier),
            None => write!(f, "{} -> {}", self.skill, self.tier),
        }
    }
}

#[derive(Debug)]
enum PackageState {
    MetadataResident,
    BodyLoaded {
        body: String,
        resources: BTreeMap<String, Vec<u8>>,
    },
}

/// Tracks which tier of each package is resident for the current task.
///
/// Packages absent from the state map are `Unloaded`.
pub struct ProgressiveLoader {
    index: Arc<SkillIndex>,
    matcher: Arc<dyn TriggerMatcher>,
    states: BTreeMap<String, PackageState>,
}

impl ProgressiveLoader {
    #[must_use]
    pub fn new(index: Arc<SkillIndex>, matcher: Arc<dyn TriggerMatcher>) -> Self {
        Self {
            index,
            matcher,
            states: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn index(&self) -> &Arc<SkillIndex> {
        &self.index
    }

    /// Make every package's metadata resident and load the bodies of packages whose
    /// trigger matches `task`.
    ///
    /// Tiers already resident are left alone, so repeating a call yields no
    /// transitions. A body that fails to load is logged and the package stays at
    /// the metadata tier, to be retried on the next call.
    pub fn activate(&mut self, task: &TaskContext) -> Vec<Transition> {
        let mut transitions = Vec::new();

        for name in self.index.list().map(|m| m.name.clone()).collect::<Vec<_>>() {
            if let Some(t) = self.ensure_metadata(&name) {
                transitions.push(t);
            }
        }

        let triggered: Vec<String> = self
            .index
            .list()
            .filter(|meta| self.matcher.matches(task, meta))
            .map(|meta| meta.name.clone())
            .collect();

        for name in triggered {
            match self.ensure_body(&name) {
                Ok(Some(t)) => transitions.push(t),
                Ok(None) => {}
                Err(e) => tracing::warn!("failed to load body of skill {name}: {e}"),
            }
        }

        transitions
    }

    /// Load the body of `name`, passing through the metadata tier if needed.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchPackage` for an unindexed name, or the error reading the body.
    pub fn load_body(&mut self, name: &str) -> Result<Vec<Transition>, SkillError> {
        self.index.lookup(name)?;
        let mut transitions = Vec::new();
        transitions.extend(self.ensure_metadata(name));
        transitions.extend(self.ensure_body(name)?);
        Ok(transitions)
    }

    /// Load one resource of `name`, passing through the metadata and body tiers if needed.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchPackage` for an unindexed name, `NoSuchResource` when the file does
    /// not exist or is the entry document, `PathEscape` when the path leaves the package,
    /// or a read error.
    pub fn load_resource(
        &mut self,
        name: &str,
        relative_path: &str,
    ) -> Result<Vec<Transition>, SkillError> {
        let index = Arc::clone(&self.index);
        let package = index.lookup(name)?;
        let key = resource_key(package, relative_path)?;
        if key == index.options().entry_document {
            return Err(SkillError::NoSuchResource {
                skill: name.to_owned(),
                path: relative_path.to_owned(),
            });
        }

        let mut transitions = self.load_body(name)?;
        if let Some(PackageState::BodyLoaded { resources, .. }) = self.states.get(name)
            && resources.contains_key(&key)
        {
            return Ok(transitions);
        }

        let max_bytes = index.options().max_resource_bytes;
        let bytes = resolve_resource_capped(package, &key, max_bytes).map_err(|e| match e {
            SkillError::ResourceNotFound { .. } => SkillError::NoSuchResource {
                skill: name.to_owned(),
                path: relative_path.to_owned(),
            },
            other => other,
        })?;

        if let Some(PackageState::BodyLoaded { resources, .. }) = self.states.get_mut(name) {
            resources.insert(key.clone(), bytes);
        }
        transitions.push(Transition::resource(name, key));
        Ok(transitions)
    }

    /// Highest resident tier of `name`; `None` when unloaded or unknown.
    #[must_use]
    pub fn tier(&self, name: &str) -> Option<LoadTier> {
        match self.states.get(name)? {
            PackageState::MetadataResident => Some(LoadTier::Metadata),
            PackageState::BodyLoaded { resources, .. } if resources.is_empty() => {
                Some(LoadTier::Body)
            }
            PackageState::BodyLoaded { .. } => Some(LoadTier::Resource),
        }
    }

    #[must_use]
    pub fn body(&self, name: &str) -> Option<&str> {
        match self.states.get(name)? {
            PackageState::BodyLoaded { body, .. } => Some(body),
            PackageState::MetadataResident => None,
        }
    }

    /// Bytes of a loaded resource. `path` is normalized the same way as in
    /// [`load_resource`](Self::load_resource).
    #[must_use]
    pub fn resource(&self, name: &str, path: &str) -> Option<&[u8]> {
        let key = self.key_of(name, path)?;
        match self.states.get(name)? {
            PackageState::BodyLoaded { resources, .. } => resources.get(&key).map(Vec::as_slice),
            PackageState::MetadataResident => None,
        }
    }

    /// Loaded resources of `name` as `(path, bytes)` pairs in path order.
    pub fn resources(&self, name: &str) -> impl Iterator<Item = (&str, &[u8])> {
        let loaded = match self.states.get(name) {
            Some(PackageState::BodyLoaded { resources, .. }) => Some(resources),
            _ => None,
        };
        loaded
            .into_iter()
            .flatten()
            .map(|(path, bytes)| (path.as_str(), bytes.as_slice()))
    }

    /// Metadata of every package at or past the metadata tier.
    pub fn resident_metadata(&self) -> impl Iterator<Item = &SkillMetadata> {
        self.states
            .keys()
            .filter_map(|name| self.index.get(name).map(SkillPackage::metadata))
    }

    /// Names of packages whose body is loaded, in name order.
    pub fn loaded_bodies(&self) -> impl Iterator<Item = &str> {
        self.states.iter().filter_map(|(name, state)| match state {
            PackageState::BodyLoaded { .. } => Some(name.as_str()),
            PackageState::MetadataResident => None,
        })
    }

    /// Return `name` to `Unloaded`. Returns whether anything was resident.
    pub fn evict(&mut self, name: &str) -> bool {
        self.states.remove(name).is_some()
    }

    /// Drop the body of `name` (and its resources), keeping the metadata resident.
    pub fn evict_body(&mut self, name: &str) -> bool {
        match self.states.get_mut(name) {
            Some(state @ PackageState::BodyLoaded { .. }) => {
                *state = PackageState::MetadataResident;
                true
            }
            _ => false,
        }
    }

    /// Drop one loaded resource. Returns whether it was resident.
    pub fn evict_resource(&mut self, name: &str, path: &str) -> bool {
        let Some(key) = self.key_of(name, path) else {
            return false;
        };
        match self.states.get_mut(name) {
            Some(PackageState::BodyLoaded { resources, .. }) => resources.remove(&key).is_some(),
            _ => false,
        }
    }

    /// Forget all residency, e.g. at the start of a new task.
    pub fn reset(&mut self) {
        self.states.clear();
    }

    fn key_of(&self, name: &str, path: &str) -> Option<String> {
        resource_key(self.index.get(name)?, path).ok()
    }

    fn ensure_metadata(&mut self, name: &str) -> Option<Transition> {
        if self.states.contains_key(name) {
            return None;
        }
        self.states
            .insert(name.to_owned(), PackageState::MetadataResident);
        Some(Transition::new(name, LoadTier::Metadata))
    }

    fn ensure_body(&mut self, name: &str) -> Result<Option<Transition>, SkillError> {
        if matches!(self.states.get(name), Some(PackageState::BodyLoaded { .. })) {
            return Ok(None);
        }
        debug_assert!(
            self.states.contains_key(name),
            "metadata tier must be resident before the body"
        );

        let package = self.index.lookup(name)?;
        let body = load_body(package, self.index.options().max_body_bytes)?;
        self.states.insert(
            name.to_owned(),
            PackageState::BodyLoaded {
                body,
                resources: BTreeMap::new(),
            },
        );
        Ok(Some(Transition::new(name, LoadTier::Body)))
    }
}

impl fmt::Debug for ProgressiveLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressiveLoader")
            .field("skills", &self.index.len())
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}
