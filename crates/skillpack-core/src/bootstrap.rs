//! Application bootstrap: config resolution and registry/matcher/watcher construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use skillpack_skills::index::{DiscoveryError, IndexOptions};
use skillpack_skills::loader::ProgressiveLoader;
use skillpack_skills::matcher::{ExplicitMatcher, KeywordMatcher, TriggerMatcher};
use skillpack_skills::registry::SkillRegistry;
use skillpack_skills::watcher::{SkillEvent, SkillWatcher};
use tokio::sync::mpsc;

use crate::config::{Config, MatcherKind};

pub struct AppBuilder {
    config: Config,
    config_path: PathBuf,
}

pub struct WatcherBundle {
    pub skill_watcher: Option<SkillWatcher>,
    pub skill_reload_rx: mpsc::Receiver<SkillEvent>,
}

impl AppBuilder {
    /// Resolve the config path, load it, and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be parsed or fails validation.
    pub fn from_cli(cli_path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = resolve_config_path(cli_path);
        let config = Config::load(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))?;
        config.validate()?;
        Ok(Self {
            config,
            config_path,
        })
    }

    #[must_use]
    pub fn new(config: Config, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    #[must_use]
    pub fn skill_paths(&self) -> Vec<PathBuf> {
        self.config.skills.paths.iter().map(PathBuf::from).collect()
    }

    #[must_use]
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            entry_document: self.config.skills.entry_document.clone(),
            max_body_bytes: self.config.skills.max_body_bytes,
            max_resource_bytes: self.config.skills.max_resource_bytes,
        }
    }

    /// Scan every configured root and publish the first index snapshot.
    ///
    /// Per-skill problems are logged and returned; they do not fail the build.
    ///
    /// # Errors
    ///
    /// Returns an error if two skills share a name.
    pub fn build_registry(&self) -> anyhow::Result<(SkillRegistry, Vec<DiscoveryError>)> {
        let (registry, errors) = SkillRegistry::open(&self.skill_paths(), self.index_options())
            .context("failed to build skill index")?;
        for e in &errors {
            tracing::warn!("skipped skill {e}");
        }
        Ok((registry, errors))
    }

    #[must_use]
    pub fn build_matcher(&self) -> Arc<dyn TriggerMatcher> {
        match self.config.matcher.kind {
            MatcherKind::Keyword => Arc::new(KeywordMatcher {
                min_overlap: self.config.matcher.min_overlap,
            }),
            MatcherKind::Explicit => Arc::new(ExplicitMatcher),
        }
    }

    #[must_use]
    pub fn build_loader(&self, registry: &SkillRegistry) -> ProgressiveLoader {
        ProgressiveLoader::new(registry.snapshot(), self.build_matcher())
    }

    /// Start the skill watcher when hot reload is enabled.
    ///
    /// A watcher that fails to start is logged and left out; the receiver then
    /// never yields.
    #[must_use]
    pub fn build_watchers(&self) -> WatcherBundle {
        let (reload_tx, skill_reload_rx) = mpsc::channel(4);
        if !self.config.skills.hot_reload {
            tracing::debug!("skill hot reload disabled");
            return WatcherBundle {
                skill_watcher: None,
                skill_reload_rx,
            };
        }

        let skill_watcher = match SkillWatcher::start(
            &self.skill_paths(),
            &self.config.skills.entry_document,
            reload_tx,
        ) {
            Ok(w) => {
                tracing::info!("skill watcher started");
                Some(w)
            }
            Err(e) => {
                tracing::warn!("skill watcher unavailable: {e:#}");
                None
            }
        };

        WatcherBundle {
            skill_watcher,
            skill_reload_rx,
        }
    }
}

/// Priority: `--config` > `SKILLPACK_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("SKILLPACK_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}
