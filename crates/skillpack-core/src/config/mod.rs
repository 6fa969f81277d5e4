mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to sensible defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!("config file {} not found, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings the skill index cannot work with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.skills.paths.is_empty() {
            bail!("skills.paths must list at least one directory");
        }
        let entry = self.skills.entry_document.as_str();
        if entry.is_empty() || entry.contains(['/', '\\']) || entry == "." || entry == ".." {
            bail!("skills.entry_document must be a plain file name, got {entry:?}");
        }
        if self.skills.max_body_bytes == 0 {
            bail!("skills.max_body_bytes must be greater than zero");
        }
        if self.skills.max_resource_bytes == 0 {
            bail!("skills.max_resource_bytes must be greater than zero");
        }
        if self.matcher.min_overlap == 0 {
            bail!("matcher.min_overlap must be at least 1");
        }
        Ok(())
    }
}
