use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use skillpack_skills::index::{DEFAULT_ENTRY_DOCUMENT, DEFAULT_MAX_BODY_BYTES};
use skillpack_skills::resource::DEFAULT_MAX_RESOURCE_BYTES;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_skill_paths() -> Vec<String> {
    vec!["./skills".into()]
}

fn default_entry_document() -> String {
    DEFAULT_ENTRY_DOCUMENT.into()
}

fn default_max_body_bytes() -> u64 {
    DEFAULT_MAX_BODY_BYTES
}

fn default_max_resource_bytes() -> u64 {
    DEFAULT_MAX_RESOURCE_BYTES
}

fn default_hot_reload() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SkillsConfig {
    #[serde(default = "default_skill_paths")]
    pub paths: Vec<String>,
    #[serde(default = "default_entry_document")]
    pub entry_document: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
    #[serde(default = "default_max_resource_bytes")]
    pub max_resource_bytes: u64,
    #[serde(default = "default_hot_reload")]
    pub hot_reload: bool,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            paths: default_skill_paths(),
            entry_document: default_entry_document(),
            max_body_bytes: default_max_body_bytes(),
            max_resource_bytes: default_max_resource_bytes(),
            hot_reload: default_hot_reload(),
        }
    }
}

/// Trigger predicate used by `activate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    #[default]
    Keyword,
    Explicit,
}

impl FromStr for MatcherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "explicit" => Ok(Self::Explicit),
            other => Err(format!("unknown matcher kind: {other}")),
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Keyword => "keyword",
            Self::Explicit => "explicit",
        })
    }
}

fn default_min_overlap() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatcherConfig {
    #[serde(default)]
    pub kind: MatcherKind,
    #[serde(default = "default_min_overlap")]
    pub min_overlap: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            kind: MatcherKind::default(),
            min_overlap: default_min_overlap(),
        }
    }
}

fn default_log_filter() -> String {
    "info".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}
