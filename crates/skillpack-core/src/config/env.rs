use super::{Config, MatcherKind};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SKILLPACK_SKILLS_PATHS") {
            self.skills.paths = v
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("SKILLPACK_ENTRY_DOCUMENT") {
            self.skills.entry_document = v;
        }
        if let Ok(v) = std::env::var("SKILLPACK_MAX_BODY_BYTES")
            && let Ok(bytes) = v.parse::<u64>()
        {
            self.skills.max_body_bytes = bytes;
        }
        if let Ok(v) = std::env::var("SKILLPACK_MAX_RESOURCE_BYTES")
            && let Ok(bytes) = v.parse::<u64>()
        {
            self.skills.max_resource_bytes = bytes;
        }
        if let Ok(v) = std::env::var("SKILLPACK_HOT_RELOAD")
            && let Ok(enabled) = v.parse::<bool>()
        {
            self.skills.hot_reload = enabled;
        }
        if let Ok(v) = std::env::var("SKILLPACK_MATCHER") {
            match v.parse::<MatcherKind>() {
                Ok(kind) => self.matcher.kind = kind,
                Err(e) => tracing::warn!("ignoring invalid SKILLPACK_MATCHER value: {e}"),
            }
        }
        if let Ok(v) = std::env::var("SKILLPACK_MATCHER_MIN_OVERLAP")
            && let Ok(n) = v.parse::<usize>()
        {
            self.matcher.min_overlap = n;
        }
        if let Ok(v) = std::env::var("SKILLPACK_LOG") {
            self.logging.filter = v;
        }
    }
}
