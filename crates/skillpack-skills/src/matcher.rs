//! Trigger predicates deciding which skill bodies a task should pull in.

use std::collections::BTreeSet;

use crate::frontmatter::SkillMetadata;

const STOP_WORDS: &[&str] = &[
    "and", "are", "for", "from", "how", "into", "not", "that", "the", "this", "use", "used",
    "using", "when", "with", "you", "your", "what", "which", "will",
];

const MIN_WORD_LEN: usize = 3;

/// The host's view of the current task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskContext {
    pub query: String,
    /// Skill names invoked explicitly with a `/skill-name` token.
    pub requested: BTreeSet<String>,
}

impl TaskContext {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let requested = query
            .split_whitespace()
            .filter_map(|token| token.strip_prefix('/'))
            .map(|name| name.trim_end_matches(|c: char| c.is_ascii_punctuation() && c != '-'))
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();
        Self { query, requested }
    }

    #[must_use]
    pub fn requests(&self, name: &str) -> bool {
        self.requested.contains(name)
    }
}

pub trait TriggerMatcher: Send + Sync {
    fn matches(&self, task: &TaskContext, metadata: &SkillMetadata) -> bool;
}

impl<F> TriggerMatcher for F
where
    F: Fn(&TaskContext, &SkillMetadata) -> bool + Send + Sync,
{
    fn matches(&self, task: &TaskContext, metadata: &SkillMetadata) -> bool {
        self(task, metadata)
    }
}

/// Matches only skills named with `/skill-name` in the task.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitMatcher;

impl TriggerMatcher for ExplicitMatcher {
    fn matches(&self, task: &TaskContext, metadata: &SkillMetadata) -> bool {
        task.requests(&metadata.name)
    }
}

/// Matches explicit requests, or tasks sharing enough significant words with the
/// skill's name and description.
#[derive(Debug, Clone, Copy)]
pub struct KeywordMatcher {
    pub min_overlap: usize,
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self { min_overlap: 2 }
    }
}

impl TriggerMatcher for KeywordMatcher {
    fn matches(&self, task: &TaskContext, metadata: &SkillMetadata) -> bool {
        if task.requests(&metadata.name) {
            return true;
        }
        let query = significant_words(&task.query);
        if query.is_empty() {
            return false;
        }
        let mut skill = significant_words(&metadata.description);
        skill.extend(significant_words(&metadata.name));

        query.intersection(&skill).count() >= self.min_overlap.max(1)
    }
}

fn significant_words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(name: &str, description: &str) -> SkillMetadata {
        SkillMetadata {
            name: name.into(),
            description: description.into(),
        }
    }

    #[test]
    fn task_context_parses_explicit_requests() {
        let task = TaskContext::new("please run /spring-boot, then /jpa.");
        assert!(task.requests("spring-boot"));
        assert!(task.requests("jpa"));
        assert_eq!(task.requested.len(), 2);
    }

    #[test]
    fn task_context_ignores_bare_slash() {
        let task = TaskContext::new("a / b");
        assert!(task.requested.is_empty());
    }

    #[test]
    fn explicit_matcher() {
        let m = meta("spring-boot", "Spring Boot patterns");
        assert!(ExplicitMatcher.matches(&TaskContext::new("/spring-boot"), &m));
        assert!(!ExplicitMatcher.matches(&TaskContext::new("spring boot patterns"), &m));
    }

    #[test]
    fn keyword_matcher_needs_overlap() {
        let m = meta(
            "spring-boot",
            "Spring Boot patterns for REST controllers and configuration",
        );
        let matcher = KeywordMatcher::default();
        assert!(matcher.matches(&TaskContext::new("Add a REST controller in Spring"), &m));
        assert!(!matcher.matches(&TaskContext::new("Write a haiku about spring"), &m));
        assert!(!matcher.matches(&TaskContext::new(""), &m));
    }

    #[test]
    fn keyword_matcher_honors_explicit_request() {
        let m = meta("jpa", "Entity mapping");
        assert!(KeywordMatcher { min_overlap: 10 }.matches(&TaskContext::new("/jpa"), &m));
    }

    #[test]
    fn keyword_matcher_ignores_stop_words_and_case() {
        let m = meta("docs", "Use this when writing the README");
        let matcher = KeywordMatcher { min_overlap: 1 };
        assert!(!matcher.matches(&TaskContext::new("use this when the"), &m));
        assert!(matcher.matches(&TaskContext::new("update readme"), &m));
    }

    #[test]
    fn closures_are_matchers() {
        let always = |_: &TaskContext, _: &SkillMetadata| true;
        assert!(always.matches(&TaskContext::default(), &meta("a", "b")));
    }
}
