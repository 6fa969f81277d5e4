use std::io::Write;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 8] = [
    "SKILLPACK_SKILLS_PATHS",
    "SKILLPACK_ENTRY_DOCUMENT",
    "SKILLPACK_MAX_BODY_BYTES",
    "SKILLPACK_MAX_RESOURCE_BYTES",
    "SKILLPACK_HOT_RELOAD",
    "SKILLPACK_MATCHER",
    "SKILLPACK_MATCHER_MIN_OVERLAP",
    "SKILLPACK_LOG",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert_eq!(config.skills.paths, vec!["./skills"]);
    assert_eq!(config.skills.entry_document, "SKILL.md");
    assert_eq!(config.skills.max_body_bytes, 256 * 1024);
    assert_eq!(config.skills.max_resource_bytes, 4 * 1024 * 1024);
    assert!(config.skills.hot_reload);
    assert_eq!(config.matcher.kind, MatcherKind::Keyword);
    assert_eq!(config.matcher.min_overlap, 2);
    assert_eq!(config.logging.filter, "info");
}

#[test]
#[serial]
fn load_nonexistent_file_uses_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/skillpack.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn parse_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        r#"
[skills]
paths = ["./a", "./b"]
entry_document = "README.md"
max_body_bytes = 1024
hot_reload = false

[matcher]
kind = "explicit"

[logging]
filter = "skillpack=debug"
"#
    )
    .unwrap();

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.skills.paths, vec!["./a", "./b"]);
    assert_eq!(config.skills.entry_document, "README.md");
    assert_eq!(config.skills.max_body_bytes, 1024);
    assert_eq!(config.skills.max_resource_bytes, 4 * 1024 * 1024);
    assert!(!config.skills.hot_reload);
    assert_eq!(config.matcher.kind, MatcherKind::Explicit);
    assert_eq!(config.matcher.min_overlap, 2);
    assert_eq!(config.logging.filter, "skillpack=debug");
}

#[test]
#[serial]
fn partial_toml_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(&path, "[matcher]\nmin_overlap = 3\n").unwrap();

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.matcher.min_overlap, 3);
    assert_eq!(config.skills, SkillsConfig::default());
    assert_eq!(config.logging, LoggingConfig::default());
}

#[test]
#[serial]
fn invalid_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[skills\npaths = 1").unwrap();

    clear_env();

    let err = Config::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn unknown_matcher_kind_in_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[matcher]\nkind = \"embedding\"\n").unwrap();

    clear_env();

    assert!(Config::load(&path).is_err());
}

#[test]
#[serial]
fn env_overrides() {
    clear_env();
    let mut config = Config::default();

    unsafe {
        std::env::set_var("SKILLPACK_SKILLS_PATHS", "/opt/skills, ./local ,");
        std::env::set_var("SKILLPACK_ENTRY_DOCUMENT", "SKILLS.md");
        std::env::set_var("SKILLPACK_MAX_BODY_BYTES", "2048");
        std::env::set_var("SKILLPACK_MAX_RESOURCE_BYTES", "4096");
        std::env::set_var("SKILLPACK_HOT_RELOAD", "false");
        std::env::set_var("SKILLPACK_MATCHER", "Explicit");
        std::env::set_var("SKILLPACK_MATCHER_MIN_OVERLAP", "4");
        std::env::set_var("SKILLPACK_LOG", "warn");
    }
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.skills.paths, vec!["/opt/skills", "./local"]);
    assert_eq!(config.skills.entry_document, "SKILLS.md");
    assert_eq!(config.skills.max_body_bytes, 2048);
    assert_eq!(config.skills.max_resource_bytes, 4096);
    assert!(!config.skills.hot_reload);
    assert_eq!(config.matcher.kind, MatcherKind::Explicit);
    assert_eq!(config.matcher.min_overlap, 4);
    assert_eq!(config.logging.filter, "warn");
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    let mut config = Config::default();

    unsafe {
        std::env::set_var("SKILLPACK_MAX_BODY_BYTES", "lots");
        std::env::set_var("SKILLPACK_HOT_RELOAD", "maybe");
        std::env::set_var("SKILLPACK_MATCHER", "vector");
    }
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("env.toml");
    std::fs::write(&path, "[matcher]\nmin_overlap = 3\n").unwrap();

    clear_env();
    unsafe { std::env::set_var("SKILLPACK_MATCHER_MIN_OVERLAP", "5") };
    let config = Config::load(&path).unwrap();
    clear_env();

    assert_eq!(config.matcher.min_overlap, 5);
}

#[test]
fn validate_accepts_defaults() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn validate_rejects_empty_paths() {
    let mut config = Config::default();
    config.skills.paths.clear();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("skills.paths"));
}

#[test]
fn validate_rejects_entry_document_with_separator() {
    for bad in ["", "docs/SKILL.md", "..", "a\\b"] {
        let mut config = Config::default();
        config.skills.entry_document = bad.into();
        assert!(config.validate().is_err(), "{bad:?} should be rejected");
    }
}

#[test]
fn validate_rejects_zero_limits() {
    let mut config = Config::default();
    config.skills.max_body_bytes = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.skills.max_resource_bytes = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.matcher.min_overlap = 0;
    assert!(config.validate().is_err());
}

#[test]
fn matcher_kind_parses_case_insensitively() {
    assert_eq!("KEYWORD".parse::<MatcherKind>(), Ok(MatcherKind::Keyword));
    assert_eq!(" explicit ".parse::<MatcherKind>(), Ok(MatcherKind::Explicit));
    assert!("semantic".parse::<MatcherKind>().is_err());
    assert_eq!(MatcherKind::Explicit.to_string(), "explicit");
}

#[test]
fn config_serializes_back_to_toml() {
    let config = Config::default();
    let text = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}
