use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use crate::error::SkillError;
use crate::package::SkillPackage;

pub const DEFAULT_MAX_RESOURCE_BYTES: u64 = 4 * 1024 * 1024;

const MAX_WALK_DEPTH: usize = 8;

/// Conventional resource folders inside a skill directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Reference,
    Script,
    Asset,
    Other,
}

impl ResourceKind {
    /// Classify a `/`-separated relative path by its top-level folder.
    #[must_use]
    pub fn of(relative_path: &str) -> Self {
        match relative_path.split('/').next() {
            Some("references") => Self::Reference,
            Some("scripts") => Self::Script,
            Some("assets") => Self::Asset,
            _ => Self::Other,
        }
    }
}

/// Enumerate every regular file under `root` except the entry document.
///
/// Hidden entries are skipped, and so are symlinks whose target leaves `root`.
#[must_use]
pub fn discover_resources(root: &Path, entry_document: &str) -> BTreeSet<String> {
    let mut resources = BTreeSet::new();
    walk(root, root, 0, &mut resources);
    resources.remove(entry_document);
    resources
}

fn walk(root: &Path, dir: &Path, depth: usize, out: &mut BTreeSet<String>) {
    if depth > MAX_WALK_DEPTH {
        tracing::debug!("resource walk depth limit reached at {}", dir.display());
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let Ok(resolved) = path.canonicalize() else {
            continue;
        };
        if !resolved.starts_with(root) {
            tracing::debug!("ignoring {}: target escapes skill directory", path.display());
            continue;
        }
        if resolved.is_dir() {
            walk(root, &path, depth + 1, out);
        } else if resolved.is_file()
            && let Ok(relative) = path.strip_prefix(root)
        {
            out.insert(to_key(relative));
        }
    }
}

/// Load a resource with the default size ceiling.
///
/// # Errors
///
/// See [`resolve_resource_capped`].
pub fn resolve_resource(package: &SkillPackage, relative_path: &str) -> Result<Vec<u8>, SkillError> {
    resolve_resource_capped(package, relative_path, DEFAULT_MAX_RESOURCE_BYTES)
}

/// Load a resource file owned by `package`.
///
/// The path is normalized lexically before anything touches the file system, so a
/// path that escapes the package is rejected whether or not its target exists.
///
/// # Errors
///
/// Returns `PathEscape` when the path (or a symlink it passes through) leaves the
/// package directory, `ResourceNotFound` when no file exists there,
/// `ResourceTooLarge` past `max_bytes`, or an IO error.
pub fn resolve_resource_capped(
    package: &SkillPackage,
    relative_path: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, SkillError> {
    let root = package.root();
    let target = contained_path(root, relative_path)?;
    let not_found = || SkillError::ResourceNotFound {
        path: relative_path.to_owned(),
    };

    let resolved = match target.canonicalize() {
        Ok(p) => p,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(SkillError::Io(e)),
    };
    if !resolved.starts_with(root) {
        return Err(SkillError::PathEscape {
            path: relative_path.to_owned(),
            root: root.to_path_buf(),
        });
    }

    let meta = std::fs::metadata(&resolved)?;
    if !meta.is_file() {
        return Err(not_found());
    }
    if meta.len() > max_bytes {
        return Err(SkillError::ResourceTooLarge {
            path: relative_path.to_owned(),
            size: meta.len(),
            limit: max_bytes,
        });
    }

    Ok(std::fs::read(&resolved)?)
}

/// Normalize `relative_path` against the package root into its canonical key,
/// e.g. `./references/../references/a.md` becomes `references/a.md`.
///
/// # Errors
///
/// Returns `PathEscape` when the path leaves the package directory.
pub fn resource_key(package: &SkillPackage, relative_path: &str) -> Result<String, SkillError> {
    let root = package.root();
    let target = contained_path(root, relative_path)?;
    let relative = target.strip_prefix(root).unwrap_or(Path::new(""));
    Ok(to_key(relative))
}

/// Join and lexically normalize, failing when the result is outside `root`.
fn contained_path(root: &Path, relative_path: &str) -> Result<PathBuf, SkillError> {
    let escape = || SkillError::PathEscape {
        path: relative_path.to_owned(),
        root: root.to_path_buf(),
    };

    let requested = Path::new(relative_path);
    if requested.has_root() || requested.is_absolute() {
        return Err(escape());
    }

    let mut normalized = root.to_path_buf();
    for component in requested.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(escape());
                }
            }
            Component::Normal(part) => normalized.push(part),
            Component::RootDir | Component::Prefix(_) => return Err(escape()),
        }
    }

    if normalized.starts_with(root) {
        Ok(normalized)
    } else {
        Err(escape())
    }
}

fn to_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexOptions;
    use crate::package::load_package;

    fn package_with(files: &[(&str, &str)]) -> (tempfile::TempDir, SkillPackage) {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("spring-boot");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(
            dir.join("SKILL.md"),
            "---\nname: spring-boot\ndescription: Spring Boot patterns\n---\nbody",
        )
        .unwrap();
        for (path, content) in files {
            let full = dir.join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }
        let pkg = load_package(&dir, &IndexOptions::default()).unwrap();
        (tmp, pkg)
    }

    #[test]
    fn classify_resource_kinds() {
        assert_eq!(ResourceKind::of("references/a.md"), ResourceKind::Reference);
        assert_eq!(ResourceKind::of("scripts/run.sh"), ResourceKind::Script);
        assert_eq!(ResourceKind::of("assets/logo.png"), ResourceKind::Asset);
        assert_eq!(ResourceKind::of("FORMS.md"), ResourceKind::Other);
    }

    #[test]
    fn discover_empty_skill_dir() {
        let (_tmp, pkg) = package_with(&[]);
        assert_eq!(pkg.resources().count(), 0);
    }

    #[test]
    fn discover_nested_resources_sorted() {
        let (_tmp, pkg) = package_with(&[
            ("scripts/run.sh", "#!/bin/bash"),
            ("references/jpa/entities.md", "# Entities"),
            ("assets/logo.png", "png"),
            ("FORMS.md", "forms"),
            (".hidden/secret", "x"),
        ]);
        assert_eq!(
            pkg.resources().collect::<Vec<_>>(),
            vec![
                "FORMS.md",
                "assets/logo.png",
                "references/jpa/entities.md",
                "scripts/run.sh",
            ]
        );
        assert_eq!(
            pkg.resources_of_kind(ResourceKind::Script).collect::<Vec<_>>(),
            vec!["scripts/run.sh"]
        );
    }

    #[test]
    fn resolve_valid_resource() {
        let (_tmp, pkg) = package_with(&[("scripts/run.sh", "echo hello")]);
        assert_eq!(resolve_resource(&pkg, "scripts/run.sh").unwrap(), b"echo hello");
    }

    #[test]
    fn resolve_with_dot_segments_inside_root() {
        let (_tmp, pkg) = package_with(&[("references/a.md", "a")]);
        assert_eq!(
            resolve_resource(&pkg, "./scripts/../references/a.md").unwrap(),
            b"a"
        );
    }

    #[test]
    fn traversal_rejected_even_when_target_exists() {
        let (tmp, pkg) = package_with(&[]);
        std::fs::create_dir(tmp.path().join("other")).unwrap();
        std::fs::write(tmp.path().join("other/secret.md"), "secret").unwrap();

        let err = resolve_resource(&pkg, "../other/secret.md").unwrap_err();
        assert!(matches!(err, SkillError::PathEscape { .. }));
        let err = resolve_resource(&pkg, "../../../etc/passwd").unwrap_err();
        assert!(matches!(err, SkillError::PathEscape { .. }));
    }

    #[test]
    fn traversal_back_into_own_root_allowed() {
        let (_tmp, pkg) = package_with(&[("references/a.md", "a")]);
        assert_eq!(
            resolve_resource(&pkg, "../spring-boot/references/a.md").unwrap(),
            b"a"
        );
    }

    #[test]
    fn absolute_path_rejected() {
        let (_tmp, pkg) = package_with(&[]);
        let err = resolve_resource(&pkg, "/etc/passwd").unwrap_err();
        assert!(matches!(err, SkillError::PathEscape { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_out_of_package_rejected() {
        let (tmp, pkg) = package_with(&[]);
        std::fs::write(tmp.path().join("outside.md"), "outside").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("outside.md"), pkg.root().join("link.md"))
            .unwrap();

        let err = resolve_resource(&pkg, "link.md").unwrap_err();
        assert!(matches!(err, SkillError::PathEscape { .. }));
    }

    #[test]
    fn missing_resource() {
        let (_tmp, pkg) = package_with(&[]);
        let err = resolve_resource(&pkg, "nonexistent.txt").unwrap_err();
        assert!(matches!(err, SkillError::ResourceNotFound { .. }));
    }

    #[test]
    fn directory_is_not_a_resource() {
        let (_tmp, pkg) = package_with(&[("references/a.md", "a")]);
        let err = resolve_resource(&pkg, "references").unwrap_err();
        assert!(matches!(err, SkillError::ResourceNotFound { .. }));
    }

    #[test]
    fn resource_added_after_discovery_is_resolvable() {
        let (_tmp, pkg) = package_with(&[]);
        std::fs::write(pkg.root().join("late.md"), "late").unwrap();
        assert!(!pkg.has_resource("late.md"));
        assert_eq!(resolve_resource(&pkg, "late.md").unwrap(), b"late");
    }

    #[test]
    fn size_ceiling() {
        let (_tmp, pkg) = package_with(&[("assets/big.bin", "0123456789")]);
        let err = resolve_resource_capped(&pkg, "assets/big.bin", 4).unwrap_err();
        assert!(matches!(
            err,
            SkillError::ResourceTooLarge {
                size: 10,
                limit: 4,
                ..
            }
        ));
    }

    #[test]
    fn resource_key_normalizes() {
        let (_tmp, pkg) = package_with(&[]);
        assert_eq!(
            resource_key(&pkg, "./references/../references/a.md").unwrap(),
            "references/a.md"
        );
        assert!(resource_key(&pkg, "../x").is_err());
    }
}
