//! Path utilities used by root containment checks and entry construction.
//!
//! This module is intentionally **lexical**: it does not touch the filesystem and therefore does
//! not resolve symlinks.
//!
//! Invariants of `normalize_path_lexical`:
//! - Removes `.` segments.
//! - Resolves `..` against preceding *normal* segments when possible.
//! - Preserves leading `..` for relative paths (e.g. `../../a/../b` → `../../b`).
//! - For absolute paths, `..` cannot escape the filesystem root (e.g. `/../etc` → `/etc`).
//! - On Windows, preserves path prefixes (Disk/UNC/verbatim).
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

pub(crate) fn normalize_path_lexical(path: &Path) -> PathBuf {
    #[derive(Debug)]
    enum Segment {
        ParentDir,
        Normal(OsString),
    }

    let mut path_prefix: Option<OsString> = None;
    let mut has_root = false;
    let mut segments: Vec<Segment> = Vec::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(segments.last(), Some(Segment::Normal(_))) {
                    segments.pop();
                } else if !has_root {
                    segments.push(Segment::ParentDir);
                }
            }
            Component::Normal(part) => segments.push(Segment::Normal(part.to_os_string())),
            Component::RootDir => {
                has_root = true;
            }
            Component::Prefix(prefix_comp) => {
                path_prefix = Some(prefix_comp.as_os_str().to_os_string());
            }
        }
    }

    let mut out = PathBuf::new();
    if let Some(prefix) = path_prefix {
        out.push(Path::new(&prefix));
    }
    if has_root {
        if out.as_os_str().is_empty() {
            #[cfg(windows)]
            out.push("\\");
            #[cfg(not(windows))]
            out.push("/");
        } else {
            // Pushing `RootDir` after `Prefix` would drop the prefix on Windows.
            out.as_mut_os_string()
                .push(std::path::MAIN_SEPARATOR.to_string());
        }
    }
    for segment in segments {
        match segment {
            Segment::ParentDir => out.push(".."),
            Segment::Normal(part) => out.push(part),
        }
    }

    if out.as_os_str().is_empty() && path.is_relative() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Resolve `path` against `base` when relative, then normalize lexically.
pub(crate) fn absolutize_lexical(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path_lexical(path)
    } else {
        normalize_path_lexical(&base.join(path))
    }
}

#[cfg(windows)]
fn components_eq(a: Component<'_>, b: Component<'_>) -> bool {
    a.as_os_str()
        .to_string_lossy()
        .to_lowercase()
        .eq(&b.as_os_str().to_string_lossy().to_lowercase())
}

#[cfg(not(windows))]
fn components_eq(a: Component<'_>, b: Component<'_>) -> bool {
    a == b
}

/// Whether `path` equals `root` or lies beneath it, compared segment by segment.
///
/// Both inputs must already be normalized. `/sandbox2` is *not* within `/sandbox`.
/// Comparison is case-insensitive on Windows only.
pub(crate) fn path_within(path: &Path, root: &Path) -> bool {
    let mut path_components = path.components();
    for root_comp in root.components() {
        match path_components.next() {
            Some(path_comp) if components_eq(path_comp, root_comp) => {}
            _ => return false,
        }
    }
    true
}

/// Whether two normalized paths name the same location.
pub(crate) fn same_path(a: &Path, b: &Path) -> bool {
    path_within(a, b) && path_within(b, a)
}

/// Lowercase extension of a base name, `None` when the name has none.
///
/// Leading-dot names such as `.bashrc` have no extension.
pub(crate) fn lowercase_extension(name: &Path) -> Option<String> {
    name.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
}
