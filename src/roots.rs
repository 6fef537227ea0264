use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path_utils::{absolutize_lexical, path_within, same_path};

/// The ordered set of directories every operation is confined to.
///
/// Roots are stored absolute and lexically normalized. Containment is a segment-wise prefix
/// check on normalized paths; symlinks are not resolved, so a link inside a root that points
/// elsewhere is followed by the OS like any other path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRoots {
    roots: Vec<PathBuf>,
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|err| Error::io_path("current_dir", ".", err))
}

impl AllowedRoots {
    /// Build from configured directories, resolving relative entries against the working
    /// directory.
    pub fn new<I, P>(dirs: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::with_base(dirs, &current_dir()?)
    }

    /// Build from configured directories, resolving relative entries against `base`.
    pub fn with_base<I, P>(dirs: I, base: &Path) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut roots = Vec::<PathBuf>::new();
        for dir in dirs {
            let dir = dir.as_ref();
            if dir.as_os_str().is_empty() {
                return Err(Error::InvalidConfig(
                    "allowed directory entry is empty".to_string(),
                ));
            }
            let normalized = absolutize_lexical(dir, base);
            if !roots.iter().any(|root| same_path(root, &normalized)) {
                roots.push(normalized);
            }
        }
        if roots.is_empty() {
            return Err(Error::InvalidConfig(
                "allowed_directories is empty".to_string(),
            ));
        }
        Ok(Self { roots })
    }

    /// The working directory as the sole root.
    pub fn current_dir() -> Result<Self> {
        let cwd = current_dir()?;
        Self::with_base([cwd.as_path()], &cwd)
    }

    /// Normalize `path` and check that it lies inside one of the roots.
    ///
    /// Relative inputs are resolved against the working directory at call time.
    pub fn validate(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            return self.validate_normalized(path, absolutize_lexical(path, Path::new("")));
        }
        let normalized = absolutize_lexical(path, &current_dir()?);
        self.validate_normalized(path, normalized)
    }

    fn validate_normalized(&self, requested: &Path, normalized: PathBuf) -> Result<PathBuf> {
        if self.contains(&normalized) {
            return Ok(normalized);
        }
        tracing::warn!(
            path = %requested.display(),
            "rejected path outside allowed directories"
        );
        Err(Error::AccessDenied(requested.to_path_buf()))
    }

    /// Whether an already-normalized absolute path lies inside a root.
    pub fn contains(&self, normalized: &Path) -> bool {
        self.roots.iter().any(|root| path_within(normalized, root))
    }

    /// Whether an already-normalized absolute path is exactly one of the roots.
    pub fn is_root(&self, normalized: &Path) -> bool {
        self.roots.iter().any(|root| same_path(root, normalized))
    }

    pub fn as_slice(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.roots.iter()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl<'a> IntoIterator for &'a AllowedRoots {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.roots.iter()
    }
}
