use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path_utils::lowercase_extension;

use super::Context;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    /// `None` for directories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default)]
    pub extension: Option<String>,
}

impl FileEntry {
    /// Describe `path`, following symlinks the way `stat` does.
    ///
    /// A dangling symlink is described by the link itself instead of failing the listing.
    pub(super) fn from_path(path: PathBuf) -> Result<Self> {
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => fs::symlink_metadata(&path)
                .map_err(|err| Error::io_path("symlink_metadata", &path, err))?,
            Err(err) => return Err(Error::io_path("metadata", &path, err)),
        };
        let name = base_name(&path);
        if meta.is_dir() {
            return Ok(Self {
                name,
                path,
                is_directory: true,
                size: None,
                extension: None,
            });
        }
        Ok(Self {
            extension: lowercase_extension(Path::new(&name)),
            name,
            path,
            is_directory: false,
            size: Some(meta.len()),
        })
    }
}

pub(super) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Direct children of `dir` as paths, sorted by name.
pub(super) fn sorted_children(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut rows = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    rows.sort_by_key(|entry| entry.file_name());
    Ok(rows.into_iter().map(|entry| entry.path()).collect())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDirectoryRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDirectoryResponse {
    pub path: PathBuf,
    pub entries: Vec<FileEntry>,
}

pub fn list_directory(
    ctx: &Context,
    request: ListDirectoryRequest,
) -> Result<ListDirectoryResponse> {
    tracing::debug!(path = %request.path.display(), "list_directory");
    let dir = ctx.validate_path(&request.path)?;
    if !dir.is_dir() {
        return Err(Error::NotADirectory(dir));
    }

    let entries = sorted_children(&dir)
        .map_err(|err| Error::io_path("read_dir", &dir, err))?
        .into_iter()
        .map(FileEntry::from_path)
        .collect::<Result<Vec<_>>>()?;

    Ok(ListDirectoryResponse { path: dir, entries })
}
