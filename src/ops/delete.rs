use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteKind {
    File,
    Directory,
    Symlink,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileResponse {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: DeleteKind,
}

fn unlink_symlink(target: &Path) -> std::io::Result<()> {
    #[cfg(windows)]
    {
        match fs::remove_file(target) {
            Ok(()) => Ok(()),
            // Directory symlinks and junctions need remove_dir on Windows.
            Err(remove_file_err) => fs::remove_dir(target).map_err(|_| remove_file_err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::remove_file(target)
    }
}

fn remove_empty_dir(path: &Path) -> Result<()> {
    match fs::remove_dir(path) {
        Ok(()) => Ok(()),
        Err(err)
            if err.kind() == std::io::ErrorKind::DirectoryNotEmpty
                || (err.kind() != std::io::ErrorKind::PermissionDenied
                    && super::io::dir_has_entries(path)) =>
        {
            Err(Error::DirectoryNotEmpty(path.to_path_buf()))
        }
        Err(err) => Err(Error::io_path("remove_dir", path, err)),
    }
}

/// Delete a file, a symlink, or an empty directory.
pub fn delete_file(ctx: &Context, request: DeleteFileRequest) -> Result<DeleteFileResponse> {
    tracing::debug!(path = %request.path.display(), "delete_file");
    let path = ctx.validate_path(&request.path)?;

    let meta =
        fs::symlink_metadata(&path).map_err(|err| Error::io_path("metadata", &path, err))?;
    let kind = if meta.file_type().is_symlink() {
        unlink_symlink(&path).map_err(|err| Error::io_path("remove_symlink", &path, err))?;
        DeleteKind::Symlink
    } else if meta.is_dir() {
        remove_empty_dir(&path)?;
        DeleteKind::Directory
    } else {
        fs::remove_file(&path).map_err(|err| Error::io_path("remove_file", &path, err))?;
        DeleteKind::File
    };

    tracing::info!(path = %path.display(), kind = ?kind, "deleted path");
    Ok(DeleteFileResponse { path, kind })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDirectoryRequest {
    pub path: PathBuf,
    /// Without confirmation the call only validates and reports what it would delete.
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDirectoryResponse {
    pub path: PathBuf,
    pub deleted: bool,
    pub dry_run: bool,
    /// Entries removed, the directory itself included. Zero for a dry run.
    pub entries_removed: u64,
}

/// Delete a directory and everything beneath it.
///
/// Refuses to remove an allowed root. The directory itself must not be a symlink, and
/// symlinks inside it are unlinked rather than followed.
pub fn delete_directory_recursive(
    ctx: &Context,
    request: DeleteDirectoryRequest,
) -> Result<DeleteDirectoryResponse> {
    tracing::debug!(
        path = %request.path.display(),
        confirm = request.confirm,
        "delete_directory_recursive"
    );
    let path = ctx.validate_path(&request.path)?;

    let meta =
        fs::symlink_metadata(&path).map_err(|err| Error::io_path("metadata", &path, err))?;
    if !meta.is_dir() {
        return Err(Error::NotADirectory(path));
    }
    if ctx.is_root(&path) {
        tracing::warn!(path = %path.display(), "refusing to delete an allowed root");
        return Err(Error::PermissionDenied(path));
    }
    if !request.confirm {
        return Ok(DeleteDirectoryResponse {
            path,
            deleted: false,
            dry_run: true,
            entries_removed: 0,
        });
    }

    let entries_removed = remove_tree(ctx, &path)?;
    tracing::info!(path = %path.display(), entries_removed, "deleted directory tree");
    Ok(DeleteDirectoryResponse {
        path,
        deleted: true,
        dry_run: false,
        entries_removed,
    })
}

/// Remove `dir` bottom-up, re-validating every entry before it is unlinked.
pub(super) fn remove_tree(ctx: &Context, dir: &Path) -> Result<u64> {
    let mut removed: u64 = 0;
    for entry in WalkDir::new(dir).follow_links(false).contents_first(true) {
        ctx.check_cancelled("delete_directory_recursive")?;
        let entry = entry.map_err(super::io::walk_error)?;
        let path = ctx.validate_path(entry.path())?;
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            unlink_symlink(&path).map_err(|err| Error::io_path("remove_symlink", &path, err))?;
        } else if file_type.is_dir() {
            remove_empty_dir(&path)?;
        } else {
            fs::remove_file(&path).map_err(|err| Error::io_path("remove_file", &path, err))?;
        }
        removed += 1;
    }
    Ok(removed)
}
