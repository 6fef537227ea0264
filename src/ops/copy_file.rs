use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::path_utils::path_within;

use super::Context;
use super::list_dir::base_name;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFileRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFileResponse {
    pub source: PathBuf,
    /// Where the copy landed; differs from the requested destination when that was an
    /// existing directory.
    pub destination: PathBuf,
    #[serde(rename = "type")]
    pub kind: String,
    pub files_copied: u64,
    /// Files left alone because they already existed and `overwrite` was off.
    pub files_skipped: u64,
    pub bytes: u64,
}

#[derive(Debug, Default, Clone, Copy)]
pub(super) struct CopyStats {
    pub(super) files_copied: u64,
    pub(super) files_skipped: u64,
    pub(super) bytes: u64,
}

/// Copy a file or directory tree.
///
/// An existing directory destination receives the source under its own base name, and that
/// inner target follows the same `overwrite` rule as the destination itself. With `overwrite`
/// set, a directory source merges into an existing inner directory.
pub fn copy_file(ctx: &Context, request: CopyFileRequest) -> Result<CopyFileResponse> {
    tracing::debug!(
        source = %request.source.display(),
        destination = %request.destination.display(),
        overwrite = request.overwrite,
        "copy_file"
    );
    let source = ctx.validate_path(&request.source)?;
    let destination = ctx.validate_path(&request.destination)?;

    let source_meta =
        fs::metadata(&source).map_err(|err| Error::io_path("metadata", &source, err))?;
    let target = match fs::metadata(&destination) {
        Ok(meta) if meta.is_dir() => {
            let target = ctx.validate_path(&destination.join(base_name(&source)))?;
            if !request.overwrite && fs::symlink_metadata(&target).is_ok() {
                return Err(Error::AlreadyExists(target));
            }
            target
        }
        Ok(_) if !request.overwrite => return Err(Error::AlreadyExists(destination)),
        Ok(_) if source_meta.is_dir() => return Err(Error::NotADirectory(destination)),
        Ok(_) => destination,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => destination,
        Err(err) => return Err(Error::io_path("metadata", &destination, err)),
    };

    if source_meta.is_dir() {
        if path_within(&target, &source) {
            return Err(Error::InvalidOperation(format!(
                "cannot copy {} into its own subtree",
                source.display()
            )));
        }
        let stats = copy_tree(ctx, &source, &target, request.overwrite)?;
        tracing::info!(
            source = %source.display(),
            destination = %target.display(),
            files_copied = stats.files_copied,
            files_skipped = stats.files_skipped,
            "copied directory"
        );
        return Ok(CopyFileResponse {
            source,
            destination: target,
            kind: "directory".to_string(),
            files_copied: stats.files_copied,
            files_skipped: stats.files_skipped,
            bytes: stats.bytes,
        });
    }

    if source == target {
        return Ok(CopyFileResponse {
            source,
            destination: target,
            kind: "file".to_string(),
            files_copied: 0,
            files_skipped: 1,
            bytes: 0,
        });
    }

    ctx.ensure_parent_dir(&target)?;
    let bytes = super::io::copy_file_atomic(&source, &target, request.overwrite)?;
    tracing::info!(
        source = %source.display(),
        destination = %target.display(),
        bytes,
        "copied file"
    );
    Ok(CopyFileResponse {
        source,
        destination: target,
        kind: "file".to_string(),
        files_copied: 1,
        files_skipped: 0,
        bytes,
    })
}

/// Recreate the tree under `source` at `target`, validating every path on both sides.
///
/// Symlinks inside the tree are not followed: one that resolves to a regular file is copied
/// by content, anything else is skipped.
pub(super) fn copy_tree(
    ctx: &Context,
    source: &Path,
    target: &Path,
    overwrite: bool,
) -> Result<CopyStats> {
    let mut stats = CopyStats::default();
    for entry in WalkDir::new(source).follow_links(false).sort_by_file_name() {
        ctx.check_cancelled("copy_file")?;
        let entry = entry.map_err(super::io::walk_error)?;
        let src_item = ctx.validate_path(entry.path())?;
        let relative = src_item.strip_prefix(source).map_err(|_| {
            Error::InvalidOperation(format!(
                "{} escaped the copy source {}",
                src_item.display(),
                source.display()
            ))
        })?;
        let dst_item = ctx.validate_path(&target.join(relative))?;

        let file_type = entry.file_type();
        if file_type.is_dir() {
            match fs::metadata(&dst_item) {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => return Err(Error::NotADirectory(dst_item)),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    fs::create_dir_all(&dst_item)
                        .map_err(|err| Error::io_path("create_dir_all", &dst_item, err))?;
                }
                Err(err) => return Err(Error::io_path("metadata", &dst_item, err)),
            }
            continue;
        }
        if file_type.is_symlink() && !src_item.is_file() {
            tracing::warn!(path = %src_item.display(), "skipping symlink that is not a regular file");
            stats.files_skipped += 1;
            continue;
        }

        if !overwrite && fs::symlink_metadata(&dst_item).is_ok() {
            tracing::debug!(path = %dst_item.display(), "destination exists; skipping");
            stats.files_skipped += 1;
            continue;
        }
        match super::io::copy_file_atomic(&src_item, &dst_item, overwrite) {
            Ok(bytes) => {
                stats.files_copied += 1;
                stats.bytes = stats.bytes.saturating_add(bytes);
            }
            Err(Error::AlreadyExists(_)) => stats.files_skipped += 1,
            Err(err) => return Err(err),
        }
    }
    Ok(stats)
}
