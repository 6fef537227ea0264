use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path_utils::path_within;
use crate::platform::rename::rename_no_replace;

use super::Context;
use super::list_dir::base_name;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFileRequest {
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFileResponse {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// `false` when source and destination are the same path.
    pub moved: bool,
    #[serde(rename = "type")]
    pub kind: String,
    /// Set when the move crossed filesystems and was done as copy + delete.
    pub copied: bool,
}

fn rename(source: &Path, destination: &Path, overwrite: bool) -> std::io::Result<()> {
    if overwrite {
        return fs::rename(source, destination);
    }
    match rename_no_replace(source, destination) {
        Err(err) if err.kind() == std::io::ErrorKind::Unsupported => {
            if fs::symlink_metadata(destination).is_ok() {
                return Err(std::io::Error::from(std::io::ErrorKind::AlreadyExists));
            }
            fs::rename(source, destination)
        }
        other => other,
    }
}

/// Rename a file or directory.
///
/// With `overwrite` set, an existing directory destination receives the source under its own
/// base name; an existing directory is never replaced.
pub fn move_file(ctx: &Context, request: MoveFileRequest) -> Result<MoveFileResponse> {
    tracing::debug!(
        source = %request.source.display(),
        destination = %request.destination.display(),
        overwrite = request.overwrite,
        "move_file"
    );
    let source = ctx.validate_path(&request.source)?;
    let destination = ctx.validate_path(&request.destination)?;

    let meta =
        fs::symlink_metadata(&source).map_err(|err| Error::io_path("metadata", &source, err))?;
    let kind = if meta.file_type().is_symlink() {
        "symlink"
    } else if meta.is_dir() {
        "directory"
    } else {
        "file"
    };
    if ctx.is_root(&source) {
        return Err(Error::PermissionDenied(source));
    }

    let destination = match fs::symlink_metadata(&destination) {
        Ok(_) if !request.overwrite => return Err(Error::AlreadyExists(destination)),
        Ok(dest_meta) if dest_meta.is_dir() && source != destination => {
            let inner = ctx.validate_path(&destination.join(base_name(&source)))?;
            match fs::symlink_metadata(&inner) {
                Ok(inner_meta) if inner_meta.is_dir() && inner != source => {
                    return Err(Error::InvalidOperation(format!(
                        "destination {} is an existing directory; refusing to replace it",
                        inner.display()
                    )));
                }
                Ok(_) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(Error::io_path("metadata", &inner, err)),
            }
            inner
        }
        Ok(_) => destination,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => destination,
        Err(err) => return Err(Error::io_path("metadata", &destination, err)),
    };
    if source == destination {
        return Ok(MoveFileResponse {
            source,
            destination,
            moved: false,
            kind: kind.to_string(),
            copied: false,
        });
    }
    if meta.is_dir() && path_within(&destination, &source) {
        return Err(Error::InvalidOperation(format!(
            "cannot move {} into its own subtree",
            source.display()
        )));
    }

    ctx.ensure_parent_dir(&destination)?;

    let copied = match rename(&source, &destination, request.overwrite) {
        Ok(()) => false,
        Err(err) if super::io::is_cross_device(&err) => {
            tracing::debug!(
                source = %source.display(),
                destination = %destination.display(),
                "rename crossed devices; copying instead"
            );
            move_across_devices(ctx, &source, &destination, meta.is_dir(), request.overwrite)?;
            true
        }
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(Error::AlreadyExists(destination));
        }
        Err(err) => return Err(Error::io_path("rename", &destination, err)),
    };

    tracing::info!(
        source = %source.display(),
        destination = %destination.display(),
        copied,
        "moved path"
    );
    Ok(MoveFileResponse {
        source,
        destination,
        moved: true,
        kind: kind.to_string(),
        copied,
    })
}

/// Copy `source` to `destination` and then remove it.
///
/// The source is only removed once everything under it reached the destination.
pub(super) fn move_across_devices(
    ctx: &Context,
    source: &Path,
    destination: &Path,
    is_dir: bool,
    overwrite: bool,
) -> Result<()> {
    if !is_dir {
        super::io::copy_file_atomic(source, destination, overwrite)?;
        return fs::remove_file(source).map_err(|err| Error::io_path("remove_file", source, err));
    }
    let stats = super::copy_file::copy_tree(ctx, source, destination, overwrite)?;
    if stats.files_skipped > 0 {
        tracing::warn!(
            source = %source.display(),
            skipped = stats.files_skipped,
            "entries were not copied; keeping the source"
        );
        return Err(Error::InvalidOperation(format!(
            "{} of the entries under {} could not be copied to {}; source left in place",
            stats.files_skipped,
            source.display(),
            destination.display()
        )));
    }
    super::delete::remove_tree(ctx, source)?;
    Ok(())
}
