use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path_utils::lowercase_extension;

use super::Context;
use super::list_dir::base_name;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetFileInfoRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
    pub size: u64,
    #[serde(default)]
    pub extension: Option<String>,
    /// Milliseconds since the Unix epoch; `None` where the platform keeps no birth time.
    #[serde(default)]
    pub created_ms: Option<u64>,
    #[serde(default)]
    pub modified_ms: Option<u64>,
    #[serde(default)]
    pub accessed_ms: Option<u64>,
}

fn system_time_to_millis(value: std::time::SystemTime) -> Option<u64> {
    value
        .duration_since(std::time::UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
}

fn metadata_time_to_millis(
    path: &Path,
    op: &'static str,
    value: std::io::Result<std::time::SystemTime>,
) -> Result<Option<u64>> {
    match value {
        Ok(time) => Ok(system_time_to_millis(time)),
        Err(err) if err.kind() == ErrorKind::Unsupported => Ok(None),
        Err(err) => Err(Error::io_path(op, path, err)),
    }
}

pub fn get_file_info(ctx: &Context, request: GetFileInfoRequest) -> Result<FileInfo> {
    tracing::debug!(path = %request.path.display(), "get_file_info");
    let path = ctx.validate_path(&request.path)?;
    let meta = fs::metadata(&path).map_err(|err| Error::io_path("metadata", &path, err))?;

    let name = base_name(&path);
    let is_directory = meta.is_dir();
    let extension = if is_directory {
        None
    } else {
        lowercase_extension(Path::new(&name))
    };

    Ok(FileInfo {
        created_ms: metadata_time_to_millis(&path, "metadata.created", meta.created())?,
        modified_ms: metadata_time_to_millis(&path, "metadata.modified", meta.modified())?,
        accessed_ms: metadata_time_to_millis(&path, "metadata.accessed", meta.accessed())?,
        name,
        path,
        is_directory,
        size: meta.len(),
        extension,
    })
}
