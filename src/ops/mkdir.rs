use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDirectoryRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDirectoryResponse {
    pub path: PathBuf,
    pub created: bool,
}

/// Create a directory and any missing ancestors.
///
/// Fails with [`Error::AlreadyExists`] when anything (file, directory or symlink) already
/// occupies the path.
pub fn create_directory(
    ctx: &Context,
    request: CreateDirectoryRequest,
) -> Result<CreateDirectoryResponse> {
    tracing::debug!(path = %request.path.display(), "create_directory");
    let path = ctx.validate_path(&request.path)?;

    match fs::symlink_metadata(&path) {
        Ok(_) => return Err(Error::AlreadyExists(path)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(Error::io_path("symlink_metadata", &path, err)),
    }

    fs::create_dir_all(&path).map_err(|err| Error::io_path("create_dir_all", &path, err))?;
    tracing::info!(path = %path.display(), "created directory");
    Ok(CreateDirectoryResponse {
        path,
        created: true,
    })
}
