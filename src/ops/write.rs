use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFileRequest {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFileResponse {
    pub path: PathBuf,
    pub bytes_written: u64,
    /// `false` when an existing file was replaced.
    pub created: bool,
}

/// Create or fully replace a file with UTF-8 `content`, creating missing parent directories.
pub fn write_file(ctx: &Context, request: WriteFileRequest) -> Result<WriteFileResponse> {
    tracing::debug!(path = %request.path.display(), "write_file");
    let path = ctx.validate_path(&request.path)?;

    let created = match fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => {
            return Err(Error::io_path(
                "write",
                &path,
                std::io::Error::from(std::io::ErrorKind::IsADirectory),
            ));
        }
        Ok(_) => false,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => true,
        Err(err) => return Err(Error::io_path("metadata", &path, err)),
    };

    ctx.ensure_parent_dir(&path)?;
    super::io::write_bytes_atomic(&path, request.content.as_bytes())?;

    let bytes_written = request.content.len() as u64;
    tracing::info!(path = %path.display(), bytes = bytes_written, created, "wrote file");
    Ok(WriteFileResponse {
        path,
        bytes_written,
        created,
    })
}
