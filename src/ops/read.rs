use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadFileRequest {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadFileResponse {
    pub path: PathBuf,
    pub bytes_read: u64,
    pub content: String,
}

pub fn read_file(ctx: &Context, request: ReadFileRequest) -> Result<ReadFileResponse> {
    tracing::debug!(path = %request.path.display(), "read_file");
    let path = ctx.validate_path(&request.path)?;
    let content = super::io::read_text(&path, None)?;
    Ok(ReadFileResponse {
        path,
        bytes_read: content.len() as u64,
        content,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadMultipleFilesRequest {
    pub paths: Vec<PathBuf>,
    /// Overrides the context's `limits.max_size_per_file` for this call.
    #[serde(default)]
    pub max_size_per_file: Option<u64>,
    /// Overrides the context's `limits.max_total_size` for this call.
    #[serde(default)]
    pub max_total_size: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadMultipleFilesResponse {
    /// Keyed by the paths exactly as requested.
    pub files: BTreeMap<PathBuf, String>,
    pub total_bytes: u64,
}

/// Read several files as one all-or-nothing batch.
///
/// Every path is validated and every size checked against the limits before any content is
/// read, so a batch that would exceed a limit reads nothing.
pub fn read_multiple_files(
    ctx: &Context,
    request: ReadMultipleFilesRequest,
) -> Result<ReadMultipleFilesResponse> {
    tracing::debug!(count = request.paths.len(), "read_multiple_files");
    if request.paths.is_empty() {
        return Ok(ReadMultipleFilesResponse::default());
    }

    let max_per_file = request
        .max_size_per_file
        .or(ctx.limits().max_size_per_file);
    let max_total = request.max_total_size.or(ctx.limits().max_total_size);

    let validated = request
        .paths
        .iter()
        .map(|requested| Ok((requested, ctx.validate_path(requested)?)))
        .collect::<Result<Vec<_>>>()?;

    let mut total_size: u64 = 0;
    for (_, path) in &validated {
        let meta = fs::metadata(path).map_err(|err| Error::io_path("metadata", path, err))?;
        if !meta.is_file() {
            return Err(Error::NotFound(path.clone()));
        }
        let size = meta.len();
        if let Some(max) = max_per_file
            && size > max
        {
            return Err(Error::LimitExceeded {
                subject: format!("file {}", path.display()),
                size_bytes: size,
                max_bytes: max,
            });
        }
        total_size = total_size.saturating_add(size);
    }
    if let Some(max) = max_total
        && total_size > max
    {
        return Err(Error::LimitExceeded {
            subject: "total size of requested files".to_string(),
            size_bytes: total_size,
            max_bytes: max,
        });
    }

    let mut files = BTreeMap::<PathBuf, String>::new();
    let mut total_bytes: u64 = 0;
    for (requested, path) in validated {
        ctx.check_cancelled("read_multiple_files")?;
        let content = super::io::read_text(&path, max_per_file)?;
        total_bytes = total_bytes.saturating_add(content.len() as u64);
        if let Some(max) = max_total
            && total_bytes > max
        {
            return Err(Error::LimitExceeded {
                subject: "total size of requested files".to_string(),
                size_bytes: total_bytes,
                max_bytes: max,
            });
        }
        files.insert(requested.clone(), content);
    }
    Ok(ReadMultipleFilesResponse { files, total_bytes })
}
