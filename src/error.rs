use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("io error during {op} ({path}): {source}")]
    IoPath {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("access denied: {} is not inside an allowed directory", .0.display())]
    AccessDenied(PathBuf),

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("directory is not empty: {}", .0.display())]
    DirectoryNotEmpty(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("{subject} exceeds the size limit ({size_bytes} bytes; max {max_bytes} bytes)")]
    LimitExceeded {
        subject: String,
        size_bytes: u64,
        max_bytes: u64,
    },

    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid edit operation: {0}")]
    InvalidOperation(String),

    #[error("line out of range: {0}")]
    OutOfRange(String),

    #[error("missing content: {0}")]
    MissingContent(String),

    #[error("invalid utf-8 in file: {}", .0.display())]
    InvalidUtf8(PathBuf),

    #[error("operation cancelled: {0}")]
    Cancelled(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Classify an OS error raised while `op` was acting on `path`.
    ///
    /// `NotFound` and `PermissionDenied` get their own kinds; everything else is kept as an
    /// [`Error::IoPath`] so the failing syscall stays visible to the caller.
    pub fn io_path(op: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::IoPath { op, path, source },
        }
    }

    pub(crate) fn invalid_pattern(pattern: &str, message: impl std::fmt::Display) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            message: message.to_string(),
        }
    }

    /// Stable, machine-readable error code for dispatch layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) | Self::IoPath { .. } => "io_failure",
            Self::InvalidConfig(_) => "invalid_config",
            Self::AccessDenied(_) => "access_denied",
            Self::NotFound(_) => "not_found",
            Self::NotADirectory(_) => "not_a_directory",
            Self::AlreadyExists(_) => "already_exists",
            Self::DirectoryNotEmpty(_) => "directory_not_empty",
            Self::PermissionDenied(_) => "permission_denied",
            Self::LimitExceeded { .. } => "limit_exceeded",
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::OutOfRange(_) => "out_of_range",
            Self::MissingContent(_) => "missing_content",
            Self::InvalidUtf8(_) => "invalid_utf8",
            Self::Cancelled(_) => "cancelled",
        }
    }
}
