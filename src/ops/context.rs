use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::{Limits, SandboxConfig};
use crate::error::{Error, Result};
use crate::roots::AllowedRoots;

use super::{
    Context, CopyFileRequest, CopyFileResponse, CreateDirectoryRequest, CreateDirectoryResponse,
    DeleteDirectoryRequest, DeleteDirectoryResponse, DeleteFileRequest, DeleteFileResponse,
    EditFileRequest, EditFileResponse, FileInfo, GetFileInfoRequest, ListDirectoryRequest,
    ListDirectoryResponse, MoveFileRequest, MoveFileResponse, ReadFileRequest, ReadFileResponse,
    ReadMultipleFilesRequest, ReadMultipleFilesResponse, SearchRequest, SearchResponse,
    WriteFileRequest, WriteFileResponse,
};

impl Context {
    pub fn new(config: SandboxConfig) -> Result<Self> {
        let roots = config.allowed_roots()?;
        Ok(Self::with_roots(roots, config.limits))
    }

    pub fn with_roots(roots: AllowedRoots, limits: Limits) -> Self {
        tracing::debug!(roots = ?roots.as_slice(), "filesystem context ready");
        Self {
            roots,
            limits,
            cancel: None,
        }
    }

    #[cfg(feature = "config-io")]
    pub fn from_config_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = crate::config_io::load_config(path)?;
        Self::new(config)
    }

    /// Attach a flag that long-running operations poll between files and directories.
    ///
    /// Setting it makes the in-flight operation stop with [`Error::Cancelled`]. Work already
    /// done (files copied, entries deleted) is not rolled back.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn allowed_roots(&self) -> &AllowedRoots {
        &self.roots
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The configured roots, in configuration order.
    pub fn list_allowed_directories(&self) -> Vec<PathBuf> {
        self.roots.as_slice().to_vec()
    }

    pub fn read_file(&self, request: ReadFileRequest) -> Result<ReadFileResponse> {
        super::read_file(self, request)
    }

    pub fn read_multiple_files(
        &self,
        request: ReadMultipleFilesRequest,
    ) -> Result<ReadMultipleFilesResponse> {
        super::read_multiple_files(self, request)
    }

    pub fn write_file(&self, request: WriteFileRequest) -> Result<WriteFileResponse> {
        super::write_file(self, request)
    }

    pub fn list_directory(&self, request: ListDirectoryRequest) -> Result<ListDirectoryResponse> {
        super::list_directory(self, request)
    }

    pub fn get_file_info(&self, request: GetFileInfoRequest) -> Result<FileInfo> {
        super::get_file_info(self, request)
    }

    pub fn create_directory(
        &self,
        request: CreateDirectoryRequest,
    ) -> Result<CreateDirectoryResponse> {
        super::create_directory(self, request)
    }

    pub fn search_files(&self, request: SearchRequest) -> Result<SearchResponse> {
        super::search_files(self, request)
    }

    pub fn move_file(&self, request: MoveFileRequest) -> Result<MoveFileResponse> {
        super::move_file(self, request)
    }

    pub fn copy_file(&self, request: CopyFileRequest) -> Result<CopyFileResponse> {
        super::copy_file(self, request)
    }

    pub fn delete_file(&self, request: DeleteFileRequest) -> Result<DeleteFileResponse> {
        super::delete_file(self, request)
    }

    pub fn delete_directory_recursive(
        &self,
        request: DeleteDirectoryRequest,
    ) -> Result<DeleteDirectoryResponse> {
        super::delete_directory_recursive(self, request)
    }

    pub fn edit_file(&self, request: EditFileRequest) -> Result<EditFileResponse> {
        super::edit_file(self, request)
    }

    pub(super) fn validate_path(&self, path: &Path) -> Result<PathBuf> {
        self.roots.validate(path)
    }

    pub(super) fn is_root(&self, normalized: &Path) -> bool {
        self.roots.is_root(normalized)
    }

    pub(super) fn check_cancelled(&self, op: &'static str) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => {
                tracing::info!(op, "operation cancelled");
                Err(Error::Cancelled(op))
            }
            _ => Ok(()),
        }
    }

    /// Create the parent directories of a validated path.
    ///
    /// The parent is validated too, so a destination sitting exactly on a root never creates
    /// directories outside it.
    pub(super) fn ensure_parent_dir(&self, path: &Path) -> Result<()> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };
        if parent.is_dir() {
            return Ok(());
        }
        let parent = self.validate_path(parent)?;
        fs::create_dir_all(&parent).map_err(|err| Error::io_path("create_dir_all", &parent, err))
    }
}
