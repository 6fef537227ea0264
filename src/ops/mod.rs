use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::config::Limits;
use crate::roots::AllowedRoots;

mod context;
mod copy_file;
mod delete;
mod edit;
mod io;
mod list_dir;
mod mkdir;
mod move_path;
mod read;
mod search;
mod stat;
mod write;

pub use copy_file::{CopyFileRequest, CopyFileResponse, copy_file};
pub use delete::{
    DeleteDirectoryRequest, DeleteDirectoryResponse, DeleteFileRequest, DeleteFileResponse,
    DeleteKind, delete_directory_recursive, delete_file,
};
pub use edit::{
    EditAction, EditContent, EditFileRequest, EditFileResponse, EditOperation, edit_file,
};
pub use list_dir::{FileEntry, ListDirectoryRequest, ListDirectoryResponse, list_directory};
pub use mkdir::{CreateDirectoryRequest, CreateDirectoryResponse, create_directory};
pub use move_path::{MoveFileRequest, MoveFileResponse, move_file};
pub use read::{
    ReadFileRequest, ReadFileResponse, ReadMultipleFilesRequest, ReadMultipleFilesResponse,
    read_file, read_multiple_files,
};
pub use search::{SearchRequest, SearchResponse, search_files};
pub use stat::{FileInfo, GetFileInfoRequest, get_file_info};
pub use write::{WriteFileRequest, WriteFileResponse, write_file};


/// Confined filesystem engine: every operation validates its paths against the allowed roots
/// before touching the filesystem.
pub struct Context {
    roots: AllowedRoots,
    limits: Limits,
    cancel: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("roots", &self.roots.as_slice())
            .field("limits", &self.limits)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}
