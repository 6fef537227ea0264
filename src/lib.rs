//! `sandbox-fs-tools` provides filesystem operations confined to an allow-list of directories.
//!
//! Every path a caller supplies is normalized lexically and checked against the configured
//! roots before any filesystem access. Operations take serde request structs and return serde
//! response structs so a remote dispatch layer can map JSON arguments straight onto them.

pub mod config;
#[cfg(feature = "config-io")]
pub mod config_io;
mod error;
pub mod ops;
mod path_utils;
mod platform;
pub mod roots;

pub use config::{Limits, SandboxConfig};
#[cfg(feature = "config-io")]
pub use config_io::{ConfigFormat, discover_config, load_config, parse_config};
pub use error::{Error, Result};
pub use roots::AllowedRoots;

pub use ops::{
    Context, CopyFileRequest, CopyFileResponse, CreateDirectoryRequest, CreateDirectoryResponse,
    DeleteDirectoryRequest, DeleteDirectoryResponse, DeleteFileRequest, DeleteFileResponse,
    DeleteKind, EditAction, EditContent, EditFileRequest, EditFileResponse, EditOperation, FileEntry,
    FileInfo, GetFileInfoRequest, ListDirectoryRequest, ListDirectoryResponse, MoveFileRequest,
    MoveFileResponse, ReadFileRequest, ReadFileResponse, ReadMultipleFilesRequest,
    ReadMultipleFilesResponse, SearchRequest, SearchResponse, WriteFileRequest,
    WriteFileResponse, copy_file, create_directory, delete_directory_recursive, delete_file,
    edit_file, get_file_info, list_directory, move_file, read_file, read_multiple_files,
    search_files, write_file,
};
