use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use sandbox_fs_tools::ops::{
    Context, CopyFileRequest, CreateDirectoryRequest, DeleteDirectoryRequest, DeleteFileRequest,
    EditFileRequest, EditOperation, GetFileInfoRequest, ListDirectoryRequest, MoveFileRequest,
    ReadFileRequest, ReadMultipleFilesRequest, SearchRequest, WriteFileRequest,
};
use sandbox_fs_tools::{SandboxConfig, discover_config, load_config};

#[derive(Debug)]
enum CliError {
    Tool(sandbox_fs_tools::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Tool(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Tool(err) => Some(err),
            CliError::Json(err) => Some(err),
        }
    }
}

impl From<sandbox_fs_tools::Error> for CliError {
    fn from(err: sandbox_fs_tools::Error) -> Self {
        Self::Tool(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Tool(err.into())
    }
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            CliError::Tool(err) => err.code(),
            CliError::Json(_) => "json",
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "sandbox-fs-tools")]
#[command(about = "Filesystem operations confined to an allow-list of directories.")]
struct Cli {
    /// Configuration file (JSON or TOML). Defaults to filesystem_config.{json,toml} in the
    /// working directory when present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Allowed directory; repeatable. Overrides the configuration file's list.
    #[arg(long = "allow")]
    allow: Vec<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Read {
        path: PathBuf,
    },
    ReadMany {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long)]
        max_size_per_file: Option<u64>,
        #[arg(long)]
        max_total_size: Option<u64>,
    },
    /// Write the content of CONTENT_FILE (`-` for stdin) to PATH.
    Write {
        path: PathBuf,
        content_file: PathBuf,
    },
    List {
        path: PathBuf,
    },
    Info {
        path: PathBuf,
    },
    Mkdir {
        path: PathBuf,
    },
    Search {
        directory: PathBuf,
        pattern: String,
        #[arg(long, default_value_t = false)]
        regex: bool,
        #[arg(long, default_value_t = false)]
        no_recursive: bool,
    },
    Move {
        source: PathBuf,
        destination: PathBuf,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    Copy {
        source: PathBuf,
        destination: PathBuf,
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    Delete {
        path: PathBuf,
    },
    /// Delete a directory tree. Without --confirm this is a dry run.
    DeleteTree {
        path: PathBuf,
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
    /// Apply a JSON array of edit operations read from OPS_FILE (`-` for stdin).
    Edit {
        path: PathBuf,
        ops_file: PathBuf,
    },
    /// Print the allowed directories.
    Allowed,
}

fn main() {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    if let Err(err) = run() {
        let body = serde_json::json!({
            "error": {
                "code": err.code(),
                "message": err.to_string(),
            }
        });
        eprintln!("{body}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(), cli.allow)?;
    let ctx = Context::new(config)?;

    let value = match cli.command {
        Command::Read { path } => serde_json::to_value(ctx.read_file(ReadFileRequest { path })?)?,
        Command::ReadMany {
            paths,
            max_size_per_file,
            max_total_size,
        } => serde_json::to_value(ctx.read_multiple_files(ReadMultipleFilesRequest {
            paths,
            max_size_per_file,
            max_total_size,
        })?)?,
        Command::Write { path, content_file } => {
            serde_json::to_value(ctx.write_file(WriteFileRequest {
                path,
                content: load_text(&content_file)?,
            })?)?
        }
        Command::List { path } => {
            serde_json::to_value(ctx.list_directory(ListDirectoryRequest { path })?)?
        }
        Command::Info { path } => {
            serde_json::to_value(ctx.get_file_info(GetFileInfoRequest { path })?)?
        }
        Command::Mkdir { path } => {
            serde_json::to_value(ctx.create_directory(CreateDirectoryRequest { path })?)?
        }
        Command::Search {
            directory,
            pattern,
            regex,
            no_recursive,
        } => serde_json::to_value(ctx.search_files(SearchRequest {
            directory,
            pattern,
            recursive: !no_recursive,
            use_regex: regex,
        })?)?,
        Command::Move {
            source,
            destination,
            overwrite,
        } => serde_json::to_value(ctx.move_file(MoveFileRequest {
            source,
            destination,
            overwrite,
        })?)?,
        Command::Copy {
            source,
            destination,
            overwrite,
        } => serde_json::to_value(ctx.copy_file(CopyFileRequest {
            source,
            destination,
            overwrite,
        })?)?,
        Command::Delete { path } => {
            serde_json::to_value(ctx.delete_file(DeleteFileRequest { path })?)?
        }
        Command::DeleteTree { path, confirm } => serde_json::to_value(
            ctx.delete_directory_recursive(DeleteDirectoryRequest { path, confirm })?,
        )?,
        Command::Edit { path, ops_file } => {
            let operations: Vec<EditOperation> = serde_json::from_str(&load_text(&ops_file)?)?;
            serde_json::to_value(ctx.edit_file(EditFileRequest { path, operations })?)?
        }
        Command::Allowed => serde_json::to_value(ctx.list_allowed_directories())?,
    };

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn resolve_config(path: Option<&Path>, allow: Vec<PathBuf>) -> Result<SandboxConfig, CliError> {
    let discovered = match path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(std::env::current_dir()?),
    };
    let mut config = match discovered {
        Some(path) => load_config(&path)?,
        None => SandboxConfig::default(),
    };
    if !allow.is_empty() {
        config.allowed_directories = Some(allow);
    }
    Ok(config)
}

fn load_text(path: &Path) -> Result<String, CliError> {
    if path.as_os_str() == "-" {
        let mut out = String::new();
        std::io::stdin().read_to_string(&mut out)?;
        return Ok(out);
    }
    Ok(std::fs::read_to_string(path)?)
}
