use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::{CONFIG_FILE_NAMES, SandboxConfig};
use crate::{Error, Result};

const DEFAULT_MAX_CONFIG_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

pub fn parse_config(raw: &str, format: ConfigFormat) -> Result<SandboxConfig> {
    let config: SandboxConfig = match format {
        ConfigFormat::Json => serde_json::from_str(raw)
            .map_err(|err| Error::InvalidConfig(format!("invalid json config: {err}")))?,
        ConfigFormat::Toml => toml::from_str(raw)
            .map_err(|err| Error::InvalidConfig(format!("invalid toml config: {err}")))?,
    };
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<SandboxConfig> {
    load_config_limited(path, DEFAULT_MAX_CONFIG_BYTES)
}

/// Load and validate a configuration file with a byte limit.
///
/// `.json` is parsed as JSON; `.toml` or no extension as TOML. Symlinks and non-regular
/// files are refused so a FIFO can't block startup.
pub fn load_config_limited(path: impl AsRef<Path>, max_bytes: u64) -> Result<SandboxConfig> {
    if max_bytes == 0 {
        return Err(Error::InvalidConfig(
            "max config bytes must be > 0".to_string(),
        ));
    }

    let path = path.as_ref();
    let meta =
        std::fs::symlink_metadata(path).map_err(|err| Error::io_path("metadata", path, err))?;
    if meta.file_type().is_symlink() {
        return Err(Error::InvalidConfig(format!(
            "{} is a symlink; refusing to load configuration through symlinks",
            path.display()
        )));
    }
    if !meta.is_file() {
        return Err(Error::InvalidConfig(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    let mut bytes = Vec::<u8>::new();
    std::fs::File::open(path)
        .map_err(|err| Error::io_path("open", path, err))?
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| Error::io_path("read", path, err))?;
    if bytes.len() as u64 > max_bytes {
        return Err(Error::LimitExceeded {
            subject: format!("config file {}", path.display()),
            size_bytes: bytes.len() as u64,
            max_bytes,
        });
    }

    let raw = std::str::from_utf8(&bytes).map_err(|_| Error::InvalidUtf8(path.to_path_buf()))?;
    let format = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => ConfigFormat::Json,
        Some("toml") | None => ConfigFormat::Toml,
        Some(other) => {
            return Err(Error::InvalidConfig(format!(
                "unsupported config format {other:?}; expected .toml or .json"
            )));
        }
    };
    let config = parse_config(raw, format)?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Find a conventional configuration file directly inside `dir`.
pub fn discover_config(dir: impl AsRef<Path>) -> Option<PathBuf> {
    let dir = dir.as_ref();
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}
