use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::roots::AllowedRoots;

/// File names looked up by [`crate::config_io::discover_config`], in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["filesystem_config.json", "filesystem_config.toml"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Limits {
    /// Fallback per-file cap for `read_multiple_files` when the request sets none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_per_file: Option<u64>,
    /// Fallback aggregate cap for `read_multiple_files` when the request sets none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_total_size: Option<u64>,
}

fn validate_limit(value: Option<u64>, field: &str) -> Result<()> {
    if value == Some(0) {
        return Err(Error::InvalidConfig(format!("{field} must be > 0")));
    }
    Ok(())
}

impl Limits {
    pub fn validate(&self) -> Result<()> {
        validate_limit(self.max_size_per_file, "limits.max_size_per_file")?;
        validate_limit(self.max_total_size, "limits.max_total_size")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SandboxConfig {
    /// `None` confines operations to the working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_directories: Option<Vec<PathBuf>>,
    #[serde(default)]
    pub limits: Limits,
}

impl SandboxConfig {
    pub fn with_allowed_directories<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            allowed_directories: Some(dirs.into_iter().map(Into::into).collect()),
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(dirs) = &self.allowed_directories {
            if dirs.is_empty() {
                return Err(Error::InvalidConfig(
                    "allowed_directories is empty".to_string(),
                ));
            }
            if dirs.iter().any(|dir| dir.as_os_str().is_empty()) {
                return Err(Error::InvalidConfig(
                    "allowed_directories contains an empty path".to_string(),
                ));
            }
        }
        self.limits.validate()
    }

    /// Resolve the configured directories against the working directory.
    pub fn allowed_roots(&self) -> Result<AllowedRoots> {
        self.validate()?;
        match &self.allowed_directories {
            Some(dirs) => AllowedRoots::new(dirs),
            None => AllowedRoots::current_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_working_directory() {
        let config = SandboxConfig::default();
        let roots = config.allowed_roots().expect("roots");
        let cwd = std::env::current_dir().expect("cwd");
        assert_eq!(roots.len(), 1);
        assert!(roots.contains(&crate::path_utils::normalize_path_lexical(&cwd)));
    }

    #[test]
    fn explicitly_empty_directory_list_is_rejected() {
        let config = SandboxConfig::with_allowed_directories(Vec::<PathBuf>::new());
        match config.validate().expect_err("must reject") {
            Error::InvalidConfig(msg) => assert!(msg.contains("allowed_directories")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_limits_are_rejected() {
        let config = SandboxConfig::default().with_limits(Limits {
            max_size_per_file: Some(0),
            max_total_size: None,
        });
        let err = config.validate().expect_err("must reject");
        assert_eq!(err.code(), "invalid_config");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<SandboxConfig>(r#"{"allowed_dirs": ["/tmp"]}"#)
            .expect_err("unknown field");
        assert!(err.to_string().contains("unknown field"));
    }
}
