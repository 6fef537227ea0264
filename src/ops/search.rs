use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Context;
use super::list_dir::{FileEntry, sorted_children};

const fn default_recursive() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub directory: PathBuf,
    pub pattern: String,
    #[serde(default = "default_recursive")]
    pub recursive: bool,
    /// Treat `pattern` as a regular expression instead of a shell glob.
    #[serde(default)]
    pub use_regex: bool,
}

impl SearchRequest {
    pub fn glob(directory: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            pattern: pattern.into(),
            recursive: true,
            use_regex: false,
        }
    }

    pub fn regex(directory: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            use_regex: true,
            ..Self::glob(directory, pattern)
        }
    }

    pub fn non_recursive(mut self) -> Self {
        self.recursive = false;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub directory: PathBuf,
    pub matches: Vec<FileEntry>,
    /// Subdirectories left out because listing them was not permitted.
    pub skipped_directories: u64,
}

/// End index of the `[...]` class opening at `start`, following shell rules: a leading `!` and
/// then a leading `]` belong to the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut cursor = start + 1;
    if chars.get(cursor) == Some(&'!') {
        cursor += 1;
    }
    if chars.get(cursor) == Some(&']') {
        cursor += 1;
    }
    chars
        .get(cursor..)?
        .iter()
        .position(|c| *c == ']')
        .map(|offset| cursor + offset)
}

/// Rewrite a shell glob into globset syntax.
///
/// Shell globs have no brace alternation, and a `[` without a closing `]` is an ordinary
/// character, so both are turned into single-character classes.
fn shell_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut index = 0;
    while index < chars.len() {
        match chars[index] {
            '[' => {
                if let Some(end) = class_end(&chars, index) {
                    out.extend(&chars[index..=end]);
                    index = end + 1;
                    continue;
                }
                out.push_str("[[]");
            }
            '{' => out.push_str("[{]"),
            '}' => out.push_str("[}]"),
            ']' => out.push_str("[]]"),
            c => out.push(c),
        }
        index += 1;
    }
    out
}

enum NameMatcher {
    Glob(GlobMatcher),
    Regex(Regex),
}

impl NameMatcher {
    fn compile(pattern: &str, use_regex: bool) -> Result<Self> {
        if use_regex {
            return Regex::new(pattern)
                .map(Self::Regex)
                .map_err(|err| Error::invalid_pattern(pattern, err));
        }
        let translated = shell_glob(pattern);
        let mut builder = GlobBuilder::new(&translated);
        builder.literal_separator(true).backslash_escape(false);
        #[cfg(windows)]
        builder.case_insensitive(true);
        builder
            .build()
            .map(|glob| Self::Glob(glob.compile_matcher()))
            .map_err(|err| Error::invalid_pattern(pattern, err.kind()))
    }

    fn is_match(&self, name: &str) -> bool {
        match self {
            Self::Glob(glob) => glob.is_match(name),
            Self::Regex(regex) => regex.is_match(name),
        }
    }
}

enum Listing {
    Entries(Vec<PathBuf>),
    Skipped,
}

fn list_subdirectory(dir: &Path) -> Result<Listing> {
    match sorted_children(dir) {
        Ok(children) => Ok(Listing::Entries(children)),
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            tracing::warn!(path = %dir.display(), "skipping unreadable directory during search");
            Ok(Listing::Skipped)
        }
        Err(err) => Err(Error::io_path("read_dir", dir, err)),
    }
}

/// Find entries under `directory` whose base name matches `pattern`.
///
/// Results come out in depth-first pre-order with siblings in name order: an entry is reported
/// before anything beneath it, and a subdirectory's whole subtree before its next sibling.
/// Symlinked directories are reported but not descended into.
pub fn search_files(ctx: &Context, request: SearchRequest) -> Result<SearchResponse> {
    tracing::debug!(
        directory = %request.directory.display(),
        pattern = %request.pattern,
        recursive = request.recursive,
        use_regex = request.use_regex,
        "search_files"
    );
    let directory = ctx.validate_path(&request.directory)?;
    if !directory.is_dir() {
        return Err(Error::NotADirectory(directory));
    }
    let matcher = NameMatcher::compile(&request.pattern, request.use_regex)?;

    let top = sorted_children(&directory)
        .map_err(|err| Error::io_path("read_dir", &directory, err))?;
    let mut pending: Vec<std::vec::IntoIter<PathBuf>> = vec![top.into_iter()];
    let mut matches = Vec::<FileEntry>::new();
    let mut skipped_directories: u64 = 0;

    while let Some(frame) = pending.last_mut() {
        let Some(path) = frame.next() else {
            pending.pop();
            continue;
        };

        let entry = FileEntry::from_path(path)?;
        let descend = request.recursive
            && entry.is_directory
            && !entry.path.is_symlink();
        if matcher.is_match(&entry.name) {
            matches.push(entry.clone());
        }
        if !descend {
            continue;
        }

        ctx.check_cancelled("search_files")?;
        match list_subdirectory(&entry.path)? {
            Listing::Entries(children) => pending.push(children.into_iter()),
            Listing::Skipped => skipped_directories += 1,
        }
    }

    tracing::debug!(
        directory = %directory.display(),
        matches = matches.len(),
        skipped_directories,
        "search_files finished"
    );
    Ok(SearchResponse {
        directory,
        matches,
        skipped_directories,
    })
}
