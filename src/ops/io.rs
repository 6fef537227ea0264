use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

const TEMP_PREFIX: &str = ".sandbox-fs-tools.";
const TEMP_SUFFIX: &str = ".tmp";

fn file_too_large(path: &Path, size_bytes: u64, max_bytes: u64) -> Error {
    Error::LimitExceeded {
        subject: format!("file {}", path.display()),
        size_bytes,
        max_bytes,
    }
}

/// Read a regular file as UTF-8 text, optionally bounded by `max_bytes`.
///
/// The bound is enforced on the bytes actually read, so a file that grows after a size check
/// still cannot exceed it.
pub(super) fn read_text(path: &Path, max_bytes: Option<u64>) -> Result<String> {
    let mut file = fs::File::open(path).map_err(|err| Error::io_path("open", path, err))?;
    let meta = file
        .metadata()
        .map_err(|err| Error::io_path("metadata", path, err))?;
    if !meta.is_file() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let mut bytes = Vec::<u8>::new();
    match max_bytes {
        Some(max) => {
            if meta.len() > max {
                return Err(file_too_large(path, meta.len(), max));
            }
            file.take(max.saturating_add(1))
                .read_to_end(&mut bytes)
                .map_err(|err| Error::io_path("read", path, err))?;
            let read_size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
            if read_size > max {
                return Err(file_too_large(path, read_size, max));
            }
        }
        None => {
            file.read_to_end(&mut bytes)
                .map_err(|err| Error::io_path("read", path, err))?;
        }
    }
    String::from_utf8(bytes).map_err(|_| Error::InvalidUtf8(path.to_path_buf()))
}

fn temp_file_beside(path: &Path) -> Result<tempfile::NamedTempFile> {
    let parent = path.parent().ok_or_else(|| {
        Error::InvalidOperation(format!("{} has no parent directory", path.display()))
    })?;
    tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)
        .map_err(|err| Error::io_path("create_temp", path, err))
}

fn persist(tmp: tempfile::NamedTempFile, dest: &Path, overwrite: bool) -> Result<()> {
    let persisted = if overwrite {
        tmp.persist(dest)
    } else {
        tmp.persist_noclobber(dest)
    };
    persisted.map_err(|err| match err.error.kind() {
        std::io::ErrorKind::AlreadyExists if !overwrite => Error::AlreadyExists(dest.to_path_buf()),
        _ => Error::io_path("rename", dest, err.error),
    })?;
    if let Err(err) = crate::platform::rename::sync_parent_directory(dest) {
        tracing::debug!(path = %dest.display(), error = %err, "parent sync failed");
    }
    Ok(())
}

/// Replace `path` with `bytes` through a temp file in the same directory.
///
/// Readers observe either the old or the new content. An existing file's permissions carry
/// over to the replacement.
pub(super) fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let existing_perms = match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => return Err(Error::io_path("metadata", path, err)),
    };

    let mut tmp = temp_file_beside(path)?;
    tmp.as_file_mut()
        .write_all(bytes)
        .map_err(|err| Error::io_path("write", path, err))?;
    tmp.as_file_mut()
        .sync_all()
        .map_err(|err| Error::io_path("sync", path, err))?;
    if let Some(perms) = existing_perms {
        fs::set_permissions(tmp.path(), perms)
            .map_err(|err| Error::io_path("set_permissions", path, err))?;
    }
    persist(tmp, path, true)
}

/// Copy the content of regular file `src` to `dest` through a temp file beside `dest`.
///
/// Without `overwrite` the final rename refuses to clobber, so a destination created
/// concurrently surfaces as [`Error::AlreadyExists`]. Returns the number of bytes copied.
pub(super) fn copy_file_atomic(src: &Path, dest: &Path, overwrite: bool) -> Result<u64> {
    let mut input = fs::File::open(src).map_err(|err| Error::io_path("open", src, err))?;
    let src_meta = input
        .metadata()
        .map_err(|err| Error::io_path("metadata", src, err))?;
    if !src_meta.is_file() {
        return Err(Error::InvalidOperation(format!(
            "{} is not a regular file",
            src.display()
        )));
    }

    let mut tmp = temp_file_beside(dest)?;
    let bytes = std::io::copy(&mut input, tmp.as_file_mut())
        .map_err(|err| Error::io_path("copy", dest, err))?;
    tmp.as_file_mut()
        .sync_all()
        .map_err(|err| Error::io_path("sync", dest, err))?;
    fs::set_permissions(tmp.path(), src_meta.permissions())
        .map_err(|err| Error::io_path("set_permissions", dest, err))?;
    persist(tmp, dest, overwrite)?;
    Ok(bytes)
}

pub(super) fn walk_error(err: walkdir::Error) -> Error {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    let loop_ancestor = err.loop_ancestor().map(Path::to_path_buf);
    match err.into_io_error() {
        Some(io) => Error::io_path("walk", path, io),
        None => Error::InvalidOperation(format!(
            "filesystem loop at {} (points back to {})",
            path.display(),
            loop_ancestor.unwrap_or_default().display()
        )),
    }
}

pub(super) fn is_cross_device(err: &std::io::Error) -> bool {
    if err.kind() == std::io::ErrorKind::CrossesDevices {
        return true;
    }
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::EXDEV)
    }
    #[cfg(not(unix))]
    {
        false
    }
}

pub(super) fn dir_has_entries(path: &Path) -> bool {
    fs::read_dir(path).is_ok_and(|mut entries| entries.next().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_bytes_atomic_replaces_content_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        fs::write(&path, "old").expect("write");

        write_bytes_atomic(&path, b"new").expect("atomic write");

        assert_eq!(fs::read_to_string(&path).expect("read"), "new");
        let names: Vec<_> = fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn write_bytes_atomic_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("script.sh");
        fs::write(&path, "#!/bin/sh\n").expect("write");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o750)).expect("chmod");

        write_bytes_atomic(&path, b"#!/bin/sh\necho hi\n").expect("atomic write");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);
    }

    #[test]
    fn read_text_enforces_limit_and_utf8() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        fs::write(&path, "hello").expect("write");

        assert_eq!(read_text(&path, Some(5)).expect("read"), "hello");
        match read_text(&path, Some(4)).expect_err("too large") {
            Error::LimitExceeded {
                size_bytes,
                max_bytes,
                ..
            } => {
                assert_eq!(size_bytes, 5);
                assert_eq!(max_bytes, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let binary = dir.path().join("b.bin");
        fs::write(&binary, [0xff, 0xfe, 0x00]).expect("write");
        match read_text(&binary, None).expect_err("invalid utf-8") {
            Error::InvalidUtf8(path) => assert_eq!(path, binary),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn copy_file_atomic_without_overwrite_refuses_existing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("src.txt");
        let dest = dir.path().join("dest.txt");
        fs::write(&src, "source").expect("write");
        fs::write(&dest, "existing").expect("write");

        match copy_file_atomic(&src, &dest, false).expect_err("must refuse") {
            Error::AlreadyExists(path) => assert_eq!(path, dest),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fs::read_to_string(&dest).expect("read"), "existing");

        let copied = copy_file_atomic(&src, &dest, true).expect("overwrite");
        assert_eq!(copied, 6);
        assert_eq!(fs::read_to_string(&dest).expect("read"), "source");
    }
}
