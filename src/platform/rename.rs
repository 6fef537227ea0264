use std::path::Path;

#[cfg(unix)]
pub(crate) fn sync_parent_directory(path: &Path) -> std::io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::File::open(parent)?.sync_all()
}

#[cfg(not(unix))]
pub(crate) fn sync_parent_directory(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Rename `src` to `dest`, failing with `AlreadyExists` instead of replacing an existing entry.
///
/// Returns `ErrorKind::Unsupported` when the platform or filesystem has no atomic primitive;
/// callers then fall back to check-then-rename.
pub(crate) fn rename_no_replace(src: &Path, dest: &Path) -> std::io::Result<()> {
    rename_no_replace_impl(src, dest)?;
    if let Err(err) = sync_parent_directory(dest) {
        tracing::debug!(path = %dest.display(), error = %err, "parent sync after rename failed");
    }
    Ok(())
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "tvos",
    target_os = "watchos",
    target_os = "visionos"
))]
fn c_paths(
    src: &Path,
    dest: &Path,
) -> std::io::Result<(std::ffi::CString, std::ffi::CString)> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let nul = |which: &str| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{which} path contains interior NUL byte"),
        )
    };
    let src = CString::new(src.as_os_str().as_bytes()).map_err(|_| nul("source"))?;
    let dest = CString::new(dest.as_os_str().as_bytes()).map_err(|_| nul("destination"))?;
    Ok((src, dest))
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn rename_no_replace_impl(src: &Path, dest: &Path) -> std::io::Result<()> {
    let (src, dest) = c_paths(src, dest)?;
    // SAFETY: both C strings are NUL-terminated and outlive this synchronous call.
    let rc = unsafe {
        libc::renameat2(
            libc::AT_FDCWD,
            src.as_ptr(),
            libc::AT_FDCWD,
            dest.as_ptr(),
            libc::RENAME_NOREPLACE,
        )
    };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        // Old kernels and some filesystems (e.g. certain network mounts) lack the flag.
        Some(libc::EINVAL) | Some(libc::ENOSYS) => Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            err,
        )),
        _ => Err(err),
    }
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "tvos",
    target_os = "watchos",
    target_os = "visionos"
))]
fn rename_no_replace_impl(src: &Path, dest: &Path) -> std::io::Result<()> {
    let (src, dest) = c_paths(src, dest)?;
    // SAFETY: both C strings are NUL-terminated and outlive this synchronous call.
    let rc = unsafe { libc::renamex_np(src.as_ptr(), dest.as_ptr(), libc::RENAME_EXCL) };
    if rc == 0 {
        return Ok(());
    }
    Err(std::io::Error::last_os_error())
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "tvos",
    target_os = "watchos",
    target_os = "visionos"
)))]
fn rename_no_replace_impl(_src: &Path, _dest: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "atomic no-replace rename is unsupported on this platform",
    ))
}
