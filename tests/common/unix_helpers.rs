use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;

pub fn create_fifo(path: &std::path::Path) {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .unwrap_or_else(|_| panic!("invalid fifo path (contains NUL): {:?}", path));
    // Safety: `c_path` is NUL-terminated and outlives the call.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
    if rc != 0 {
        panic!(
            "mkfifo failed for {}: {}",
            path.display(),
            std::io::Error::last_os_error()
        );
    }
}

/// Permission-denied scenarios cannot be reproduced as root.
pub fn running_as_root() -> bool {
    // Safety: geteuid has no preconditions.
    unsafe { libc::geteuid() == 0 }
}

pub fn set_mode(path: &std::path::Path, mode: u32) {
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).expect("chmod");
}
