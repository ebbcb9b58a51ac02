//! Save-directory resolution and free-space probing.

use std::io;
use std::path::{Path, PathBuf};

/// Default directory received files are saved under.
///
/// Prefers the platform Downloads folder, then the home directory, then the
/// current directory.
#[must_use]
pub fn default_save_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Free bytes available to unprivileged writes under `path`.
#[cfg(unix)]
#[allow(unsafe_code)]
pub fn available_space(path: &Path) -> io::Result<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))?;
    let mut stats = std::mem::MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: c_path is a valid NUL-terminated string and stats points to
    // writable memory of the correct type; statvfs fully initializes it on
    // success.
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), stats.as_mut_ptr()) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: statvfs returned 0, so the struct is initialized.
    let stats = unsafe { stats.assume_init() };
    Ok((stats.f_bavail as u64).saturating_mul(stats.f_frsize as u64))
}

/// Free bytes available to unprivileged writes under `path`.
///
/// No probe is available on this platform; reports unlimited space so the
/// transfer proceeds and ordinary write errors surface instead.
#[cfg(not(unix))]
pub fn available_space(_path: &Path) -> io::Result<u64> {
    Ok(u64::MAX)
}
