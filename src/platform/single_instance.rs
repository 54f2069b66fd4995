// Platform-specific single instance detection

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE_NAME: &str = "sdm.lock";

/// Held for the lifetime of the running monitor. Dropping it releases the lock.
#[derive(Debug)]
pub struct InstanceGuard {
    _file: File,
    path: PathBuf,
}

impl InstanceGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Try to become the only running instance.
///
/// Returns `Ok(None)` when another instance already holds the lock.
pub fn acquire(dir: &Path) -> Result<Option<InstanceGuard>> {
    let path = dir.join(LOCK_FILE_NAME);

    let Some(mut file) = lock_file(&path)
        .with_context(|| format!("Failed to lock instance file: {:?}", path))?
    else {
        return Ok(None);
    };

    // Best effort; the lock itself is what matters
    let _ = file.set_len(0);
    let _ = writeln!(file, "{}", std::process::id());

    Ok(Some(InstanceGuard { _file: file, path }))
}

#[cfg(unix)]
fn lock_file(path: &Path) -> io::Result<Option<File>> {
    use std::os::unix::io::AsRawFd;

    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)?;

    // SAFETY: the descriptor is owned by `file` and stays open for the call
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(Some(file));
    }

    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::WouldBlock {
        Ok(None)
    } else {
        Err(err)
    }
}

#[cfg(windows)]
fn lock_file(path: &Path) -> io::Result<Option<File>> {
    use std::os::windows::fs::OpenOptionsExt;

    // ERROR_SHARING_VIOLATION
    const SHARING_VIOLATION: i32 = 32;

    match OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .share_mode(0)
        .open(path)
    {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.raw_os_error() == Some(SHARING_VIOLATION) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(not(any(unix, windows)))]
fn lock_file(path: &Path) -> io::Result<Option<File>> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(e),
    }
}
