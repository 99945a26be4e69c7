//! Cross-process rebuild lock.
//!
//! The lock record is a file holding the owner's PID as decimal
//! text. Creation uses `create_new`, so two processes can never both
//! believe they created it.
//!
//! A record is reclaimed when:
//! - its PID no longer names a running process (stale)
//! - its content is not a number (corrupted)
//! - it is empty and older than the acquisition timeout (the writer
//!   died between create and write)
//!
//! A record naming the current process is re-entered immediately.
//!
//! Reclaiming renames the record to a private tombstone first. If
//! the tombstone turns out to hold a fresher record than the one
//! judged stale, it is linked back into place.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crate::core::error::{DocSearchError, Result};

/// Acquisition timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Total time to wait for a live holder
    pub timeout: Duration,

    /// Pause between attempts
    pub retry: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            retry: Duration::from_millis(500),
        }
    }
}

/// What a lock file currently says
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockRecord {
    /// No lock file
    Free,
    /// Lock held by this PID
    Held(u32),
    /// File exists but is empty
    Empty,
    /// File content is not a PID
    Corrupted,
}

impl LockRecord {
    /// Inspect the lock file at `path`
    pub fn read(path: &Path) -> Result<Self> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LockRecord::Free),
            Err(e) => {
                return Err(DocSearchError::LockFailed(format!(
                    "Failed to read lock {path:?}: {e}"
                )))
            }
        };

        let trimmed = data.trim();
        if trimmed.is_empty() {
            return Ok(LockRecord::Empty);
        }
        Ok(trimmed
            .parse()
            .map(LockRecord::Held)
            .unwrap_or(LockRecord::Corrupted))
    }
}

/// Held lock; removes the record on drop if it still names us
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Acquire the lock at `path`, waiting up to `options.timeout`
    /// for a live holder to release it.
    pub async fn acquire(path: &Path, options: LockOptions) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let our_pid = std::process::id();
        let start = Instant::now();

        loop {
            match try_create(path, our_pid) {
                Ok(()) => {
                    tracing::debug!("Acquired index lock {:?} (PID {})", path, our_pid);
                    return Ok(Self::held(path));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(DocSearchError::LockFailed(format!(
                        "Failed to create lock {path:?}: {e}"
                    )))
                }
            }

            let holder = match LockRecord::read(path)? {
                LockRecord::Free => continue,
                LockRecord::Held(pid) if pid == our_pid => {
                    tracing::debug!("Index lock {:?} already held by this process", path);
                    return Ok(Self::held(path));
                }
                LockRecord::Held(pid) if !is_process_running(pid) => {
                    tracing::warn!(
                        "Stale lock detected (PID {} not running), cleaning {:?}",
                        pid,
                        path
                    );
                    reclaim_record(path, &LockRecord::Held(pid))?;
                    continue;
                }
                LockRecord::Corrupted => {
                    tracing::warn!("Corrupted lock file {:?}, removing", path);
                    reclaim_record(path, &LockRecord::Corrupted)?;
                    continue;
                }
                LockRecord::Empty if is_older_than(path, options.timeout) => {
                    tracing::warn!("Abandoned empty lock file {:?}, removing", path);
                    reclaim_record(path, &LockRecord::Empty)?;
                    continue;
                }
                LockRecord::Empty => 0,
                LockRecord::Held(pid) => pid,
            };

            let waited = start.elapsed();
            if waited >= options.timeout {
                return Err(DocSearchError::LockTimeout {
                    path: path.to_path_buf(),
                    holder_pid: holder,
                    waited_ms: waited.as_millis() as u64,
                });
            }

            tracing::debug!("Index lock held by PID {}, retrying", holder);
            tokio::time::sleep(options.retry.min(options.timeout - waited)).await;
        }
    }

    fn held(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock now.
    ///
    /// The record is only removed if it still names this process; a
    /// record owned by someone else is left alone with a warning.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        release_if_owned(&self.path)
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = release_if_owned(&self.path) {
                tracing::warn!("Failed to release index lock {:?}: {}", self.path, e);
            }
        }
    }
}

fn try_create(path: &Path, pid: u32) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(pid.to_string().as_bytes())?;
    file.sync_all()
}

fn remove_record(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DocSearchError::LockFailed(format!(
            "Failed to remove lock {path:?}: {e}"
        ))),
    }
}

/// Remove the record at `path` only if it still reads as `expected`.
///
/// The record is renamed to a tombstone unique to this process, so
/// concurrent reclaimers never both remove the same file. A
/// tombstone holding anything else is a record created after the
/// stale one was judged; it is restored unless a newer one exists.
fn reclaim_record(path: &Path, expected: &LockRecord) -> Result<()> {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let mut tombstone = path.as_os_str().to_owned();
    tombstone.push(format!(".stale-{}-{}", std::process::id(), nanos));
    let tombstone = PathBuf::from(tombstone);

    match fs::rename(path, &tombstone) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(DocSearchError::LockFailed(format!(
                "Failed to reclaim lock {path:?}: {e}"
            )))
        }
    }

    let taken = LockRecord::read(&tombstone)?;
    if taken != *expected {
        match fs::hard_link(&tombstone, path) {
            Ok(()) => tracing::debug!("Lock {:?} changed while reclaiming, restored", path),
            Err(e) => tracing::warn!(
                "Lock {:?} changed while reclaiming and could not be restored: {}",
                path,
                e
            ),
        }
    }
    remove_record(&tombstone)
}

/// Remove the lock record at `path` if it names this process
pub fn release_if_owned(path: &Path) -> Result<()> {
    let our_pid = std::process::id();
    match LockRecord::read(path)? {
        LockRecord::Free => Ok(()),
        LockRecord::Held(pid) if pid != our_pid => {
            tracing::warn!(
                "Lock file {:?} names PID {} (we are {}), not removing",
                path,
                pid,
                our_pid
            );
            Ok(())
        }
        LockRecord::Held(_) => {
            remove_record(path)?;
            tracing::debug!("Released index lock {:?}", path);
            Ok(())
        }
        LockRecord::Empty | LockRecord::Corrupted => {
            tracing::warn!("Lock file {:?} has no owner, not removing", path);
            Ok(())
        }
    }
}

fn is_older_than(path: &Path, age: Duration) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|elapsed| elapsed >= age)
}

/// Whether `pid` names a running process.
///
/// A process we lack permission to signal still counts as running.
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }

    // SAFETY: signal 0 only checks existence and permissions
    let rc = unsafe { libc::kill(pid, 0) };
    if rc == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

/// Whether `pid` names a running process.
///
/// A process we lack permission to open still counts as running.
#[cfg(windows)]
pub fn is_process_running(pid: u32) -> bool {
    use windows_sys::Win32::Foundation::{
        CloseHandle, GetLastError, ERROR_ACCESS_DENIED, STILL_ACTIVE,
    };
    use windows_sys::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    };

    if pid == 0 {
        return false;
    }

    // SAFETY: the handle is checked before use and closed exactly once
    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
        if handle == 0 {
            return GetLastError() == ERROR_ACCESS_DENIED;
        }

        let mut exit_code: u32 = 0;
        let ok = GetExitCodeProcess(handle, &mut exit_code);
        CloseHandle(handle);
        ok != 0 && exit_code == STILL_ACTIVE as u32
    }
}

#[cfg(not(any(unix, windows)))]
pub fn is_process_running(_pid: u32) -> bool {
    true
}
