//! Single-instance gate
//!
//! At most one agent per user session: an exclusive advisory file lock on
//! Unix, a named mutex on Windows. The lock is held for the process
//! lifetime; contention means another agent is already running and this
//! process should exit quietly with success so a supervising service does
//! not restart it.

use anyhow::{Context, Result};

#[cfg(unix)]
pub struct InstanceLock {
    // Held open for the process lifetime; the kernel drops the lock on exit.
    _file: std::fs::File,
}

#[cfg(unix)]
impl InstanceLock {
    /// `Ok(Some(lock))` on success, `Ok(None)` when another instance holds it.
    pub fn acquire() -> Result<Option<Self>> {
        let dir = dirs::home_dir().context("cannot resolve home directory")?;
        Self::acquire_at(&dir.join(".dlp_agent.lock"))
    }

    pub fn acquire_at(path: &std::path::Path) -> Result<Option<Self>> {
        use std::os::unix::io::AsRawFd;

        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("cannot open lock file {}", path.display()))?;

        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc == 0 {
            Ok(Some(Self { _file: file }))
        } else {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
                Ok(None)
            } else {
                Err(err).context("flock failed")
            }
        }
    }
}

#[cfg(windows)]
pub struct InstanceLock {
    handle: winapi::um::winnt::HANDLE,
}

// The mutex handle is only ever closed once, on drop.
#[cfg(windows)]
unsafe impl Send for InstanceLock {}

#[cfg(windows)]
impl InstanceLock {
    pub fn acquire() -> Result<Option<Self>> {
        use std::os::windows::ffi::OsStrExt;
        use winapi::shared::winerror::ERROR_ALREADY_EXISTS;
        use winapi::um::errhandlingapi::GetLastError;
        use winapi::um::synchapi::CreateMutexW;

        let name: Vec<u16> = std::ffi::OsStr::new("Local\\dlp-agent-single-instance")
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        unsafe {
            let handle = CreateMutexW(std::ptr::null_mut(), 0, name.as_ptr());
            if handle.is_null() {
                anyhow::bail!("CreateMutexW failed: {}", std::io::Error::last_os_error());
            }
            if GetLastError() == ERROR_ALREADY_EXISTS {
                winapi::um::handleapi::CloseHandle(handle);
                return Ok(None);
            }
            Ok(Some(Self { handle }))
        }
    }
}

#[cfg(windows)]
impl Drop for InstanceLock {
    fn drop(&mut self) {
        unsafe {
            winapi::um::handleapi::CloseHandle(self.handle);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn second_acquisition_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.lock");

        let first = InstanceLock::acquire_at(&path).unwrap();
        assert!(first.is_some());

        let second = InstanceLock::acquire_at(&path).unwrap();
        assert!(second.is_none(), "lock must be exclusive per user");

        drop(first);
        let third = InstanceLock::acquire_at(&path).unwrap();
        assert!(third.is_some(), "lock must be reacquirable after release");
    }
}
