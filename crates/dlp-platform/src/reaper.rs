//! Screenshot-tool reaper
//!
//! Periodically enumerates processes and terminates any whose name,
//! executable path or argv[0] matches the banned-process list. On Windows
//! the sweep additionally covers visible top-level windows whose titles
//! match banned titles (capture tools that run under generic host names).

use std::time::Duration;

use sysinfo::{ProcessesToUpdate, System};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use dlp_core::PolicySet;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

pub struct Reaper {
    policy: PolicySet,
    system: System,
}

impl Reaper {
    pub fn new(policy: PolicySet) -> Self {
        Self {
            policy,
            system: System::new(),
        }
    }

    /// Run forever on the sweep cadence. Sweeps are blocking (process-table
    /// walks) and run on the blocking pool.
    pub fn spawn(policy: PolicySet) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut reaper = Self::new(policy.clone());
            loop {
                let mut moved = reaper;
                let result = tokio::task::spawn_blocking(move || {
                    let killed = moved.sweep();
                    (moved, killed)
                })
                .await;
                match result {
                    Ok((returned, killed)) => {
                        reaper = returned;
                        if killed > 0 {
                            info!(killed, "terminated banned capture processes");
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "reaper sweep panicked, restarting");
                        reaper = Self::new(policy.clone());
                    }
                }
                tokio::time::sleep(SWEEP_INTERVAL).await;
            }
        })
    }

    /// One pass over the process table; returns the number of kills.
    pub fn sweep(&mut self) -> usize {
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        let own_pid = sysinfo::get_current_pid().ok();
        let mut killed = 0;

        for (pid, process) in self.system.processes() {
            if Some(*pid) == own_pid {
                continue;
            }

            let name = process.name().to_string_lossy();
            let exe = process
                .exe()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            let argv0 = process
                .cmd()
                .first()
                .map(|a| a.to_string_lossy().into_owned())
                .unwrap_or_default();

            let matched = self.policy.matches_banned_process(&name, false)
                || (!exe.is_empty() && self.policy.matches_banned_process(&exe, false))
                || (!argv0.is_empty() && self.policy.matches_banned_process(&argv0, true));

            if matched {
                if process.kill() {
                    debug!(%name, pid = pid.as_u32(), "killed banned process");
                    killed += 1;
                } else {
                    warn!(%name, pid = pid.as_u32(), "failed to kill banned process");
                }
            }
        }

        #[cfg(windows)]
        {
            killed += self.sweep_window_titles();
        }

        killed
    }

    #[cfg(windows)]
    fn sweep_window_titles(&mut self) -> usize {
        let mut killed = 0;
        for (pid, title) in windows_titles::visible_windows() {
            if !self.policy.matches_banned_title(&title) {
                continue;
            }
            if let Some(process) = self.system.process(sysinfo::Pid::from_u32(pid)) {
                if process.kill() {
                    debug!(%title, pid, "killed process owning banned window");
                    killed += 1;
                }
            }
        }
        killed
    }
}

#[cfg(windows)]
mod windows_titles {
    use winapi::shared::minwindef::{BOOL, LPARAM, TRUE};
    use winapi::shared::windef::HWND;
    use winapi::um::winuser::{
        EnumWindows, GetWindowTextW, GetWindowThreadProcessId, IsWindowVisible,
    };

    pub(super) fn visible_windows() -> Vec<(u32, String)> {
        let mut out: Vec<(u32, String)> = Vec::new();
        unsafe {
            EnumWindows(Some(collect), &mut out as *mut _ as LPARAM);
        }
        out
    }

    unsafe extern "system" fn collect(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let out = &mut *(lparam as *mut Vec<(u32, String)>);
        if IsWindowVisible(hwnd) == 0 {
            return TRUE;
        }
        let mut buf = [0u16; 512];
        let len = GetWindowTextW(hwnd, buf.as_mut_ptr(), buf.len() as i32);
        if len > 0 {
            let title = String::from_utf16_lossy(&buf[..len as usize]);
            let mut pid: u32 = 0;
            GetWindowThreadProcessId(hwnd, &mut pid);
            if pid != 0 {
                out.push((pid, title));
            }
        }
        TRUE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_does_not_kill_this_process() {
        // Our own name contains no banned substring, and the sweep skips the
        // current pid regardless; the sweep must simply run without panicking.
        let mut reaper = Reaper::new(PolicySet::default());
        let _ = reaper.sweep();
    }
}
