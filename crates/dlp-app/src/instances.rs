//! Terminate other running agent instances (`--remove` path).

use sysinfo::{ProcessesToUpdate, System};
use tracing::info;

/// Kill every other process running this executable. Returns the kill count.
pub fn terminate_others() -> usize {
    let own_pid = sysinfo::get_current_pid().ok();
    let own_exe = std::env::current_exe().ok();

    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);

    let mut killed = 0;
    for (pid, process) in system.processes() {
        if Some(*pid) == own_pid {
            continue;
        }
        let same_exe = match (&own_exe, process.exe()) {
            (Some(own), Some(theirs)) => own == theirs,
            _ => false,
        };
        let same_name = process
            .name()
            .to_string_lossy()
            .to_ascii_lowercase()
            .starts_with("dlp-agent");
        if (same_exe || same_name) && process.kill() {
            info!(pid = pid.as_u32(), "terminated agent instance");
            killed += 1;
        }
    }
    killed
}
