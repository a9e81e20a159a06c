//! Per-user auto-start registration
//!
//! macOS: a LaunchAgents plist with RunAtLoad + KeepAlive, stdout/stderr
//! redirected to temp log files. Windows: a `Run` registry value. Written
//! only on explicit `--install`, removed on `--remove`; a normal agent run
//! never touches these.

use anyhow::Result;

#[cfg(target_os = "macos")]
pub const LAUNCH_AGENT_LABEL: &str = "com.dlp.agent";

pub fn install() -> Result<()> {
    let exe = std::env::current_exe()?;
    install_impl(&exe)
}

pub fn remove() -> Result<()> {
    remove_impl()
}

#[cfg(target_os = "macos")]
fn install_impl(exe: &std::path::Path) -> Result<()> {
    use anyhow::Context;

    let agents = dirs::home_dir()
        .context("cannot resolve home directory")?
        .join("Library/LaunchAgents");
    std::fs::create_dir_all(&agents)?;

    let plist_path = agents.join(format!("{LAUNCH_AGENT_LABEL}.plist"));
    std::fs::write(&plist_path, launch_agent_plist(exe))?;
    tracing::info!(path = %plist_path.display(), "wrote launch agent");

    // Best effort; the descriptor alone covers the next login.
    let _ = std::process::Command::new("launchctl")
        .args(["load", "-w"])
        .arg(&plist_path)
        .status();
    Ok(())
}

#[cfg(target_os = "macos")]
fn remove_impl() -> Result<()> {
    use anyhow::Context;

    let plist_path = dirs::home_dir()
        .context("cannot resolve home directory")?
        .join("Library/LaunchAgents")
        .join(format!("{LAUNCH_AGENT_LABEL}.plist"));

    let _ = std::process::Command::new("launchctl")
        .arg("unload")
        .arg(&plist_path)
        .status();

    if plist_path.exists() {
        std::fs::remove_file(&plist_path)?;
        tracing::info!(path = %plist_path.display(), "removed launch agent");
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn launch_agent_plist(exe: &std::path::Path) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{exe}</string>
    </array>
    <key>RunAtLoad</key>
    <true/>
    <key>KeepAlive</key>
    <true/>
    <key>StandardOutPath</key>
    <string>/tmp/dlp-agent.out.log</string>
    <key>StandardErrorPath</key>
    <string>/tmp/dlp-agent.err.log</string>
</dict>
</plist>
"#,
        label = LAUNCH_AGENT_LABEL,
        exe = exe.display(),
    )
}

#[cfg(windows)]
const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";
#[cfg(windows)]
const RUN_VALUE: &str = "DlpAgent";

#[cfg(windows)]
fn install_impl(exe: &std::path::Path) -> Result<()> {
    use winreg::enums::HKEY_CURRENT_USER;
    use winreg::RegKey;

    let (key, _) = RegKey::predef(HKEY_CURRENT_USER).create_subkey(RUN_KEY)?;
    key.set_value(RUN_VALUE, &exe.to_string_lossy().into_owned())?;
    tracing::info!("registered Run value");
    Ok(())
}

#[cfg(windows)]
fn remove_impl() -> Result<()> {
    use winreg::enums::HKEY_CURRENT_USER;
    use winreg::RegKey;

    let key = RegKey::predef(HKEY_CURRENT_USER).open_subkey_with_flags(
        RUN_KEY,
        winreg::enums::KEY_SET_VALUE,
    )?;
    match key.delete_value(RUN_VALUE) {
        Ok(()) => tracing::info!("removed Run value"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(not(any(target_os = "macos", windows)))]
fn install_impl(_exe: &std::path::Path) -> Result<()> {
    tracing::warn!("auto-start registration is not wired up on this platform");
    Ok(())
}

#[cfg(not(any(target_os = "macos", windows)))]
fn remove_impl() -> Result<()> {
    Ok(())
}
