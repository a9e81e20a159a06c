//! Git push firewall
//!
//! Materializes a per-user hooks directory with a `pre-push` hook, points
//! `core.hooksPath` at it, and keeps re-asserting that setting against user
//! reverts while the agent runs. The hook whitelists remote URLs by
//! substring; a denied push prints a block message, queues an admin email
//! through the agent binary (`--git-push-alert`) and aborts the push.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use dlp_core::ports::AdminReport;
use dlp_core::PolicySet;

pub const HOOKS_DIR_NAME: &str = ".dlp_git_hooks";
pub const BLOCK_MESSAGE_PREFIX: &str = "🚫 [DLP] BLOCKED: Push to";

const REASSERT_INTERVAL: Duration = Duration::from_secs(5);

pub struct GitFirewall {
    hooks_dir: PathBuf,
    agent_exe: PathBuf,
    policy: PolicySet,
}

impl GitFirewall {
    pub fn new(policy: PolicySet) -> Result<Self> {
        let home = dirs::home_dir().context("cannot resolve home directory")?;
        let agent_exe = std::env::current_exe().context("cannot resolve agent executable")?;
        Ok(Self::with_paths(home.join(HOOKS_DIR_NAME), agent_exe, policy))
    }

    pub fn with_paths(hooks_dir: PathBuf, agent_exe: PathBuf, policy: PolicySet) -> Self {
        Self {
            hooks_dir,
            agent_exe,
            policy,
        }
    }

    pub fn hooks_dir(&self) -> &Path {
        &self.hooks_dir
    }

    /// Write the hook scripts and point `core.hooksPath` at them.
    pub async fn install(&self) -> Result<()> {
        std::fs::create_dir_all(&self.hooks_dir).with_context(|| {
            format!("cannot create hooks directory {}", self.hooks_dir.display())
        })?;

        let hook_path = self.hooks_dir.join("pre-push");
        std::fs::write(&hook_path, self.render_sh_hook())?;
        make_executable(&hook_path)?;

        // Windows installs keep parallel PowerShell and batch variants so
        // every Git frontend reaches the same decision and alert path
        // (Git-Bash itself runs the sh hook).
        #[cfg(windows)]
        {
            std::fs::write(self.hooks_dir.join("pre-push.ps1"), self.render_ps1_hook())?;
            std::fs::write(self.hooks_dir.join("pre-push.bat"), self.render_bat_hook())?;
        }

        self.set_hooks_path().await?;
        info!(dir = %self.hooks_dir.display(), "git push firewall active");
        Ok(())
    }

    /// Re-assert `core.hooksPath` every few seconds to defeat user reverts.
    pub fn spawn_reasserter(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(REASSERT_INTERVAL).await;
                let current = git_config_get("core.hooksPath").await;
                let expected = self.hooks_dir.to_string_lossy();
                if current.as_deref() != Some(expected.as_ref()) {
                    debug!("core.hooksPath was changed, re-asserting");
                    if let Err(e) = self.set_hooks_path().await {
                        warn!(error = %e, "failed to re-assert core.hooksPath");
                    }
                }
            }
        })
    }

    /// Best-effort removal of the global hook configuration on shutdown.
    pub async fn uninstall(&self) {
        let status = tokio::process::Command::new("git")
            .args(["config", "--global", "--unset", "core.hooksPath"])
            .status()
            .await;
        match status {
            Ok(s) if s.success() => info!("git push firewall removed"),
            Ok(_) => debug!("core.hooksPath was not set"),
            Err(e) => warn!(error = %e, "failed to unset core.hooksPath"),
        }
    }

    async fn set_hooks_path(&self) -> Result<()> {
        let status = tokio::process::Command::new("git")
            .args(["config", "--global", "core.hooksPath"])
            .arg(&self.hooks_dir)
            .status()
            .await
            .context("failed to run git config")?;
        anyhow::ensure!(status.success(), "git config exited with {status}");
        Ok(())
    }

    /// POSIX sh hook. Git invokes it with argv[1]=remote-name,
    /// argv[2]=remote-url; an empty URL is resolved from the remote config.
    pub fn render_sh_hook(&self) -> String {
        format!(
            r#"#!/bin/sh
# DLP agent git firewall
remote="$1"
url="$2"
if [ -z "$url" ]; then
    url=$(git config --get remote."$remote".url)
fi

ALLOWED_HOSTS="{hosts}"

for host in $ALLOWED_HOSTS; do
    case "$url" in
        *"$host"*) exit 0 ;;
    esac
done

echo "{block} $url is not allowed." 1>&2
"{agent}" --git-push-alert "$url" > /tmp/dlp_git_alert.log 2>&1 &
exit 1
"#,
            hosts = self.policy.git_whitelist.join(" "),
            block = BLOCK_MESSAGE_PREFIX,
            agent = self.agent_exe.display(),
        )
    }

    pub fn render_ps1_hook(&self) -> String {
        let hosts = self
            .policy
            .git_whitelist
            .iter()
            .map(|h| format!("\"{h}\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            r#"param($remote, $url)
if (-not $url) {{ $url = git config --get "remote.$remote.url" }}
$allowed = @({hosts})
foreach ($h in $allowed) {{
    if ($url -like "*$h*") {{ exit 0 }}
}}
[Console]::Error.WriteLine("{block} $url is not allowed.")
Start-Process -FilePath "{agent}" -ArgumentList "--git-push-alert", $url -WindowStyle Hidden
exit 1
"#,
            hosts = hosts,
            block = BLOCK_MESSAGE_PREFIX,
            agent = self.agent_exe.display(),
        )
    }

    pub fn render_bat_hook(&self) -> String {
        let checks = self
            .policy
            .git_whitelist
            .iter()
            .map(|h| format!("echo %URL% | findstr /C:\"{h}\" >nul && exit /b 0"))
            .collect::<Vec<_>>()
            .join("\r\n");
        format!(
            "@echo off\r\n\
             set REMOTE=%1\r\n\
             set URL=%2\r\n\
             if \"%URL%\"==\"\" for /f \"delims=\" %%u in ('git config --get remote.%REMOTE%.url') do set URL=%%u\r\n\
             {checks}\r\n\
             echo {block} %URL% is not allowed. 1>&2\r\n\
             start \"\" \"{agent}\" --git-push-alert \"%URL%\"\r\n\
             exit /b 1\r\n",
            checks = checks,
            block = BLOCK_MESSAGE_PREFIX,
            agent = self.agent_exe.display(),
        )
    }
}

/// In-process whitelist check for `--check-git-push`: deny prints the block
/// message, queues the admin email and exits non-zero.
pub async fn check_push_and_alert(url: &str, policy: &PolicySet) -> i32 {
    if policy.push_allowed(url) {
        return 0;
    }
    eprintln!("{BLOCK_MESSAGE_PREFIX} {url} is not allowed.");
    eprintln!("Approved remotes: {}", policy.git_whitelist.join(", "));
    send_push_alert(url).await;
    1
}

/// Deliver the git-push admin email, if email is configured.
pub async fn send_push_alert(url: &str) {
    let Some(email) = dlp_infra::config::load_email() else {
        warn!("email not configured, git push alert dropped");
        return;
    };
    match dlp_infra::AlertMailer::new(&email) {
        Ok(mailer) => {
            mailer
                .send(&AdminReport::GitPush {
                    url: url.to_owned(),
                })
                .await;
        }
        Err(e) => warn!(error = %e, "cannot build alert mailer"),
    }
}

async fn git_config_get(key: &str) -> Option<String> {
    let output = tokio::process::Command::new("git")
        .args(["config", "--global", key])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    (!value.is_empty()).then_some(value)
}

fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(perms.mode() | 0o755);
        std::fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn firewall() -> GitFirewall {
        GitFirewall::with_paths(
            PathBuf::from("/home/dev/.dlp_git_hooks"),
            PathBuf::from("/usr/local/bin/dlp-agent"),
            PolicySet::default(),
        )
    }

    #[test]
    fn sh_hook_carries_every_whitelist_entry() {
        let hook = firewall().render_sh_hook();
        for host in &PolicySet::default().git_whitelist {
            assert!(hook.contains(host.as_str()), "missing {host}");
        }
        assert!(hook.starts_with("#!/bin/sh"));
        assert!(hook.contains("exit 0"));
        assert!(hook.contains("exit 1"));
    }

    #[test]
    fn sh_hook_resolves_url_from_remote_config_when_absent() {
        let hook = firewall().render_sh_hook();
        assert!(hook.contains(r#"url=$(git config --get remote."$remote".url)"#));
    }

    #[test]
    fn denied_push_alerts_through_the_agent_binary() {
        let hook = firewall().render_sh_hook();
        assert!(hook.contains("--git-push-alert"));
        assert!(hook.contains("/usr/local/bin/dlp-agent"));
        assert!(hook.contains(BLOCK_MESSAGE_PREFIX));
        // The alert must not delay the denial.
        assert!(hook.contains("2>&1 &"));
    }

    #[test]
    fn windows_variants_reach_the_same_decision() {
        let fw = firewall();
        let ps1 = fw.render_ps1_hook();
        let bat = fw.render_bat_hook();
        for host in &PolicySet::default().git_whitelist {
            assert!(ps1.contains(host.as_str()));
            assert!(bat.contains(host.as_str()));
        }
        assert!(ps1.contains("--git-push-alert"));
        assert!(bat.contains("--git-push-alert"));
        assert!(ps1.contains("exit 1"));
        assert!(bat.contains("exit /b 1"));
    }

    #[tokio::test]
    async fn allowed_push_exits_zero() {
        let policy = PolicySet::default();
        let code = check_push_and_alert("git@gitlab.siguna.co:team/repo.git", &policy).await;
        assert_eq!(code, 0);
    }
}
