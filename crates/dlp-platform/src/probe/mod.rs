//! Browser URL probe
//!
//! Retrieves the active URL of a named browser. Chromium-family browsers and
//! Safari answer over their macOS scripting surface; Firefox (no reliable
//! URL query) and all Windows browsers fall back to the foreground window
//! title mapped through a keyword table. The result is only ever used for
//! substring containment against the allowed-domain list, so a synthetic
//! URL like `https://gemini.google.com` is good enough.

mod title_hints;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use dlp_core::ports::UrlProbePort;

pub use title_hints::url_from_title;

/// Scripting-surface deadline; a stuck browser must not stall the watchdog.
#[allow(dead_code)]
const PROBE_DEADLINE: Duration = Duration::from_millis(300);

#[derive(Default)]
pub struct OsUrlProbe;

impl OsUrlProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UrlProbePort for OsUrlProbe {
    async fn active_url(&self, app: &str) -> Result<String> {
        Ok(active_url_impl(app).await)
    }
}

#[cfg(target_os = "macos")]
async fn active_url_impl(app: &str) -> String {
    let normalized = app.to_ascii_lowercase();
    let script = match normalized.as_str() {
        "safari" => "tell application \"Safari\" to get URL of front document".to_owned(),
        "google chrome" | "chrome" | "microsoft edge" | "msedge" | "brave browser" | "brave"
        | "arc" => format!(
            "tell application \"{}\" to get URL of active tab of front window",
            app
        ),
        // Firefox and anything else unscriptable: window title heuristic.
        _ => {
            let title = osascript(
                "tell application \"System Events\" to get name of front window of (first process whose frontmost is true)",
            )
            .await
            .unwrap_or_default();
            return url_from_title(&title);
        }
    };
    osascript(&script).await.unwrap_or_default()
}

#[cfg(target_os = "macos")]
async fn osascript(script: &str) -> Option<String> {
    use std::process::Stdio;

    let output = tokio::process::Command::new("osascript")
        .arg("-e")
        .arg(script)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(PROBE_DEADLINE, output).await {
        Ok(Ok(out)) if out.status.success() => {
            Some(String::from_utf8_lossy(&out.stdout).trim().to_owned())
        }
        _ => None,
    }
}

#[cfg(windows)]
async fn active_url_impl(_app: &str) -> String {
    let title = tokio::task::spawn_blocking(crate::foreground::foreground_window_title)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    url_from_title(&title)
}

#[cfg(not(any(target_os = "macos", windows)))]
async fn active_url_impl(_app: &str) -> String {
    String::new()
}
