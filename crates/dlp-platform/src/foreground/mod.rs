//! Foreground-application source
//!
//! Samples the foreground application on a 200 ms cadence and emits
//! `AppActivated` events on change. The mediator relies only on eventual
//! consistency with the real foreground app, never on event cadence.

#[cfg(target_os = "macos")]
mod macos;
#[cfg(windows)]
mod windows;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use dlp_core::ports::AgentEvent;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Name of the current foreground application, if resolvable.
pub async fn current() -> Option<String> {
    tokio::task::spawn_blocking(current_blocking).await.ok()?
}

fn current_blocking() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        macos::frontmost_app_name()
    }
    #[cfg(windows)]
    {
        windows::foreground_process_name()
    }
    #[cfg(not(any(target_os = "macos", windows)))]
    {
        None
    }
}

/// Title of the current foreground window (Windows only; used by the URL
/// probe's keyword heuristic).
#[cfg(windows)]
pub fn foreground_window_title() -> Option<String> {
    windows::foreground_window_title()
}

/// Spawn the sampling loop. Duplicate samples are not re-emitted; the loop
/// ends when the receiving side goes away.
pub fn spawn_watcher(sender: mpsc::Sender<AgentEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last = String::new();

        loop {
            interval.tick().await;
            let Some(name) = current().await else {
                continue;
            };
            if name.is_empty() || name == last {
                continue;
            }
            last = name.clone();
            if sender.send(AgentEvent::AppActivated(name)).await.is_err() {
                debug!("event receiver dropped, stopping foreground watcher");
                break;
            }
        }
    })
}
