//! Agent runtime
//!
//! Builds the adapters, installs the git firewall, starts the background
//! loops (foreground watcher, reaper, hooks-path reasserter) and runs the
//! mediator until shutdown. The firewall configuration is unwound on the
//! way out, best-effort.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use dlp_core::{Mediator, MediatorConfig, PolicySet};
use dlp_infra::{AgentConfig, AlertMailer, LlmClassifier};
use dlp_platform::{foreground, InstanceLock, OsUrlProbe, Reaper, SystemClipboard};

use crate::alert_sink::AgentAlertSink;
use crate::git_firewall::GitFirewall;

pub async fn run(config: AgentConfig) -> Result<i32> {
    let Some(_lock) = InstanceLock::acquire()? else {
        // A supervising service must not treat this as a crash loop.
        info!("another agent instance is already running, exiting");
        return Ok(0);
    };

    let policy = PolicySet::default();

    let clipboard = Arc::new(SystemClipboard::new()?);
    let probe = Arc::new(OsUrlProbe::new());
    let classifier = Arc::new(LlmClassifier::new(&config.llm)?);
    let mailer = config.email.as_ref().and_then(|email| {
        AlertMailer::new(email)
            .map_err(|e| warn!(error = %e, "mailer unavailable, admin alerts disabled"))
            .ok()
            .map(Arc::new)
    });
    let alerts = Arc::new(AgentAlertSink::new(mailer));

    let mediator = Mediator::new(
        clipboard,
        probe,
        classifier,
        alerts,
        policy.clone(),
        MediatorConfig::default(),
    );

    // Clipboard mediation stays active even if the firewall cannot install.
    let firewall = Arc::new(GitFirewall::new(policy.clone())?);
    if let Err(e) = firewall.install().await {
        warn!(error = %e, "git firewall installation failed");
    }
    let reasserter = firewall.clone().spawn_reasserter();

    let reaper = Reaper::spawn(policy);

    let (events_tx, events_rx) = mpsc::channel(32);
    let foreground_watcher = foreground::spawn_watcher(events_tx);
    let mediator_task = tokio::spawn(mediator.run(events_rx));

    info!("DLP agent running");
    wait_for_shutdown().await;
    info!("shutting down");

    reasserter.abort();
    reaper.abort();
    foreground_watcher.abort();
    mediator_task.abort();
    firewall.uninstall().await;

    Ok(0)
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
