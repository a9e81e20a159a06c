//! CLI command multiplex
//!
//! One binary serves the agent runtime, the auto-start installer and the
//! git-hook helper paths. Exit codes: install/remove/alert paths exit 0,
//! the whitelist check exits 0 (allow) or 1 (deny), missing classifier
//! configuration at agent startup exits 1.

use clap::Parser;
use tracing::{error, info};

use dlp_core::PolicySet;

use crate::{agent, git_firewall, instances};

#[derive(Parser, Debug)]
#[command(
    name = "dlp-agent",
    version,
    about = "Endpoint DLP agent: clipboard mediation, git push firewall, screen-capture defense"
)]
pub struct Cli {
    /// Register the agent as a per-user auto-start service and exit.
    #[arg(long, conflicts_with = "remove")]
    pub install: bool,

    /// Unregister auto-start, terminate other agent instances and exit.
    #[arg(long)]
    pub remove: bool,

    /// Queue a git-push admin email for the given remote URL and exit
    /// (invoked by the pre-push hook).
    #[arg(long, value_name = "URL")]
    pub git_push_alert: Option<String>,

    /// Whitelist-check the given remote URL; a blocked URL prints the
    /// decision, queues an email and exits non-zero.
    #[arg(long, value_name = "URL")]
    pub check_git_push: Option<String>,
}

pub async fn run(cli: Cli) -> i32 {
    if cli.install {
        return match dlp_platform::autostart::install() {
            Ok(()) => {
                info!("auto-start registered");
                0
            }
            Err(e) => {
                error!(error = %e, "auto-start registration failed");
                1
            }
        };
    }

    if cli.remove {
        if let Err(e) = dlp_platform::autostart::remove() {
            error!(error = %e, "auto-start removal failed");
        }
        let killed = instances::terminate_others();
        info!(killed, "agent removed");
        return 0;
    }

    if let Some(url) = cli.git_push_alert {
        git_firewall::send_push_alert(&url).await;
        return 0;
    }

    if let Some(url) = cli.check_git_push {
        return git_firewall::check_push_and_alert(&url, &PolicySet::default()).await;
    }

    let config = match dlp_infra::config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return 1;
        }
    };

    match agent::run(config).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "agent failed");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse_independently() {
        let cli = Cli::parse_from(["dlp-agent", "--check-git-push", "git@github.com:x/y.git"]);
        assert_eq!(cli.check_git_push.as_deref(), Some("git@github.com:x/y.git"));
        assert!(!cli.install);

        let cli = Cli::parse_from(["dlp-agent", "--install"]);
        assert!(cli.install);

        let cli = Cli::parse_from(["dlp-agent"]);
        assert!(!cli.install && !cli.remove);
        assert!(cli.git_push_alert.is_none() && cli.check_git_push.is_none());
    }

    #[test]
    fn install_and_remove_conflict() {
        assert!(Cli::try_parse_from(["dlp-agent", "--install", "--remove"]).is_err());
    }
}
