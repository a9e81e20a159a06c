//! # dlp-app
//!
//! Wires the domain engine to the platform and infrastructure adapters:
//! the agent runtime, the CLI command handlers and the git push firewall.

pub mod agent;
pub mod alert_sink;
pub mod cli;
pub mod git_firewall;
pub mod instances;

pub use cli::Cli;
pub use git_firewall::GitFirewall;
