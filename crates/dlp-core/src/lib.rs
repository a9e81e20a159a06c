//! # dlp-core
//!
//! Core domain models and mediation logic for the DLP agent.
//!
//! This crate contains the clipboard mediation engine and the policy model
//! without any platform or infrastructure dependencies. OS clipboards,
//! foreground-application sources, browser probes, the remote classifier and
//! the alert sink are all reached through the port traits in [`ports`]; the
//! agent binary wires in the real adapters, tests wire in in-memory fakes.

pub mod body;
pub mod cache;
pub mod item;
pub mod mediator;
pub mod policy;
pub mod ports;
pub mod state;
mod watchdog;

// Re-export commonly used types at the crate root
pub use cache::VerdictCache;
pub use item::{ClipboardItem, Fingerprint, Verdict};
pub use mediator::{Mediator, MediatorConfig, MediatorStatus};
pub use policy::{Destination, PolicySet};
pub use ports::{AdminReport, AgentEvent};
