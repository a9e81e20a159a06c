//! Port interfaces between the mediation engine and the outside world
//!
//! Ports keep the mediator OS-agnostic: one implementation per operating
//! system lives in `dlp-platform`/`dlp-infra`, and in-memory fakes implement
//! the same traits for the scenario tests.

mod alert;
mod classifier;
mod clipboard;
mod events;
mod probe;

pub use alert::{AdminReport, AlertPort};
pub use classifier::ClassifierPort;
pub use clipboard::ClipboardPort;
pub use events::AgentEvent;
pub use probe::UrlProbePort;
