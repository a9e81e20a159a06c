//! Events delivered to the mediator by the platform layer.

/// Platform events, delivered in order over an mpsc channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// The foreground application changed.
    AppActivated(String),
}
