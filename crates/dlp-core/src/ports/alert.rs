//! Alert sink port: modal user popups and admin email reports.

use async_trait::async_trait;

/// Structured admin report, rendered to HTML and mailed by the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminReport {
    ClipboardPaste { preview: String, app: String },
    FileCopy { path: String, app: String },
    GitPush { url: String },
}

/// Both operations are fire-and-forget from the mediator's perspective;
/// implementations must not block the caller on rendering or delivery.
#[async_trait]
pub trait AlertPort: Send + Sync {
    async fn notify_user(&self, title: &str, message: &str);
    async fn notify_admin(&self, report: AdminReport);
}
