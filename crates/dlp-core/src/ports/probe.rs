//! Browser URL probe port.

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UrlProbePort: Send + Sync {
    /// Active URL (or synthetic URL derived from the window title) of the
    /// named browser. Unknown or unreadable yields the empty string, which
    /// the policy layer treats as "not allowed".
    async fn active_url(&self, app: &str) -> Result<String>;
}
