//! Clipboard port - abstracts OS clipboard access
//!
//! Take/put ordering is serialized inside the adapter; transient platform
//! failures are retried there and surface here as "no content".

use anyhow::Result;
use async_trait::async_trait;

use crate::item::{ClipboardItem, Fingerprint};

#[async_trait]
pub trait ClipboardPort: Send + Sync {
    /// Current item without mutation.
    async fn snapshot(&self) -> Result<Option<ClipboardItem>>;

    /// Read the current item and atomically empty the clipboard.
    async fn take(&self) -> Result<Option<ClipboardItem>>;

    /// Write the item, replacing prior contents. File references must be
    /// written as platform file objects where available so a paste into a
    /// file manager materializes the file, not its path string.
    async fn put(&self, item: &ClipboardItem) -> Result<()>;

    /// Empty the clipboard.
    async fn clear(&self) -> Result<()>;

    /// Cheap hash of whatever is on the clipboard right now.
    async fn fingerprint_current(&self) -> Result<Option<Fingerprint>>;
}
