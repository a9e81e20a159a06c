//! System clipboard adapter over `clipboard-rs`
//!
//! All operations funnel through one `Mutex<ClipboardContext>` inside
//! `spawn_blocking`, so take/put/clear are serialized process-locally. The
//! OS clipboard itself can be busy (another process holding it open); reads
//! that fail while a known format is present are retried a bounded number of
//! times before being reported as empty.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clipboard_rs::common::RustImage;
use clipboard_rs::{Clipboard, ClipboardContext, ContentFormat};
use tokio::task::spawn_blocking;
use tracing::{debug, warn};

use dlp_core::item::{ClipboardItem, Fingerprint};
use dlp_core::ports::ClipboardPort;

const OPEN_RETRIES: usize = 10;
const RETRY_SPACING: Duration = Duration::from_millis(50);

pub struct SystemClipboard {
    inner: Arc<Mutex<ClipboardContext>>,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let context = ClipboardContext::new()
            .map_err(|e| anyhow::anyhow!("failed to create clipboard context: {}", e))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(context)),
        })
    }

    async fn with_context<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&ClipboardContext) -> Result<T> + Send + 'static,
    {
        let inner = self.inner.clone();
        spawn_blocking(move || {
            let guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
            op(&guard)
        })
        .await
        .map_err(|e| anyhow::anyhow!("clipboard task join error: {}", e))?
    }
}

/// Read priority: files > image > text, matching how pasteboards advertise
/// multi-representation content. Returns None when nothing is readable.
fn read_item(ctx: &ClipboardContext) -> Option<ClipboardItem> {
    if let Ok(files) = ctx.get_files() {
        if let Some(first) = files.into_iter().next() {
            return Some(ClipboardItem::FileRef(normalize_file_uri(&first)));
        }
    }

    if ctx.has(ContentFormat::Image) {
        if let Ok(image) = ctx.get_image() {
            if let Ok(png) = image.to_png() {
                return Some(ClipboardItem::Image(png.get_bytes().to_vec()));
            }
        }
    }

    if let Ok(text) = ctx.get_text() {
        if !text.is_empty() {
            return Some(ClipboardItem::Text(text));
        }
    }

    None
}

/// A read that comes back empty while the clipboard advertises a format is a
/// transient open failure; retry briefly before treating it as empty.
fn read_item_with_retry(ctx: &ClipboardContext) -> Option<ClipboardItem> {
    for attempt in 0..OPEN_RETRIES {
        if let Some(item) = read_item(ctx) {
            return Some(item);
        }
        let advertised = ctx.has(ContentFormat::Text)
            || ctx.has(ContentFormat::Files)
            || ctx.has(ContentFormat::Image);
        if !advertised {
            return None;
        }
        debug!(attempt, "clipboard busy, retrying read");
        std::thread::sleep(RETRY_SPACING);
    }
    None
}

/// `get_files` may hand back `file://` URIs depending on platform; file
/// references must be plain absolute paths.
fn normalize_file_uri(raw: &str) -> PathBuf {
    let path = raw.strip_prefix("file://").unwrap_or(raw);
    PathBuf::from(path.replace("%20", " "))
}

#[async_trait]
impl ClipboardPort for SystemClipboard {
    async fn snapshot(&self) -> Result<Option<ClipboardItem>> {
        self.with_context(|ctx| Ok(read_item(ctx))).await
    }

    async fn take(&self) -> Result<Option<ClipboardItem>> {
        self.with_context(|ctx| {
            let item = read_item_with_retry(ctx);
            if item.is_some() {
                if let Err(e) = ctx.clear() {
                    warn!("failed to empty clipboard after read: {}", e);
                }
            }
            Ok(item)
        })
        .await
    }

    async fn put(&self, item: &ClipboardItem) -> Result<()> {
        let item = item.clone();
        self.with_context(move |ctx| match item {
            ClipboardItem::Text(text) => ctx
                .set_text(text)
                .map_err(|e| anyhow::anyhow!("failed to write text: {}", e)),
            ClipboardItem::FileRef(path) => {
                let path_str = path.to_string_lossy().into_owned();
                // Prefer the platform file object so a paste into a file
                // manager materializes the file, not its path string.
                if let Err(e) = ctx.set_files(vec![path_str.clone()]) {
                    warn!("file-object write unavailable, degrading to path text: {}", e);
                    return ctx
                        .set_text(path_str)
                        .map_err(|e| anyhow::anyhow!("failed to write path text: {}", e));
                }
                Ok(())
            }
            ClipboardItem::Image(_) => {
                // Images are never restored (screen-capture defense).
                warn!("refusing to write image content back to the clipboard");
                Ok(())
            }
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        self.with_context(|ctx| {
            ctx.clear()
                .map_err(|e| anyhow::anyhow!("failed to clear clipboard: {}", e))
        })
        .await
    }

    async fn fingerprint_current(&self) -> Result<Option<Fingerprint>> {
        self.with_context(|ctx| Ok(read_item(ctx).map(|item| item.fingerprint())))
            .await
    }
}
