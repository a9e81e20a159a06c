//! Classification body extraction
//!
//! Maps a clipboard item to the text body sent to the remote classifier.
//! `None` means "nothing classifiable, safe to restore": binary files,
//! oversize files, unreadable files and images.

use std::path::Path;

use tokio::io::AsyncReadExt;

use crate::item::ClipboardItem;

/// Files larger than this are restored without classification.
pub const MAX_FILE_BYTES: u64 = 2 * 1024 * 1024;
/// A NUL byte within this prefix marks a file as binary.
pub const BINARY_SNIFF_BYTES: usize = 4096;
/// Only this much of a text file is read for classification.
pub const FILE_CLASSIFY_BYTES: usize = 5 * 1024;
/// At most this many bytes are transmitted to the classifier.
pub const CLASSIFY_BYTES: usize = 3000;

pub async fn classification_body(item: &ClipboardItem) -> Option<String> {
    match item {
        ClipboardItem::Text(text) => Some(truncate_utf8(text, CLASSIFY_BYTES).to_owned()),
        ClipboardItem::FileRef(path) => file_body(path).await,
        // Bitmap bytes carry no classifiable text; images are withheld from
        // restoration elsewhere regardless of verdict.
        ClipboardItem::Image(_) => None,
    }
}

async fn file_body(path: &Path) -> Option<String> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    if !meta.is_file() || meta.len() > MAX_FILE_BYTES {
        return None;
    }

    let mut file = tokio::fs::File::open(path).await.ok()?;
    let mut buf = vec![0u8; FILE_CLASSIFY_BYTES];
    let mut filled = 0usize;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await.ok()?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);

    if buf[..buf.len().min(BINARY_SNIFF_BYTES)].contains(&0) {
        return None;
    }

    let text = String::from_utf8_lossy(&buf);
    Some(truncate_utf8(&text, CLASSIFY_BYTES).to_owned())
}

/// Truncate to at most `max` bytes, never splitting a UTF-8 sequence.
pub fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
