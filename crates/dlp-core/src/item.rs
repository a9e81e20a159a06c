//! Clipboard item model
//!
//! A clipboard item is a tagged value: text, a file reference, or (on
//! platforms with bitmap capture) an image. Identity is by content
//! fingerprint, never by pointer or timestamp.

use std::fmt;
use std::path::PathBuf;

use twox_hash::xxh3::hash128;

/// Content-addressed identifier of a clipboard item.
///
/// XXH3-128 over the canonical byte form: UTF-8 bytes for text, the absolute
/// path string for file references, the raw bytes for images. Collision
/// resistance at 128 bits is sufficient here; the fingerprint gates cache
/// lookups and alert de-duplication, not security decisions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u128);

impl Fingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(hash128(bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({:032x})", self.0)
    }
}

/// Classifier label for a content body.
///
/// `Unknown` means classification has not yet returned for this fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Unknown,
    Text,
    Code,
}

/// A single clipboard entry as captured from the OS clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardItem {
    /// UTF-8 text
    Text(String),
    /// Absolute path of a copied file
    FileRef(PathBuf),
    /// Raw bitmap bytes; classified like text but never restored
    Image(Vec<u8>),
}

impl ClipboardItem {
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Self::Text(text) => Fingerprint::of_bytes(text.as_bytes()),
            Self::FileRef(path) => Fingerprint::of_bytes(path.to_string_lossy().as_bytes()),
            Self::Image(bytes) => Fingerprint::of_bytes(bytes),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::FileRef(_))
    }

    /// Short human-readable preview used in admin alerts.
    pub fn preview(&self, max_chars: usize) -> String {
        match self {
            Self::Text(text) => {
                let mut preview: String = text.chars().take(max_chars).collect();
                if text.chars().count() > max_chars {
                    preview.push('…');
                }
                preview
            }
            Self::FileRef(path) => path.to_string_lossy().into_owned(),
            Self::Image(bytes) => format!("[image, {} bytes]", bytes.len()),
        }
    }
}
