//! Shared mediator state
//!
//! One owned struct behind a single process-wide mutex. Worker tasks hold a
//! cheap `Arc` to the [`crate::Mediator`] and take the lock for short,
//! await-free critical sections.

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::item::{ClipboardItem, Fingerprint, Verdict};

#[derive(Default)]
pub struct MediatorState {
    /// Item currently withheld from the OS clipboard, if any.
    pub held_item: Option<ClipboardItem>,
    pub held_fingerprint: Option<Fingerprint>,

    /// Fingerprint of the most recent item classified as `Text`; lets the
    /// same safe content skip re-evaluation when it reappears.
    pub safe_fingerprint: Option<Fingerprint>,

    /// Verdict for the held item.
    pub verdict: Verdict,

    /// Foreground application, as last reported by the app source.
    pub current_app: String,
    /// Application that was foreground when the held item was captured.
    pub source_app: String,

    /// Last observed domain-policy decision for the foreground browser.
    pub browser_allowed: bool,

    /// Cancellation flag of the running browser watchdog. Cleared (and the
    /// flag lowered) on every app switch; at most one watchdog runs.
    pub watchdog: Option<Arc<AtomicBool>>,

    /// Change detection for the watchdog's in-browser copy loop.
    pub last_clipboard_fingerprint: Option<Fingerprint>,

    /// Fingerprints that already produced a user-visible alert this session.
    pub warned_fingerprints: HashSet<Fingerprint>,
    /// Fingerprints with a delayed-alert task currently scheduled.
    pub warning_inflight: HashSet<Fingerprint>,
}

impl MediatorState {
    pub fn hold(&mut self, item: ClipboardItem, source_app: &str) -> Fingerprint {
        let fp = item.fingerprint();
        self.held_item = Some(item);
        self.held_fingerprint = Some(fp);
        self.verdict = Verdict::Unknown;
        self.source_app = source_app.to_owned();
        fp
    }

    pub fn drop_held(&mut self) -> Option<ClipboardItem> {
        self.held_fingerprint = None;
        self.held_item.take()
    }
}
