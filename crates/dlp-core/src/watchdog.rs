//! Browser watchdog
//!
//! Domain-scoped release loop that runs while a browser holds the
//! foreground. Each tick refreshes the URL-policy decision, detects copies
//! made inside the browser, and either keeps restoring the held item (so
//! repeated pastes succeed on an allowed domain) or keeps the clipboard
//! empty. Cancelled by flag on the next app switch; at most one instance
//! runs at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::item::ClipboardItem;
use crate::mediator::Mediator;

pub(crate) async fn run(mediator: Arc<Mediator>, browser: String, active: Arc<AtomicBool>) {
    debug!(app = %browser, "browser watchdog started");
    let mut allowed_since: Option<Instant> = None;

    while active.load(Ordering::Acquire) {
        if mediator.lock_state().current_app != browser {
            break;
        }

        // 1. Refresh the domain-policy decision.
        let url = match mediator.probe.active_url(&browser).await {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "url probe failed, treating as not allowed");
                String::new()
            }
        };
        let allowed = mediator.policy.domain_allowed(&url);
        mediator.lock_state().browser_allowed = allowed;

        // 2. A clipboard change means the user copied something inside the
        //    browser; capture it and classify.
        if let Some(changed) = detect_change(&mediator).await {
            let fp = changed.fingerprint();
            if mediator.lock_state().safe_fingerprint == Some(fp) {
                mediator.restore(&changed).await;
            } else {
                {
                    let mut st = mediator.lock_state();
                    st.hold(changed.clone(), &browser);
                }
                mediator.spawn_classification(changed, browser.clone());
            }
        }

        // 3. Enforce the current decision on the held item, if any.
        let held = mediator.lock_state().held_item.clone();
        match held {
            Some(item) => {
                if allowed {
                    mediator.restore(&item).await;
                    let now = Instant::now();
                    let since = *allowed_since.get_or_insert(now);
                    if now.duration_since(since) >= mediator.config.allow_forget_after {
                        debug!("sustained allow, forgetting held item");
                        let mut st = mediator.lock_state();
                        st.drop_held();
                        allowed_since = None;
                    }
                } else {
                    if let Err(e) = mediator.clipboard.clear().await {
                        warn!(error = %e, "watchdog clear failed");
                    }
                    allowed_since = None;
                }
                tokio::time::sleep(mediator.config.watchdog_tick).await;
            }
            None => {
                allowed_since = None;
                tokio::time::sleep(mediator.config.watchdog_idle).await;
            }
        }
    }
    debug!(app = %browser, "browser watchdog stopped");
}

/// Take the clipboard only when its fingerprint differs from the last one we
/// wrote or observed; restoring every tick must not look like a user copy.
async fn detect_change(mediator: &Arc<Mediator>) -> Option<ClipboardItem> {
    let current = match mediator.clipboard.fingerprint_current().await {
        Ok(fp) => fp?,
        Err(e) => {
            warn!(error = %e, "clipboard fingerprint failed");
            return None;
        }
    };
    if mediator.lock_state().last_clipboard_fingerprint == Some(current) {
        return None;
    }
    let taken = mediator.take_clipboard().await;
    if taken.is_some() {
        mediator.lock_state().last_clipboard_fingerprint = Some(current);
    }
    taken
}
