//! Clipboard mediator
//!
//! The per-process state machine binding the clipboard adapter, the
//! foreground-app source, the classifier and the alert sink. For every
//! stable (current_app, held_item, verdict) tuple it decides whether the OS
//! clipboard contains the item or is empty, and when to notify.
//!
//! The synchronous guarantee this design leans on: the destination
//! application's paste keystroke cannot be preempted cross-platform, but the
//! clipboard contents can. Clearing the clipboard on entry to an untrusted
//! app makes a paste during classification produce nothing; a `Text` verdict
//! restores (net allow), a `Code` verdict leaves the clipboard empty
//! (terminal deny).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::body;
use crate::cache::VerdictCache;
use crate::item::{ClipboardItem, Fingerprint, Verdict};
use crate::policy::{Destination, PolicySet};
use crate::ports::{AdminReport, AgentEvent, AlertPort, ClassifierPort, ClipboardPort, UrlProbePort};
use crate::state::MediatorState;
use crate::watchdog;

pub const ALERT_TITLE: &str = "Policy Violation";
pub const ALERT_MESSAGE: &str = "Copying source code to external apps is restricted.";

const PREVIEW_CHARS: usize = 200;

/// Timing knobs. Defaults match production behavior; tests tighten them.
#[derive(Debug, Clone)]
pub struct MediatorConfig {
    /// Settle delay before a scheduled alert fires.
    pub settle_delay: Duration,
    /// Watchdog cadence while an item is held.
    pub watchdog_tick: Duration,
    /// Watchdog cadence while nothing is held.
    pub watchdog_idle: Duration,
    /// Sustained browser-allow time after which a held item is forgotten,
    /// freeing the capture cycle for new copies.
    pub allow_forget_after: Duration,
}

impl Default for MediatorConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(100),
            watchdog_tick: Duration::from_millis(150),
            watchdog_idle: Duration::from_millis(300),
            allow_forget_after: Duration::from_secs(5),
        }
    }
}

/// Read-only view of the mediator, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediatorStatus {
    pub current_app: String,
    pub held_fingerprint: Option<Fingerprint>,
    pub verdict: Verdict,
    pub browser_allowed: bool,
    pub watchdog_running: bool,
}

pub struct Mediator {
    pub(crate) clipboard: Arc<dyn ClipboardPort>,
    pub(crate) probe: Arc<dyn UrlProbePort>,
    pub(crate) classifier: Arc<dyn ClassifierPort>,
    pub(crate) alerts: Arc<dyn AlertPort>,
    pub(crate) policy: PolicySet,
    pub(crate) config: MediatorConfig,
    pub(crate) cache: VerdictCache,
    pub(crate) state: Mutex<MediatorState>,
}

impl Mediator {
    pub fn new(
        clipboard: Arc<dyn ClipboardPort>,
        probe: Arc<dyn UrlProbePort>,
        classifier: Arc<dyn ClassifierPort>,
        alerts: Arc<dyn AlertPort>,
        policy: PolicySet,
        config: MediatorConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            clipboard,
            probe,
            classifier,
            alerts,
            policy,
            config,
            cache: VerdictCache::default(),
            state: Mutex::new(MediatorState::default()),
        })
    }

    /// Consume platform events until the channel closes. Events arrive in
    /// order; the handler itself stays short and offloads classification and
    /// alerting to spawned tasks.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<AgentEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                AgentEvent::AppActivated(app) => self.on_app_activated(app).await,
            }
        }
        debug!("event channel closed, mediator stopping");
    }

    pub fn status(&self) -> MediatorStatus {
        let st = self.lock_state();
        MediatorStatus {
            current_app: st.current_app.clone(),
            held_fingerprint: st.held_fingerprint,
            verdict: st.verdict,
            browser_allowed: st.browser_allowed,
            watchdog_running: st
                .watchdog
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Acquire)),
        }
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, MediatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn on_app_activated(self: &Arc<Self>, new_app: String) {
        info!(app = %new_app, "foreground application changed");

        // Stop any running watchdog before acting on the new destination.
        let old_flag = {
            let mut st = self.lock_state();
            st.current_app = new_app.clone();
            st.watchdog.take()
        };
        if let Some(flag) = old_flag {
            flag.store(false, Ordering::Release);
        }

        match self.policy.classify_destination(&new_app) {
            Destination::Trusted => self.enter_trusted().await,
            Destination::Browser => self.enter_browser(new_app).await,
            Destination::Untrusted => self.enter_untrusted(new_app).await,
        }
    }

    /// Trusted destination: anything withheld goes straight back.
    async fn enter_trusted(self: &Arc<Self>) {
        let held = {
            let mut st = self.lock_state();
            st.drop_held()
        };
        if let Some(item) = held {
            debug!("restoring held item to trusted destination");
            self.restore(&item).await;
        }
    }

    async fn enter_browser(self: &Arc<Self>, browser: String) {
        if let Some(item) = self.take_clipboard().await {
            let fp = item.fingerprint();
            if self.is_known_safe(fp) {
                self.restore(&item).await;
            } else {
                {
                    let mut st = self.lock_state();
                    st.hold(item.clone(), &browser);
                }
                self.spawn_classification(item, browser.clone());
            }
        }

        let flag = Arc::new(AtomicBool::new(true));
        {
            let mut st = self.lock_state();
            st.browser_allowed = false;
            st.watchdog = Some(flag.clone());
        }
        let mediator = self.clone();
        tokio::spawn(async move {
            watchdog::run(mediator, browser, flag).await;
        });
    }

    async fn enter_untrusted(self: &Arc<Self>, dest: String) {
        let mut captured = self.take_clipboard().await;
        if captured.is_none() {
            // A re-activation while an item is withheld: re-evaluate it
            // against the new destination.
            captured = self.lock_state().held_item.clone();
        }
        let Some(item) = captured else {
            return;
        };

        // Defense in depth; take() has usually emptied the clipboard already.
        if let Err(e) = self.clipboard.clear().await {
            warn!(error = %e, "failed to clear clipboard on app switch");
        }

        let fp = item.fingerprint();
        if self.is_known_safe(fp) {
            self.restore(&item).await;
            return;
        }

        {
            let mut st = self.lock_state();
            st.hold(item.clone(), &dest);
        }
        self.spawn_classification(item, dest);
    }

    fn is_known_safe(&self, fp: Fingerprint) -> bool {
        self.lock_state().safe_fingerprint == Some(fp)
    }

    pub(crate) async fn take_clipboard(&self) -> Option<ClipboardItem> {
        match self.clipboard.take().await {
            Ok(item) => item,
            Err(e) => {
                warn!(error = %e, "clipboard take failed, treating as empty");
                None
            }
        }
    }

    /// Write an item back and record its fingerprint for change detection.
    /// Images are never restored.
    pub(crate) async fn restore(&self, item: &ClipboardItem) {
        if item.is_image() {
            debug!("image content is never restored");
            return;
        }
        match self.clipboard.put(item).await {
            Ok(()) => {
                self.lock_state().last_clipboard_fingerprint = Some(item.fingerprint());
            }
            Err(e) => warn!(error = %e, "clipboard restore failed"),
        }
    }

    pub(crate) fn spawn_classification(self: &Arc<Self>, item: ClipboardItem, dest_app: String) {
        let mediator = self.clone();
        tokio::spawn(async move {
            mediator.classify_held(item, dest_app).await;
        });
    }

    /// Async classification task for one captured item.
    async fn classify_held(self: Arc<Self>, item: ClipboardItem, dest_app: String) {
        let fp = item.fingerprint();

        let verdict = match body::classification_body(&item).await {
            // Binary, oversize, unreadable, image: nothing to classify,
            // safe to release.
            None => Verdict::Text,
            Some(text) => match self.cache.get(&fp) {
                Some(cached) => cached,
                None => {
                    let verdict = self.classifier.classify(&text).await;
                    self.cache.insert(fp, verdict);
                    verdict
                }
            },
        };

        {
            let mut st = self.lock_state();
            if st.held_fingerprint != Some(fp) {
                // Superseded by a newer capture while we were classifying.
                debug!(%fp, "classification result discarded, item superseded");
                return;
            }
            st.verdict = verdict;
        }

        match verdict {
            Verdict::Text => {
                debug!(%fp, "verdict: text, releasing");
                {
                    let mut st = self.lock_state();
                    st.drop_held();
                    st.safe_fingerprint = Some(fp);
                }
                self.restore(&item).await;
            }
            Verdict::Code => {
                debug!(%fp, "verdict: code, withholding");
                let schedule = {
                    let mut st = self.lock_state();
                    !st.warned_fingerprints.contains(&fp) && st.warning_inflight.insert(fp)
                };
                if schedule {
                    let report = admin_report(&item, &dest_app);
                    let mediator = self.clone();
                    tokio::spawn(async move {
                        mediator.delayed_alert(fp, report, dest_app).await;
                    });
                }
            }
            // The classifier contract excludes Unknown.
            Verdict::Unknown => warn!(%fp, "classifier returned no verdict, item stays withheld"),
        }
    }

    /// Delayed alert task: fires at most once per fingerprint per session,
    /// after a settle delay that lets rapid app switches cancel the popup.
    async fn delayed_alert(self: Arc<Self>, fp: Fingerprint, report: AdminReport, dest_app: String) {
        tokio::time::sleep(self.config.settle_delay).await;

        let context = {
            let mut st = self.lock_state();
            st.warning_inflight.remove(&fp);
            if st.verdict != Verdict::Code || st.warned_fingerprints.contains(&fp) {
                None
            } else {
                st.warned_fingerprints.insert(fp);
                Some((st.current_app.clone(), st.browser_allowed))
            }
        };
        let Some((current_app, browser_allowed)) = context else {
            return;
        };

        let browser_dest = self.policy.is_browser(&dest_app);
        let suppressed = self.policy.is_allowed_app(&dest_app) || (browser_dest && browser_allowed);

        if current_app == dest_app && !suppressed {
            let alerts = self.alerts.clone();
            tokio::spawn(async move {
                alerts.notify_user(ALERT_TITLE, ALERT_MESSAGE).await;
            });
        }

        if !suppressed {
            info!(%fp, app = %dest_app, "queueing admin alert");
            let alerts = self.alerts.clone();
            tokio::spawn(async move {
                alerts.notify_admin(report).await;
            });
        }
    }
}

fn admin_report(item: &ClipboardItem, dest_app: &str) -> AdminReport {
    match item {
        ClipboardItem::FileRef(path) => AdminReport::FileCopy {
            path: path.to_string_lossy().into_owned(),
            app: dest_app.to_owned(),
        },
        _ => AdminReport::ClipboardPaste {
            preview: item.preview(PREVIEW_CHARS),
            app: dest_app.to_owned(),
        },
    }
}
