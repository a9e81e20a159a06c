//! End-to-end mediation scenarios over in-memory fake ports.
//!
//! These exercise the §"what the user sees" behaviors: safe text flows back,
//! code stays withheld, allowed browser domains keep receiving the item, and
//! alerts fire at most once per item.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use dlp_core::ports::{AdminReport, AgentEvent, AlertPort, ClassifierPort, ClipboardPort, UrlProbePort};
use dlp_core::{ClipboardItem, Fingerprint, Mediator, MediatorConfig, PolicySet, Verdict};

#[derive(Default)]
struct FakeClipboard {
    slot: Mutex<Option<ClipboardItem>>,
}

impl FakeClipboard {
    fn load(&self, item: ClipboardItem) {
        *self.slot.lock().unwrap() = Some(item);
    }

    fn contents(&self) -> Option<ClipboardItem> {
        self.slot.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClipboardPort for FakeClipboard {
    async fn snapshot(&self) -> anyhow::Result<Option<ClipboardItem>> {
        Ok(self.contents())
    }

    async fn take(&self) -> anyhow::Result<Option<ClipboardItem>> {
        Ok(self.slot.lock().unwrap().take())
    }

    async fn put(&self, item: &ClipboardItem) -> anyhow::Result<()> {
        *self.slot.lock().unwrap() = Some(item.clone());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }

    async fn fingerprint_current(&self) -> anyhow::Result<Option<Fingerprint>> {
        Ok(self.contents().map(|item| item.fingerprint()))
    }
}

#[derive(Default)]
struct FakeProbe {
    url: Mutex<String>,
}

impl FakeProbe {
    fn set_url(&self, url: &str) {
        *self.url.lock().unwrap() = url.to_owned();
    }
}

#[async_trait]
impl UrlProbePort for FakeProbe {
    async fn active_url(&self, _app: &str) -> anyhow::Result<String> {
        Ok(self.url.lock().unwrap().clone())
    }
}

/// Fixed-verdict classifier that counts remote calls.
struct ScriptedClassifier {
    verdict: Verdict,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    fn always(verdict: Verdict) -> Self {
        Self {
            verdict,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassifierPort for ScriptedClassifier {
    async fn classify(&self, _body: &str) -> Verdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
    }
}

#[derive(Default)]
struct RecordingAlerts {
    popups: Mutex<Vec<(String, String)>>,
    reports: Mutex<Vec<AdminReport>>,
}

impl RecordingAlerts {
    fn popup_count(&self) -> usize {
        self.popups.lock().unwrap().len()
    }

    fn reports(&self) -> Vec<AdminReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertPort for RecordingAlerts {
    async fn notify_user(&self, title: &str, message: &str) {
        self.popups
            .lock()
            .unwrap()
            .push((title.to_owned(), message.to_owned()));
    }

    async fn notify_admin(&self, report: AdminReport) {
        self.reports.lock().unwrap().push(report);
    }
}

struct Harness {
    clipboard: Arc<FakeClipboard>,
    probe: Arc<FakeProbe>,
    classifier: Arc<ScriptedClassifier>,
    alerts: Arc<RecordingAlerts>,
    mediator: Arc<Mediator>,
    events: mpsc::Sender<AgentEvent>,
}

fn harness(classifier: ScriptedClassifier) -> Harness {
    let clipboard = Arc::new(FakeClipboard::default());
    let probe = Arc::new(FakeProbe::default());
    let classifier = Arc::new(classifier);
    let alerts = Arc::new(RecordingAlerts::default());
    let mediator = Mediator::new(
        clipboard.clone(),
        probe.clone(),
        classifier.clone(),
        alerts.clone(),
        PolicySet::default(),
        MediatorConfig::default(),
    );
    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(mediator.clone().run(rx));
    Harness {
        clipboard,
        probe,
        classifier,
        alerts,
        mediator,
        events: tx,
    }
}

async fn activate(h: &Harness, app: &str) {
    h.events
        .send(AgentEvent::AppActivated(app.to_owned()))
        .await
        .unwrap();
}

async fn settle() {
    // Paused-time tests: this fast-forwards through every pending timer.
    tokio::time::sleep(Duration::from_secs(1)).await;
}

#[tokio::test(start_paused = true)]
async fn safe_text_is_restored_to_untrusted_app() {
    let h = harness(ScriptedClassifier::always(Verdict::Text));
    let item = ClipboardItem::Text("Hello, meeting at 3pm".into());
    h.clipboard.load(item.clone());

    activate(&h, "Slack").await;
    settle().await;

    assert_eq!(h.clipboard.contents(), Some(item));
    assert_eq!(h.alerts.popup_count(), 0);
    assert!(h.alerts.reports().is_empty());
}

#[tokio::test(start_paused = true)]
async fn known_safe_content_skips_reclassification() {
    let h = harness(ScriptedClassifier::always(Verdict::Text));
    let item = ClipboardItem::Text("Hello, meeting at 3pm".into());
    h.clipboard.load(item.clone());

    activate(&h, "Slack").await;
    settle().await;
    assert_eq!(h.classifier.calls(), 1);

    // Same content, new untrusted destination: restored without a new call.
    activate(&h, "Discord").await;
    settle().await;
    assert_eq!(h.clipboard.contents(), Some(item));
    assert_eq!(h.classifier.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn code_paste_to_chat_app_is_denied_with_one_alert() {
    let h = harness(ScriptedClassifier::always(Verdict::Code));
    let code = ClipboardItem::Text("def f(x): return x*2\nprint(f(10))".into());
    h.clipboard.load(code.clone());

    activate(&h, "Slack").await;
    settle().await;

    assert_eq!(h.clipboard.contents(), None, "code must stay withheld");
    assert_eq!(h.alerts.popup_count(), 1);
    let reports = h.alerts.reports();
    assert_eq!(reports.len(), 1);
    assert!(matches!(
        &reports[0],
        AdminReport::ClipboardPaste { app, .. } if app == "Slack"
    ));

    // Re-activating the destination never re-alerts for the same item.
    activate(&h, "Slack").await;
    settle().await;
    assert_eq!(h.clipboard.contents(), None);
    assert_eq!(h.alerts.popup_count(), 1);
    assert_eq!(h.alerts.reports().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn code_flows_to_allowed_llm_site_and_is_forgotten_after_sustained_allow() {
    let h = harness(ScriptedClassifier::always(Verdict::Code));
    let code = ClipboardItem::Text("fn main() { println!(\"hi\"); }".into());
    h.clipboard.load(code.clone());
    h.probe.set_url("https://chatgpt.com/c/session");

    activate(&h, "Google Chrome").await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(
        h.clipboard.contents(),
        Some(code),
        "watchdog restores on every tick while the domain is allowed"
    );
    assert_eq!(h.alerts.popup_count(), 0);
    assert!(h.alerts.reports().is_empty());
    assert!(h.mediator.status().held_fingerprint.is_some());

    // ≈5 s of sustained allow drops the held item to free the capture cycle.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.mediator.status().held_fingerprint, None);
    assert!(h.mediator.status().watchdog_running);
}

#[tokio::test(start_paused = true)]
async fn code_is_withheld_on_disallowed_page_then_released_on_allowed_tab() {
    let h = harness(ScriptedClassifier::always(Verdict::Code));
    let code = ClipboardItem::Text("class Exfil {}".into());
    h.clipboard.load(code.clone());
    h.probe.set_url("https://example.com/");

    activate(&h, "Google Chrome").await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(h.clipboard.contents(), None);
    assert_eq!(h.alerts.popup_count(), 1);
    assert_eq!(h.alerts.reports().len(), 1);

    // Switching tabs to an allowed domain releases the cached-Code item.
    h.probe.set_url("https://chatgpt.com/");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.clipboard.contents(), Some(code));
    // Still only the original alert pair.
    assert_eq!(h.alerts.popup_count(), 1);
    assert_eq!(h.alerts.reports().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn binary_file_copy_is_restored_without_classification() {
    let h = harness(ScriptedClassifier::always(Verdict::Code));

    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(b"\x89PNG\x0d\x0a\x1a\x0a\x00\x00binary").unwrap();
    let item = ClipboardItem::FileRef(tmp.path().to_path_buf());
    h.clipboard.load(item.clone());

    activate(&h, "Slack").await;
    settle().await;

    assert_eq!(h.clipboard.contents(), Some(item));
    assert_eq!(h.classifier.calls(), 0);
    assert_eq!(h.alerts.popup_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn copy_inside_browser_is_captured_and_withheld() {
    let h = harness(ScriptedClassifier::always(Verdict::Code));
    h.probe.set_url("https://example.com/");

    activate(&h, "Google Chrome").await;
    settle().await;

    // The user copies code while browsing a non-allowed page.
    h.clipboard
        .load(ClipboardItem::Text("SELECT * FROM users;".into()));
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(h.clipboard.contents(), None);
    assert!(h.mediator.status().held_fingerprint.is_some());
}

#[tokio::test(start_paused = true)]
async fn switching_to_trusted_app_restores_withheld_item() {
    let h = harness(ScriptedClassifier::always(Verdict::Code));
    let code = ClipboardItem::Text("let secret = 42;".into());
    h.clipboard.load(code.clone());

    activate(&h, "Slack").await;
    settle().await;
    assert_eq!(h.clipboard.contents(), None);

    activate(&h, "Code").await;
    settle().await;
    assert_eq!(h.clipboard.contents(), Some(code));
}

#[tokio::test(start_paused = true)]
async fn watchdog_stops_on_app_switch() {
    let h = harness(ScriptedClassifier::always(Verdict::Text));
    h.probe.set_url("https://example.com/");

    activate(&h, "Google Chrome").await;
    settle().await;
    assert!(h.mediator.status().watchdog_running);

    activate(&h, "Slack").await;
    settle().await;
    assert!(!h.mediator.status().watchdog_running);
}

#[tokio::test(start_paused = true)]
async fn image_content_is_never_restored() {
    let h = harness(ScriptedClassifier::always(Verdict::Text));
    h.clipboard.load(ClipboardItem::Image(vec![0u8; 256]));

    activate(&h, "Slack").await;
    settle().await;

    assert_eq!(h.clipboard.contents(), None);
    assert_eq!(h.classifier.calls(), 0);
    assert_eq!(h.alerts.popup_count(), 0);
}
