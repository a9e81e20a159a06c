//! Compiled-in policy sets
//!
//! All policy is constant for this version: trusted applications, browsers
//! subject to per-domain checks, allowed destination domains, banned
//! screen-capture processes and the git remote whitelist.

/// Destination class of a foreground application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Paste freely, restore anything held
    Trusted,
    /// Per-domain policy, enforced by the browser watchdog
    Browser,
    /// Capture-then-classify
    Untrusted,
}

#[derive(Debug, Clone)]
pub struct PolicySet {
    pub allowed_apps: Vec<String>,
    pub browser_apps: Vec<String>,
    pub allowed_domains: Vec<String>,
    pub banned_processes: Vec<String>,
    pub banned_window_titles: Vec<String>,
    pub git_whitelist: Vec<String>,
}

/// argv[0] names that must never be reaped even when they substring-match a
/// banned process name (dev tooling spawns these constantly).
const INTERPRETER_EXEMPT: &[&str] = &["node", "python", "electron"];

impl Default for PolicySet {
    fn default() -> Self {
        let strings = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            allowed_apps: strings(&[
                "Code",
                "Electron",
                "PyCharm",
                "IntelliJ IDEA",
                "CLion",
                "PhpStorm",
                "WebStorm",
                "Sublime Text",
                "sublime_text",
                "Xcode",
                "Terminal",
                "iTerm2",
                "WindowsTerminal",
                "idea64",
                "pycharm64",
                "devenv",
            ]),
            browser_apps: strings(&[
                "Google Chrome",
                "chrome",
                "Safari",
                "Firefox",
                "Microsoft Edge",
                "msedge",
                "Brave Browser",
                "brave",
                "Arc",
            ]),
            allowed_domains: strings(&[
                "chatgpt.com",
                "chat.openai.com",
                "gemini.google.com",
                "claude.ai",
                "copilot.microsoft.com",
                "gitlab.siguna.co",
            ]),
            banned_processes: strings(&[
                "Screenshot",
                "Grab",
                "Skitch",
                "Lightshot",
                "Gyazo",
                "screencapture",
                "CleanShot",
                "Monosnap",
                "Snip",
                "SnippingTool",
                "ScreenSketch",
                "ShareX",
                "Greenshot",
            ]),
            banned_window_titles: strings(&[
                "Snipping Tool",
                "Snip & Sketch",
                "ShareX",
                "Lightshot",
                "Greenshot",
            ]),
            git_whitelist: strings(&["gitlab.siguna.co", "mycompany.internal"]),
        }
    }
}

/// Case-insensitive application-name form: lowercased, `.exe` stripped.
/// Windows reports executable names, macOS reports localized bundle names.
fn normalize(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    lower
        .strip_suffix(".exe")
        .map(str::to_owned)
        .unwrap_or(lower)
}

impl PolicySet {
    pub fn is_allowed_app(&self, app: &str) -> bool {
        let app = normalize(app);
        self.allowed_apps.iter().any(|a| normalize(a) == app)
    }

    pub fn is_browser(&self, app: &str) -> bool {
        let app = normalize(app);
        self.browser_apps.iter().any(|a| normalize(a) == app)
    }

    pub fn classify_destination(&self, app: &str) -> Destination {
        if self.is_allowed_app(app) {
            Destination::Trusted
        } else if self.is_browser(app) {
            Destination::Browser
        } else {
            Destination::Untrusted
        }
    }

    /// An empty URL (probe failure, unknown title) is never allowed.
    pub fn domain_allowed(&self, url: &str) -> bool {
        !url.is_empty() && self.allowed_domains.iter().any(|d| url.contains(d.as_str()))
    }

    /// Substring match over process name, executable path or argv[0].
    /// Interpreter names are exempt from argv[0] matching.
    pub fn matches_banned_process(&self, candidate: &str, is_argv0: bool) -> bool {
        let lower = candidate.to_ascii_lowercase();
        if is_argv0
            && INTERPRETER_EXEMPT
                .iter()
                .any(|exempt| lower.contains(exempt))
        {
            return false;
        }
        self.banned_processes
            .iter()
            .any(|banned| lower.contains(&banned.to_ascii_lowercase()))
    }

    pub fn matches_banned_title(&self, title: &str) -> bool {
        let lower = title.to_ascii_lowercase();
        self.banned_window_titles
            .iter()
            .any(|banned| lower.contains(&banned.to_ascii_lowercase()))
    }

    /// Git push firewall decision: allow iff the remote URL contains any
    /// whitelist entry.
    pub fn push_allowed(&self, remote_url: &str) -> bool {
        self.git_whitelist
            .iter()
            .any(|entry| remote_url.contains(entry.as_str()))
    }
}
