//! Window-title keyword heuristic for browsers without a URL query.

const TITLE_HINTS: &[(&str, &str)] = &[
    ("chatgpt", "https://chatgpt.com"),
    ("gemini", "https://gemini.google.com"),
    ("claude", "https://claude.ai"),
    ("copilot", "https://copilot.microsoft.com"),
    ("deepseek", "https://chat.deepseek.com"),
    ("grok", "https://grok.com"),
];

/// Synthetic URL for a window title; unknown titles yield the empty string
/// (which the policy layer treats as "not allowed").
pub fn url_from_title(title: &str) -> String {
    let lower = title.to_ascii_lowercase();
    TITLE_HINTS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, url)| (*url).to_owned())
        .unwrap_or_default()
}
