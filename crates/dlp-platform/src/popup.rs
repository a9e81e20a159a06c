//! Modal policy-violation popup
//!
//! Critical-style, foreground, single dismiss button, auto-dismissing after
//! a few seconds of inactivity. Callers spawn this; it must never block the
//! mediator.

#[cfg(any(target_os = "macos", windows))]
const AUTO_DISMISS_SECS: u64 = 6;

/// Show the popup and wait for dismissal (user click or timeout).
pub async fn show(title: &str, message: &str) {
    show_impl(title, message).await;
}

#[cfg(target_os = "macos")]
async fn show_impl(title: &str, message: &str) {
    use std::process::Stdio;

    let script = format!(
        "display dialog \"{}\" with title \"{}\" buttons {{\"Dismiss\"}} \
         default button 1 with icon caution giving up after {}",
        escape_applescript(message),
        escape_applescript(title),
        AUTO_DISMISS_SECS,
    );
    let result = tokio::process::Command::new("osascript")
        .arg("-e")
        .arg(script)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = result {
        tracing::warn!(error = %e, "failed to display popup");
    }
}

#[cfg(target_os = "macos")]
fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(windows)]
async fn show_impl(title: &str, message: &str) {
    let title = title.to_owned();
    let message = message.to_owned();
    let result = tokio::task::spawn_blocking(move || {
        use std::ptr;
        use winapi::um::winuser::{
            FindWindowW, MessageBoxW, PostMessageW, MB_ICONWARNING, MB_OK, MB_SETFOREGROUND,
            MB_SYSTEMMODAL, WM_CLOSE,
        };

        let wide_title = wide(&title);
        let wide_message = wide(&message);

        // MessageBoxW has no timeout; a companion thread closes the box by
        // title after the auto-dismiss window.
        let closer_title = wide_title.clone();
        let closer = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_secs(AUTO_DISMISS_SECS));
            unsafe {
                let hwnd = FindWindowW(ptr::null(), closer_title.as_ptr());
                if !hwnd.is_null() {
                    PostMessageW(hwnd, WM_CLOSE, 0, 0);
                }
            }
        });

        unsafe {
            MessageBoxW(
                ptr::null_mut(),
                wide_message.as_ptr(),
                wide_title.as_ptr(),
                MB_OK | MB_ICONWARNING | MB_SYSTEMMODAL | MB_SETFOREGROUND,
            );
        }
        let _ = closer.join();
    })
    .await;
    if let Err(e) = result {
        tracing::warn!(error = %e, "popup task failed");
    }
}

#[cfg(windows)]
fn wide(text: &str) -> Vec<u16> {
    use std::os::windows::ffi::OsStrExt;
    std::ffi::OsStr::new(text)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

#[cfg(not(any(target_os = "macos", windows)))]
async fn show_impl(title: &str, message: &str) {
    // No native dialog surface wired up on this platform.
    tracing::warn!(%title, %message, "policy violation (no popup surface)");
}
