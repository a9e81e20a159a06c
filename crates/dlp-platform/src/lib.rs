//! # dlp-platform
//!
//! Operating-system adapters behind the `dlp-core` ports: the system
//! clipboard, the foreground-application source, the browser URL probe, the
//! modal popup, the screenshot-tool reaper, the single-instance gate and the
//! auto-start installers. macOS and Windows are first-class; the clipboard
//! adapter also works on Linux through `clipboard-rs`.

pub mod autostart;
pub mod clipboard;
pub mod foreground;
pub mod popup;
pub mod probe;
pub mod reaper;
pub mod single_instance;

pub use clipboard::SystemClipboard;
pub use probe::OsUrlProbe;
pub use reaper::Reaper;
pub use single_instance::InstanceLock;
