//! Tracing bootstrap
//!
//! Env-filtered fmt subscriber: `info` by default, overridable with
//! `RUST_LOG`. Called once in `main` before the runtime starts.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
    if let Err(e) = result {
        eprintln!("failed to initialize tracing subscriber: {e}");
    }
}
