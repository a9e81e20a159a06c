//! Content classifier port.

use async_trait::async_trait;

use crate::item::Verdict;

#[async_trait]
pub trait ClassifierPort: Send + Sync {
    /// Label a text body as `Text` or `Code`. Implementations fail closed:
    /// any transport or decoding failure returns `Code`. Never `Unknown`.
    async fn classify(&self, body: &str) -> Verdict;
}
