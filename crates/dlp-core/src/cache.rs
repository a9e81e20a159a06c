//! Process-lifetime classification cache
//!
//! Fingerprint → Verdict, grown monotonically, never invalidated before
//! process exit. The working set is small (one entry per distinct copied
//! item); the cap only guards against pathological sessions.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::item::{Fingerprint, Verdict};

const DEFAULT_CAP: usize = 1024;

pub struct VerdictCache {
    entries: Mutex<HashMap<Fingerprint, Verdict>>,
    cap: usize,
}

impl Default for VerdictCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAP)
    }
}

impl VerdictCache {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            cap,
        }
    }

    pub fn get(&self, fp: &Fingerprint) -> Option<Verdict> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(fp)
            .copied()
    }

    /// First decision wins; `Unknown` is never stored. Inserts past the soft
    /// cap are dropped rather than evicting earlier decisions.
    pub fn insert(&self, fp: Fingerprint, verdict: Verdict) {
        if verdict == Verdict::Unknown {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.cap && !entries.contains_key(&fp) {
            return;
        }
        entries.entry(fp).or_insert(verdict);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(n: u8) -> Fingerprint {
        Fingerprint::of_bytes(&[n])
    }

    #[test]
    fn first_decision_wins() {
        let cache = VerdictCache::default();
        cache.insert(fp(1), Verdict::Code);
        cache.insert(fp(1), Verdict::Text);
        assert_eq!(cache.get(&fp(1)), Some(Verdict::Code));
    }

    #[test]
    fn unknown_is_not_cached() {
        let cache = VerdictCache::default();
        cache.insert(fp(1), Verdict::Unknown);
        assert_eq!(cache.get(&fp(1)), None);
    }

    #[test]
    fn inserts_past_the_cap_are_dropped() {
        let cache = VerdictCache::with_capacity(2);
        cache.insert(fp(1), Verdict::Text);
        cache.insert(fp(2), Verdict::Code);
        cache.insert(fp(3), Verdict::Code);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&fp(3)), None);
        // existing keys still answer
        assert_eq!(cache.get(&fp(2)), Some(Verdict::Code));
    }
}
