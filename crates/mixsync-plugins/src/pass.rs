use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Identifies one diagnostics pass over one file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PassToken {
    path: String,
    seq: u64,
}

impl PassToken {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Issues per-file, monotonically increasing pass tokens.
///
/// Hook passes cannot be cancelled, so an older pass may finish after a
/// newer one. Callers take a token before running a pass and apply the
/// result only if [`Self::is_latest`] still holds when it completes.
///
/// Sequence numbers come from one tracker-wide counter, so a token is never
/// reissued, even across [`Self::reset`].
#[derive(Debug, Default)]
pub struct PassTracker {
    inner: Mutex<Issued>,
}

#[derive(Debug, Default)]
struct Issued {
    next: u64,
    latest: HashMap<String, u64>,
}

impl PassTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new pass for `path`, superseding every earlier token.
    pub fn issue(&self, path: &str) -> PassToken {
        let mut issued = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        issued.next += 1;
        let seq = issued.next;
        issued.latest.insert(path.to_string(), seq);
        PassToken {
            path: path.to_string(),
            seq,
        }
    }

    /// Whether `token` is the most recent one issued for its path.
    pub fn is_latest(&self, token: &PassToken) -> bool {
        let issued = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        issued.latest.get(&token.path) == Some(&token.seq)
    }

    /// Forget all issued tokens. Outstanding tokens become stale.
    pub fn reset(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .latest
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_token_supersedes_older() {
        let tracker = PassTracker::new();
        let first = tracker.issue("p/a.js");
        assert!(tracker.is_latest(&first));
        let second = tracker.issue("p/a.js");
        assert!(second.seq() > first.seq());
        assert!(!tracker.is_latest(&first));
        assert!(tracker.is_latest(&second));
    }

    #[test]
    fn paths_are_tracked_independently() {
        let tracker = PassTracker::new();
        let a = tracker.issue("p/a.js");
        let b = tracker.issue("p/b.js");
        assert!(tracker.is_latest(&a));
        assert!(tracker.is_latest(&b));
        assert_eq!(a.path(), "p/a.js");
    }

    #[test]
    fn reset_invalidates_outstanding_tokens() {
        let tracker = PassTracker::new();
        let token = tracker.issue("p/a.js");
        tracker.reset();
        assert!(!tracker.is_latest(&token));
        let fresh = tracker.issue("p/a.js");
        assert_ne!(fresh, token);
        assert!(!tracker.is_latest(&token));
    }
}
