use std::sync::Mutex;

use crate::LocalStore;

/// The single mutex shared between the client request path and the gossip
/// delegate (§5). All multi-step reconciliation (e.g. "look up the existing
/// record, compare, then store the winner") happens inside one
/// `with_lock` call so it is atomic with respect to concurrent `put`s and
/// concurrent merges.
pub struct SharedStore<S> {
    inner: Mutex<S>,
}

impl<S: LocalStore> SharedStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Mutex::new(store),
        }
    }

    /// Runs `f` with exclusive access to the underlying store.
    ///
    /// The lock is a plain in-memory mutex; callers performing blocking
    /// backend I/O (e.g. `repl_store_redb`) under the lock should do so from
    /// a blocking-safe context (`tokio::task::spawn_blocking`) rather than
    /// inside an async task, so the membership transport's receive loop is
    /// never stalled (§4.3).
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}
