//! Local key/value store abstraction.
//!
//! `LocalStore` implementations are plain blocking CRUD + scan; they need
//! not provide any concurrency guarantees beyond single-writer/multi-reader
//! (§4.2). [`SharedStore`] is the single mutex referenced throughout the
//! rest of the workspace (§5) — the HTTP handlers in `repl_node` and the
//! gossip delegate in `repl_gossip` both go through it rather than talking
//! to a `LocalStore` directly.

mod error;
mod memory;
mod shared;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use shared::SharedStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Ordered key/value CRUD + full scan over an embedded engine.
///
/// All operations are externally synchronized by [`SharedStore`]; an
/// implementation does not need its own locking.
pub trait LocalStore: Send + 'static {
    /// Upsert. Last-write-wins at the byte level.
    fn put(&mut self, key: &str, value: Vec<u8>) -> StoreResult<()>;

    /// Returns `None` if the key is absent.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Idempotent: deleting a missing key is not an error.
    fn delete(&mut self, key: &str) -> StoreResult<()>;

    /// Snapshot-consistent at call time; safe to call repeatedly.
    fn scan(&self) -> StoreResult<Vec<(String, Vec<u8>)>>;
}
