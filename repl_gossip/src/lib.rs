//! Anti-entropy merge engine and gossip delegate.
//!
//! [`merge`] holds the per-key reconciliation rule in isolation, testable
//! against a [`repl_store::SharedStore`] with no network involved at all.
//! [`StoreDelegate`] is the thin adapter that lets `repl_membership` drive
//! it over real push/pull exchanges.

mod codec;
mod error;
mod merge;
mod store_delegate;

pub use codec::{decode_metadata, decode_snapshot, encode_metadata, encode_snapshot};
pub use error::MergeError;
pub use merge::{merge_remote_state, MergeContext};
pub use store_delegate::StoreDelegate;
