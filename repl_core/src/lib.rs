//! Record model and wire codec for the replicated event store.
//!
//! This crate has no I/O and no async code; it defines the data the rest of
//! the workspace moves around (`repl_store`, `repl_gossip`, `repl_node`).

pub mod error;
pub mod record;

pub use error::CodecError;
pub use record::{Meta, Record};
