//! Node facade, HTTP surface, and process bootstrap.
//!
//! This crate is the `repl_node` analogue of `s5_node`: it orchestrates the
//! lower crates (`repl_store*`, `repl_membership`, `repl_gossip`) into a
//! runnable node and exposes the client-facing HTTP API over it.

pub mod config;
pub mod error;
pub mod facade;
pub mod http;

pub use config::NodeConfig;
pub use error::NodeError;
pub use facade::{Node, PutRequest};
