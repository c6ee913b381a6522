//! Minimal gossip membership substrate.
//!
//! Stands in for the out-of-scope gossip membership layer (hashicorp/
//! memberlist is the closest real-world analogue): a UDP alive announce
//! plus a periodic TCP full-state push/pull. It defines the
//! [`Delegate`] contract and drives it, but has no notion of records,
//! regions, or commit thresholds — see `repl_gossip` for that.

mod config;
mod delegate;
mod error;
mod membership;
mod wire;

pub use config::MembershipConfig;
pub use delegate::Delegate;
pub use error::MembershipError;
pub use membership::Membership;
