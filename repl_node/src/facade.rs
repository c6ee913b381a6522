//! Node facade (§4.5): wires a [`LocalStore`] to the gossip membership
//! layer through [`StoreDelegate`], and exposes `put`/`get`/`start`/
//! `shutdown` to both the HTTP layer and tests.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use repl_core::{Meta, Record};
use repl_gossip::{MergeContext, StoreDelegate};
use repl_membership::{Membership, MembershipConfig};
use repl_store::{LocalStore, SharedStore};
use tracing::info;

use crate::config::NodeConfig;
use crate::error::NodeError;

const LEAVE_TIMEOUT: Duration = Duration::from_secs(15);

pub struct Node<S: LocalStore> {
    config: NodeConfig,
    delegate: Arc<StoreDelegate<S>>,
    membership: std::sync::OnceLock<Arc<Membership<StoreDelegate<S>>>>,
}

impl<S: LocalStore> Node<S> {
    pub fn new(config: NodeConfig, store: S) -> Self {
        let ctx = MergeContext {
            region_id: config.region_id,
            number_of_regions: config.number_of_regions,
        };
        let metadata = BTreeMap::from([("api_port".to_string(), config.api_port.to_string())]);
        let delegate = Arc::new(StoreDelegate::new(SharedStore::new(store), ctx, metadata));
        Self {
            config,
            delegate,
            membership: std::sync::OnceLock::new(),
        }
    }

    /// Starts the gossip transport and joins the cluster (§4.5 `start`).
    /// Must be called exactly once.
    pub async fn start(&self) -> Result<(), NodeError> {
        let membership_config = MembershipConfig {
            name: self.config.name.clone(),
            bind_addr: self.config.bind_addr,
            gossip_port: self.config.gossip_port,
            seed_peer_addr: self.config.seed_peer_addr.clone(),
            push_pull_interval: self.config.push_pull_interval(),
        };
        let membership = Membership::create(membership_config, self.delegate.clone()).await?;
        membership.join().await?;
        self.membership
            .set(membership)
            .unwrap_or_else(|_| panic!("Node::start called more than once"));
        info!(node = %self.config.name, region = self.config.region_id, "node started");
        Ok(())
    }

    /// Leaves the cluster with a bounded wait, then tears down the
    /// transport regardless (§4.5 `shutdown`, §5 "Cancellation and
    /// timeouts").
    pub async fn shutdown(&self) {
        if let Some(membership) = self.membership.get() {
            membership.leave(LEAVE_TIMEOUT).await;
        }
        info!(node = %self.config.name, "node shut down");
    }

    /// §4.5 `put`: constructs a `Record` whose `meta.source_region` carries
    /// the client-supplied originating region verbatim, while
    /// `committed_regions` is seeded with this node's own region — the two
    /// are independent (§3 data model). The client-supplied version is
    /// trusted verbatim (§9 Open Question 5).
    pub async fn put(&self, request: PutRequest) -> Result<Record, NodeError> {
        let record = Record {
            id: request.id,
            action_name: request.action_name,
            data: request.data,
            meta: Meta::new(
                request.version,
                request.service_code,
                request.source_region,
                self.config.region_id,
            ),
        };
        let encoded = record.encode()?;
        let id = record.id.clone();
        let delegate = self.delegate.clone();
        tokio::task::spawn_blocking(move || delegate.store().with_lock(|s| s.put(&id, encoded)))
            .await
            .expect("put task panicked")?;
        Ok(record)
    }

    /// §4.5 `get`: reads and decodes, surfacing `NodeError::NotFound` as a
    /// distinct kind from a genuine store error (§7).
    pub async fn get(&self, id: String) -> Result<Record, NodeError> {
        let delegate = self.delegate.clone();
        let bytes = tokio::task::spawn_blocking(move || delegate.store().with_lock(|s| s.get(&id)))
            .await
            .expect("get task panicked")?;
        let bytes = bytes.ok_or(NodeError::NotFound)?;
        Ok(Record::decode(&bytes)?)
    }

    pub fn region_id(&self) -> u32 {
        self.config.region_id
    }

    pub fn number_of_regions(&self) -> u32 {
        self.config.number_of_regions
    }

    pub fn known_peer_count(&self) -> usize {
        self.membership.get().map_or(0, |m| m.peer_count())
    }

    /// The gossip transport's bound address, available after [`Node::start`]
    /// — useful for tests that bind to an OS-assigned port (`gossip_port =
    /// 0`) and need to tell a later node where to find this one.
    pub fn gossip_addr(&self) -> Option<std::net::SocketAddr> {
        self.membership.get().map(|m| m.local_addr())
    }
}

#[derive(Debug, Clone)]
pub struct PutRequest {
    pub id: String,
    pub action_name: String,
    pub service_code: String,
    pub source_region: u32,
    pub data: Vec<u8>,
    pub version: i32,
}

#[cfg(test)]
mod tests {
    use repl_store::MemoryStore;

    use super::*;

    fn config() -> NodeConfig {
        NodeConfig::from_toml_str(
            r#"
            name = "a"
            region_id = 0
            number_of_regions = 3
            "#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn put_then_get_on_same_node_is_read_your_writes() {
        let node = Node::new(config(), MemoryStore::new());
        node.put(PutRequest {
            id: "x".into(),
            action_name: "created".into(),
            service_code: "svc".into(),
            source_region: 0,
            data: b"hello".to_vec(),
            version: 1,
        })
        .await
        .unwrap();

        let record = node.get("x".to_string()).await.unwrap();
        assert_eq!(record.data, b"hello");
        assert!(record.meta.committed_regions.contains(&0));
    }

    #[tokio::test]
    async fn put_carries_client_supplied_source_region_independent_of_serving_node() {
        let node = Node::new(config(), MemoryStore::new());
        node.put(PutRequest {
            id: "x".into(),
            action_name: "created".into(),
            service_code: "svc".into(),
            source_region: 2,
            data: b"hello".to_vec(),
            version: 1,
        })
        .await
        .unwrap();

        let record = node.get("x".to_string()).await.unwrap();
        assert_eq!(record.meta.source_region, 2);
        assert!(record.meta.committed_regions.contains(&0));
        assert!(!record.meta.committed_regions.contains(&2));
    }

    #[tokio::test]
    async fn get_missing_key_returns_not_found() {
        let node = Node::new(config(), MemoryStore::new());
        let err = node.get("missing".to_string()).await.unwrap_err();
        assert!(matches!(err, NodeError::NotFound));
    }

    #[tokio::test]
    async fn put_overwrites_even_a_tombstone() {
        let node = Node::new(config(), MemoryStore::new());
        node.put(PutRequest {
            id: "x".into(),
            action_name: "created".into(),
            service_code: "svc".into(),
            source_region: 0,
            data: b"first".to_vec(),
            version: 1,
        })
        .await
        .unwrap();

        node.put(PutRequest {
            id: "x".into(),
            action_name: "created".into(),
            service_code: "svc".into(),
            source_region: 0,
            data: b"second".to_vec(),
            version: 2,
        })
        .await
        .unwrap();

        let record = node.get("x".to_string()).await.unwrap();
        assert_eq!(record.data, b"second");
        assert_eq!(record.meta.version, 2);
    }
}
