//! End-to-end convergence tests driving real nodes over loopback gossip
//! sockets (§8 "End-to-end scenarios" 1 and 4). Each node binds
//! `gossip_port = 0` so the OS picks a free port, avoiding collisions when
//! tests run concurrently.

use std::time::Duration;

use repl_node::config::NodeConfig;
use repl_node::facade::{Node, PutRequest};
use repl_node::NodeError;
use repl_store::MemoryStore;

fn config(name: &str, region_id: u32, number_of_regions: u32, seed: Option<String>) -> NodeConfig {
    let mut toml = format!(
        r#"
        name = "{name}"
        region_id = {region_id}
        number_of_regions = {number_of_regions}
        gossip_port = 0
        push_pull_interval_secs = 1
        "#
    );
    if let Some(seed) = seed {
        toml.push_str(&format!("seed_peer_addr = \"{seed}\"\n"));
    }
    NodeConfig::from_toml_str(&toml).unwrap()
}

async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Scenario 1: three nodes, three regions, one write, eventual convergence
/// and tombstone GC.
#[tokio::test(flavor = "multi_thread")]
async fn three_region_convergence_and_tombstone_gc() {
    let a = Node::new(config("a", 0, 3, None), MemoryStore::new());
    a.start().await.unwrap();
    let seed = a.gossip_addr().unwrap().to_string();

    let b = Node::new(config("b", 1, 3, Some(seed.clone())), MemoryStore::new());
    b.start().await.unwrap();
    let c = Node::new(config("c", 2, 3, Some(seed)), MemoryStore::new());
    c.start().await.unwrap();

    a.put(PutRequest {
        id: "x".into(),
        action_name: "created".into(),
        service_code: "svc".into(),
        source_region: 0,
        data: b"hello".to_vec(),
        version: 1,
    })
    .await
    .unwrap();

    let converged = wait_until(Duration::from_secs(15), || async {
        let b_ok = matches!(b.get("x".to_string()).await, Ok(record) if record.data == b"hello");
        let c_ok = matches!(c.get("x".to_string()).await, Ok(record) if record.data == b"hello");
        b_ok && c_ok
    })
    .await;
    assert!(converged, "b and c did not observe x within the deadline");

    let tombstoned = wait_until(Duration::from_secs(20), || async {
        matches!(a.get("x".to_string()).await, Err(NodeError::NotFound))
            && matches!(b.get("x".to_string()).await, Err(NodeError::NotFound))
            && matches!(c.get("x".to_string()).await, Err(NodeError::NotFound))
    })
    .await;
    assert!(tombstoned, "x was not garbage-collected on all nodes within the deadline");

    a.shutdown().await;
    b.shutdown().await;
    c.shutdown().await;
}

/// Scenario 6: a node joins an existing single-node cluster and adopts its
/// state on the initial push/pull.
#[tokio::test(flavor = "multi_thread")]
async fn node_join_adopts_existing_state() {
    let a = Node::new(config("a", 0, 2, None), MemoryStore::new());
    a.start().await.unwrap();
    a.put(PutRequest {
        id: "z".into(),
        action_name: "created".into(),
        service_code: "svc".into(),
        source_region: 0,
        data: b"seed-data".to_vec(),
        version: 1,
    })
    .await
    .unwrap();

    let seed = a.gossip_addr().unwrap().to_string();
    let b = Node::new(config("b", 1, 2, Some(seed)), MemoryStore::new());
    b.start().await.unwrap();

    let adopted = wait_until(Duration::from_secs(10), || async {
        matches!(b.get("z".to_string()).await, Ok(record) if record.data == b"seed-data")
    })
    .await;
    assert!(adopted, "b did not adopt z from the seed node's initial push/pull");

    let witnessed = wait_until(Duration::from_secs(10), || async {
        matches!(b.get("z".to_string()).await, Ok(record) if record.meta.committed_regions.contains(&1))
    })
    .await;
    assert!(witnessed, "b's region was not added to z's committed_regions after joining");

    a.shutdown().await;
    b.shutdown().await;
}
