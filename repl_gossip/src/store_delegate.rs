//! [`Delegate`] implementation wired to a [`SharedStore`]. This is the glue
//! between the transport-agnostic [`merge`] logic and `repl_membership`'s
//! async push/pull loop: the blocking store work runs on
//! `tokio::task::spawn_blocking` so the membership receive loop is never
//! stalled by a scan (§4.3).

use std::collections::BTreeMap;

use async_trait::async_trait;
use repl_membership::Delegate;
use repl_store::{LocalStore, SharedStore};
use tracing::{error, warn};

use crate::codec::{decode_metadata, decode_snapshot, encode_metadata, encode_snapshot};
use crate::merge::{merge_remote_state, MergeContext};

/// Binds a [`SharedStore`] to the membership layer for one node.
pub struct StoreDelegate<S> {
    store: SharedStore<S>,
    ctx: MergeContext,
    metadata: BTreeMap<String, String>,
}

impl<S: LocalStore> StoreDelegate<S> {
    pub fn new(store: SharedStore<S>, ctx: MergeContext, metadata: BTreeMap<String, String>) -> Self {
        Self {
            store,
            ctx,
            metadata,
        }
    }

    pub fn store(&self) -> &SharedStore<S> {
        &self.store
    }
}

#[async_trait]
impl<S: LocalStore> Delegate for StoreDelegate<S> {
    fn node_meta(&self, limit: usize) -> Vec<u8> {
        let mut encoded = encode_metadata(&self.metadata);
        if encoded.len() > limit {
            warn!(len = encoded.len(), limit, "node metadata truncated to fit limit");
            encoded.truncate(limit);
        }
        encoded
    }

    fn notify_msg(&self, _msg: &[u8]) {
        // No user-data broadcasts are defined; full state travels over
        // push/pull only (§4.3).
    }

    fn get_broadcasts(&self, _overhead: usize, _limit: usize) -> Vec<Vec<u8>> {
        Vec::new()
    }

    async fn local_state(&self, _is_join: bool) -> Vec<u8> {
        let snapshot = self.store.with_lock(|store| store.scan());
        match snapshot {
            Ok(entries) => {
                let map: BTreeMap<String, Vec<u8>> = entries.into_iter().collect();
                encode_snapshot(&map)
            }
            Err(err) => {
                error!(error = %err, "failed to scan local store for push/pull, sending empty state");
                encode_snapshot(&BTreeMap::new())
            }
        }
    }

    async fn merge_remote_state(&self, buf: &[u8], _is_join: bool) {
        if let Err(err) = merge_remote_state(&self.store, self.ctx, buf) {
            error!(error = %err, "discarding malformed remote snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use repl_core::{Meta, Record};
    use repl_store::MemoryStore;

    use super::*;

    fn delegate(region_id: u32) -> StoreDelegate<MemoryStore> {
        StoreDelegate::new(
            SharedStore::new(MemoryStore::new()),
            MergeContext {
                region_id,
                number_of_regions: 3,
            },
            BTreeMap::from([("api_port".to_string(), "9000".to_string())]),
        )
    }

    #[tokio::test]
    async fn local_state_reflects_store_contents() {
        let delegate = delegate(0);
        let record = Record {
            id: "a".into(),
            action_name: "created".into(),
            data: b"hi".to_vec(),
            meta: Meta::new(1, "svc", 0, 0),
        };
        delegate
            .store()
            .with_lock(|s| s.put("a", record.encode().unwrap()).unwrap());

        let snapshot = decode_snapshot(&delegate.local_state(false).await).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(Record::decode(&snapshot["a"]).unwrap(), record);
    }

    #[tokio::test]
    async fn merge_remote_state_adopts_new_record() {
        let delegate = delegate(1);
        let record = Record {
            id: "b".into(),
            action_name: "created".into(),
            data: b"remote".to_vec(),
            meta: Meta::new(1, "svc", 0, 0),
        };
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), record.encode().unwrap());
        let snapshot = encode_snapshot(&map);

        delegate.merge_remote_state(&snapshot, true).await;

        let stored = delegate.store().with_lock(|s| s.get("b").unwrap()).unwrap();
        assert_eq!(Record::decode(&stored).unwrap().data, b"remote");
    }

    #[test]
    fn node_meta_round_trips_through_codec() {
        let delegate = delegate(0);
        let bytes = delegate.node_meta(1024);
        let decoded = decode_metadata(&bytes).unwrap();
        assert_eq!(decoded.get("api_port").map(String::as_str), Some("9000"));
    }

    #[test]
    fn node_meta_truncates_to_limit() {
        let delegate = delegate(0);
        let bytes = delegate.node_meta(0);
        assert!(bytes.is_empty());
    }
}
