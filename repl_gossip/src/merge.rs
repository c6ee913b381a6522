//! The anti-entropy merge engine (§4.4) — the part of the system with the
//! hard engineering. Everything here is synchronous and takes a
//! [`SharedStore`] directly so it can be unit-tested without any network
//! transport at all; [`crate::store_delegate::StoreDelegate`] is the thin
//! async wrapper that runs these functions on a blocking task.

use repl_core::Record;
use repl_store::{LocalStore, SharedStore};
use tracing::warn;

use crate::codec::decode_snapshot;
use crate::error::MergeError;

/// Immutable per-node facts the merge rule needs: which region this node is
/// and how many regions must witness a record before it is a tombstone.
#[derive(Debug, Clone, Copy)]
pub struct MergeContext {
    pub region_id: u32,
    pub number_of_regions: u32,
}

/// Entry point: `merge_remote_state` (§4.4). Aborts the whole merge (Step A)
/// only on a malformed outer envelope; a malformed individual record is
/// logged and skipped (Step C.1, hardened per §9 Open Question 3).
pub fn merge_remote_state<S: LocalStore>(
    store: &SharedStore<S>,
    ctx: MergeContext,
    remote: &[u8],
) -> Result<(), MergeError> {
    let remote = decode_snapshot(remote)?;

    if remote.is_empty() {
        empty_remote_sweep(store);
        return Ok(());
    }

    for (id, remote_bytes) in remote {
        reconcile_key(store, ctx, &id, &remote_bytes);
    }
    Ok(())
}

/// Step B: a peer with nothing to say about any key is the trigger for
/// tombstone garbage collection. A tombstone therefore always survives at
/// least one merge cycle before it is physically removed (§8 invariant 4).
fn empty_remote_sweep<S: LocalStore>(store: &SharedStore<S>) {
    store.with_lock(|store| {
        let snapshot = match store.scan() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "empty-remote sweep: scan failed, skipping this cycle");
                return;
            }
        };
        for (id, bytes) in snapshot {
            match Record::decode(&bytes) {
                Ok(record) if record.meta.to_delete => {
                    if let Err(err) = store.delete(&id) {
                        warn!(%id, error = %err, "failed to delete tombstone");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(%id, error = %err, "corrupt local record during sweep, skipping");
                }
            }
        }
    });
}

/// Step C: per-key reconciliation for one `(id, remote_bytes)` pair.
fn reconcile_key<S: LocalStore>(
    store: &SharedStore<S>,
    ctx: MergeContext,
    id: &str,
    remote_bytes: &[u8],
) {
    let mut vin = match Record::decode(remote_bytes) {
        Ok(record) => record,
        Err(err) => {
            warn!(%id, error = %err, "corrupt remote record, skipping key");
            return;
        }
    };

    // Tombstones propagate unconditionally, regardless of version.
    if vin.meta.to_delete {
        store.with_lock(|store| {
            if let Err(err) = store.delete(id) {
                warn!(%id, error = %err, "failed to delete on tombstone merge");
            }
        });
        return;
    }

    let existing = store.with_lock(|store| store.get(id));
    let existing_bytes = match existing {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%id, error = %err, "store read failed during merge, skipping key");
            return;
        }
    };

    let Some(existing_bytes) = existing_bytes else {
        // First adoption: store verbatim. The local node does not add
        // itself to `committed_regions` here — the next outgoing push/pull
        // with a peer that returns this record closes that gap on the peer
        // side (§4.4 Step C.3, §9 Open Question 1 resolved literally).
        store.with_lock(|store| {
            if let Err(err) = store.put(id, remote_bytes.to_vec()) {
                warn!(%id, error = %err, "failed to adopt new record");
            }
        });
        return;
    };

    let vexit = match Record::decode(&existing_bytes) {
        Ok(record) => record,
        Err(err) => {
            warn!(%id, error = %err, "corrupt local record, skipping key");
            return;
        }
    };

    if vin.meta.version < vexit.meta.version {
        // Remote is stale; keep the local copy untouched.
        return;
    }

    // Remote is same-or-newer: contribute the region-set union and detect
    // commit-quorum, unconditionally overwriting the local copy.
    vin.meta.committed_regions.insert(ctx.region_id);
    if vin.meta.committed_regions.len() as u32 >= ctx.number_of_regions {
        vin.meta.to_delete = true;
    }

    let encoded = match vin.encode() {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%id, error = %err, "failed to re-encode merged record");
            return;
        }
    };
    store.with_lock(|store| {
        if let Err(err) = store.put(id, encoded) {
            warn!(%id, error = %err, "failed to store merged record");
        }
    });
}
