/// Errors that abort an entire merge cycle (§4.4 Step A). A decode failure
/// on a single key inside the snapshot, or a store failure encountered
/// while reconciling one key, is handled separately — logged and skipped —
/// and never surfaces here (§7).
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("decode remote snapshot envelope: {0}")]
    Envelope(#[from] minicbor::decode::Error),
}
