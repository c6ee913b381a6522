/// Errors from the local store adapter.
///
/// Deleting a missing key is not an error (§4.2); only genuine I/O/backend
/// failures surface here.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}
