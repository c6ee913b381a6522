use async_trait::async_trait;

/// The contract the membership layer invokes against application state
/// (§4.3). Implementations must not perform blocking network I/O from any
/// of these methods — only store access, which is expected to be fast.
#[async_trait]
pub trait Delegate: Send + Sync + 'static {
    /// Returns this node's metadata, truncated to `limit` bytes by
    /// construction. Called when announcing the node alive. Must not block.
    fn node_meta(&self, limit: usize) -> Vec<u8>;

    /// Called when a user-data message is received on the UDP path. Must
    /// not block, since doing so would stall the receive loop.
    fn notify_msg(&self, msg: &[u8]);

    /// Called when user-data messages can be broadcast over the UDP path.
    /// The total size of the returned buffers must not exceed `limit`,
    /// after accounting for `overhead` bytes of framing per message.
    fn get_broadcasts(&self, overhead: usize, limit: usize) -> Vec<Vec<u8>>;

    /// Full local-state snapshot sent to the remote side of a TCP
    /// push/pull. `is_join` distinguishes an initial join from steady-state
    /// exchange.
    async fn local_state(&self, is_join: bool) -> Vec<u8>;

    /// The result of the remote side's `local_state` call, received after a
    /// TCP push/pull.
    async fn merge_remote_state(&self, buf: &[u8], is_join: bool);
}
