#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("failed to bind gossip transport on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to resolve seed address {addr}: {source}")]
    ResolveSeed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("seed address {addr} did not resolve to anything")]
    NoSeedAddress { addr: String },

    #[error("push/pull with {peer} failed: {source}")]
    PushPull {
        peer: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
