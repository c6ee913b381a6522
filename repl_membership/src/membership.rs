use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::MembershipConfig;
use crate::delegate::Delegate;
use crate::error::MembershipError;
use crate::wire::{read_frame, write_frame};

const ALIVE_TAG: u8 = 0;
const USER_TAG: u8 = 1;
const NODE_META_LIMIT: usize = 512;
const BROADCAST_LIMIT: usize = 1024;
const MAX_UDP_PACKET: usize = 60_000;

/// A stand-in for the out-of-scope gossip membership layer (§1): a UDP
/// alive announce plus a periodic TCP push/pull tick. It knows nothing
/// about records or regions — only about moving bytes between nodes and
/// invoking the five [`Delegate`] callbacks at the right times.
pub struct Membership<D: Delegate> {
    config: MembershipConfig,
    delegate: Arc<D>,
    peers: StdMutex<HashSet<SocketAddr>>,
    shutdown: Arc<Notify>,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
    local_addr: SocketAddr,
}

impl<D: Delegate> Membership<D> {
    /// Binds the UDP and TCP gossip sockets and spawns the background
    /// receive loops. Does not join a cluster yet; call [`Membership::join`]
    /// for that.
    pub async fn create(
        config: MembershipConfig,
        delegate: Arc<D>,
    ) -> Result<Arc<Self>, MembershipError> {
        let bind_addr = config.gossip_bind();

        let tcp_listener =
            TcpListener::bind(bind_addr)
                .await
                .map_err(|source| MembershipError::Bind {
                    addr: bind_addr,
                    source,
                })?;
        let udp_socket =
            UdpSocket::bind(bind_addr)
                .await
                .map_err(|source| MembershipError::Bind {
                    addr: bind_addr,
                    source,
                })?;

        // When `gossip_port == 0` the OS assigns an ephemeral port; record
        // what the listener actually bound to so tests (and a seed node
        // advertising itself) can discover it.
        let local_addr = tcp_listener.local_addr().map_err(|source| MembershipError::Bind {
            addr: bind_addr,
            source,
        })?;

        let this = Arc::new(Self {
            config,
            delegate,
            peers: StdMutex::new(HashSet::new()),
            shutdown: Arc::new(Notify::new()),
            tasks: StdMutex::new(Vec::new()),
            local_addr,
        });

        this.spawn(Self::accept_loop(this.clone(), tcp_listener));
        this.spawn(Self::udp_recv_loop(this.clone(), Arc::new(udp_socket)));
        this.spawn(Self::tick_loop(this.clone()));

        info!(node = %this.config.name, addr = %bind_addr, "gossip transport bound");
        Ok(this)
    }

    fn spawn(self: &Arc<Self>, fut: impl std::future::Future<Output = ()> + Send + 'static) {
        self.tasks.lock().unwrap().push(tokio::spawn(fut));
    }

    /// Joins the cluster. On an empty seed, this node is the sole member of
    /// a fresh cluster; otherwise connects to the seed and performs an
    /// initial push/pull with `is_join = true`.
    pub async fn join(self: &Arc<Self>) -> Result<(), MembershipError> {
        let Some(seed) = self.config.seed_peer_addr.clone() else {
            info!(node = %self.config.name, "first node of the cluster");
            return Ok(());
        };

        info!(node = %self.config.name, %seed, "joining cluster");
        let addr = Self::resolve(&seed).await?;
        self.push_pull_with(addr, true).await.map_err(|source| {
            MembershipError::PushPull {
                peer: addr,
                source,
            }
        })?;
        self.peers.lock().unwrap().insert(addr);
        info!(node = %self.config.name, %addr, "joined cluster");
        Ok(())
    }

    async fn resolve(addr: &str) -> Result<SocketAddr, MembershipError> {
        let mut addrs =
            tokio::net::lookup_host(addr)
                .await
                .map_err(|source| MembershipError::ResolveSeed {
                    addr: addr.to_string(),
                    source,
                })?;
        addrs.next().ok_or_else(|| MembershipError::NoSeedAddress {
            addr: addr.to_string(),
        })
    }

    /// Leaves the cluster, waiting up to `timeout` for the last alive
    /// announce to go out, then tears down the transport regardless (§4.5).
    pub async fn leave(self: &Arc<Self>, timeout: Duration) {
        info!(node = %self.config.name, "leaving cluster");
        let _ = tokio::time::timeout(timeout, self.announce_leaving()).await;
        self.shutdown();
    }

    async fn announce_leaving(&self) {
        // Best-effort: nothing downstream depends on an explicit leave
        // broadcast, since convergence is driven by the push/pull schedule
        // regardless (§7 "propagation").
        trace!(node = %self.config.name, "announcing departure (best effort)");
    }

    /// Aborts the background tasks immediately.
    pub fn shutdown(self: &Arc<Self>) {
        self.shutdown.notify_waiters();
        for task in self.tasks.lock().unwrap().drain(..) {
            task.abort();
        }
    }

    fn known_peers(&self) -> Vec<SocketAddr> {
        self.peers.lock().unwrap().iter().copied().collect()
    }

    /// Number of peers this node currently believes are in the cluster.
    /// Exposed for operational surfaces (e.g. a liveness endpoint); the
    /// core gossip logic only ever needs `known_peers`.
    pub fn peer_count(&self) -> usize {
        self.peers.lock().unwrap().len()
    }

    /// The address the gossip transport actually bound to, useful when
    /// `gossip_port == 0` let the OS pick one.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    // --- TCP push/pull -----------------------------------------------

    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        loop {
            let (stream, peer) = tokio::select! {
                _ = self.shutdown.notified() => return,
                result = listener.accept() => match result {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!(error = %err, "gossip accept failed");
                        continue;
                    }
                },
            };
            let this = self.clone();
            tokio::spawn(async move {
                if let Err(err) = this.handle_incoming(stream, peer).await {
                    warn!(%peer, error = %err, "push/pull (incoming) failed");
                    return;
                }
                this.peers.lock().unwrap().insert(peer);
            });
        }
    }

    async fn handle_incoming(&self, mut stream: TcpStream, peer: SocketAddr) -> std::io::Result<()> {
        use tokio::io::AsyncReadExt;

        let mut is_join_byte = [0u8; 1];
        stream.read_exact(&mut is_join_byte).await?;
        let is_join = is_join_byte[0] != 0;

        let remote_state = read_frame(&mut stream).await?;
        self.delegate.merge_remote_state(&remote_state, is_join).await;
        debug!(%peer, bytes = remote_state.len(), is_join, "merged remote state (incoming)");

        let local_state = self.delegate.local_state(is_join).await;
        write_frame(&mut stream, &local_state).await?;
        Ok(())
    }

    async fn tick_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.push_pull_interval);
        interval.tick().await; // consume the immediate first tick
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => return,
                _ = interval.tick() => {}
            }
            self.gossip_once().await;
        }
    }

    async fn gossip_once(self: &Arc<Self>) {
        let peer = {
            let peers = self.peers.lock().unwrap();
            peers.iter().copied().collect::<Vec<_>>().choose(&mut rand::thread_rng()).copied()
        };
        let Some(peer) = peer else {
            self.send_alive().await;
            return;
        };

        if let Err(err) = self.push_pull_with(peer, false).await {
            warn!(%peer, error = %err, "push/pull failed, dropping peer this cycle");
        }
        self.send_alive().await;
    }

    async fn push_pull_with(&self, peer: SocketAddr, is_join: bool) -> std::io::Result<()> {
        let mut stream = TcpStream::connect(peer).await?;
        stream
            .set_nodelay(true)
            .unwrap_or_else(|err| trace!(error = %err, "set_nodelay failed"));

        use tokio::io::AsyncWriteExt;
        stream.write_u8(is_join as u8).await?;

        let local_state = self.delegate.local_state(is_join).await;
        write_frame(&mut stream, &local_state).await?;

        let remote_state = read_frame(&mut stream).await?;
        self.delegate.merge_remote_state(&remote_state, is_join).await;
        debug!(%peer, bytes = remote_state.len(), is_join, "merged remote state (outgoing)");
        Ok(())
    }

    // --- UDP alive announce / broadcasts -------------------------------

    async fn send_alive(&self) {
        // This runs on the same task as the push/pull tick, not inside any
        // `Delegate` callback, so there is no risk of blocking the receive
        // loop even though `node_meta`/`get_broadcasts` are cheap by
        // contract anyway.
        let socket = match UdpSocket::bind((self.config.bind_addr, 0)).await {
            Ok(socket) => socket,
            Err(err) => {
                warn!(error = %err, "failed to bind ephemeral UDP socket for alive announce");
                return;
            }
        };

        let meta = self.delegate.node_meta(NODE_META_LIMIT);
        let broadcasts = self.delegate.get_broadcasts(5, BROADCAST_LIMIT);

        let mut packet = Vec::with_capacity(1 + 4 + meta.len());
        packet.push(ALIVE_TAG);
        packet.extend_from_slice(&(meta.len() as u32).to_be_bytes());
        packet.extend_from_slice(&meta);
        for msg in broadcasts {
            packet.extend_from_slice(&(msg.len() as u32).to_be_bytes());
            packet.extend_from_slice(&msg);
        }
        if packet.len() > MAX_UDP_PACKET {
            warn!(len = packet.len(), "alive packet exceeds UDP budget, truncating broadcasts");
            packet.truncate(MAX_UDP_PACKET);
        }

        for peer in self.known_peers() {
            if let Err(err) = socket.send_to(&packet, peer).await {
                trace!(%peer, error = %err, "alive announce send failed");
            }
        }
    }

    async fn udp_recv_loop(self: Arc<Self>, socket: Arc<UdpSocket>) {
        let mut buf = vec![0u8; MAX_UDP_PACKET];
        loop {
            let (len, peer) = tokio::select! {
                _ = self.shutdown.notified() => return,
                result = socket.recv_from(&mut buf) => match result {
                    Ok(pair) => pair,
                    Err(err) => {
                        warn!(error = %err, "udp recv failed");
                        continue;
                    }
                },
            };
            self.handle_udp_packet(&buf[..len], peer);
        }
    }

    fn handle_udp_packet(&self, packet: &[u8], peer: SocketAddr) {
        if packet.is_empty() {
            return;
        }
        let tag = packet[0];
        let mut cursor = &packet[1..];

        match tag {
            ALIVE_TAG => {
                self.peers.lock().unwrap().insert(peer);
                // First frame is the sender's `node_meta`; this substrate
                // does not track per-peer metadata, so it is only logged.
                // Remaining frames are piggy-backed user broadcasts.
                if let Some((meta, rest)) = take_frame(cursor) {
                    trace!(%peer, meta_bytes = meta.len(), "received alive announce");
                    cursor = rest;
                }
                while let Some((frame, rest)) = take_frame(cursor) {
                    self.delegate.notify_msg(frame);
                    cursor = rest;
                }
            }
            USER_TAG => {
                while let Some((frame, rest)) = take_frame(cursor) {
                    self.delegate.notify_msg(frame);
                    cursor = rest;
                }
            }
            other => warn!(tag = other, %peer, "unknown gossip udp tag"),
        }
    }
}

/// Pulls one `u32`-length-prefixed frame off the front of `buf`, returning
/// the frame and the remaining bytes. The first frame in an `ALIVE_TAG`
/// packet is the sender's `node_meta`; any further frames are broadcasts.
fn take_frame(buf: &[u8]) -> Option<(&[u8], &[u8])> {
    if buf.len() < 4 {
        return None;
    }
    let len = u32::from_be_bytes(buf[..4].try_into().unwrap()) as usize;
    let rest = &buf[4..];
    if rest.len() < len {
        return None;
    }
    Some((&rest[..len], &rest[len..]))
}
