use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Frames are a big-endian `u32` length prefix followed by that many bytes.
/// Used for both the TCP push/pull exchange and the UDP alive/broadcast
/// datagrams.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(w: &mut W, payload: &[u8]) -> std::io::Result<()> {
    w.write_u32(payload.len() as u32).await?;
    w.write_all(payload).await
}

pub async fn read_frame<R: AsyncReadExt + Unpin>(r: &mut R) -> std::io::Result<Vec<u8>> {
    let len = r.read_u32().await? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).await?;
    Ok(buf)
}
