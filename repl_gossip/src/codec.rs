//! Wire encoding for the two non-`Record` payloads the delegate moves
//! around: the full-state snapshot (`local_state`/`merge_remote_state`) and
//! the small node-metadata map (`node_meta`). Both are written by hand with
//! `minicbor::Encoder`/`Decoder` directly, the same way
//! `s5_core::stream::types::StreamMessage` hand-writes `serialize`/
//! `deserialize` rather than relying on derive for a type whose shape (a
//! map of dynamic string keys) derive does not model well.

use std::collections::BTreeMap;

use minicbor::{Decoder, Encoder};

/// Serializes a full-state snapshot: `id -> encoded Record bytes`.
pub fn encode_snapshot(snapshot: &BTreeMap<String, Vec<u8>>) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut e = Encoder::new(&mut buf);
    e.map(snapshot.len() as u64).expect("writing to a Vec cannot fail");
    for (id, bytes) in snapshot {
        e.str(id).expect("writing to a Vec cannot fail");
        e.bytes(bytes).expect("writing to a Vec cannot fail");
    }
    buf
}

/// Decodes a snapshot produced by [`encode_snapshot`]. The only hard
/// requirement (§9) is that both sides of a push/pull agree on this format.
pub fn decode_snapshot(bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, minicbor::decode::Error> {
    let mut d = Decoder::new(bytes);
    let len = d
        .map()?
        .ok_or_else(|| minicbor::decode::Error::message("indefinite-length snapshot map"))?;
    let mut out = BTreeMap::new();
    for _ in 0..len {
        let id = d.str()?.to_string();
        let record_bytes = d.bytes()?.to_vec();
        out.insert(id, record_bytes);
    }
    Ok(out)
}

/// Serializes the small `node_meta` map (e.g. `{"api_port": "9000"}`).
pub fn encode_metadata(metadata: &BTreeMap<String, String>) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut e = Encoder::new(&mut buf);
    e.map(metadata.len() as u64).expect("writing to a Vec cannot fail");
    for (k, v) in metadata {
        e.str(k).expect("writing to a Vec cannot fail");
        e.str(v).expect("writing to a Vec cannot fail");
    }
    buf
}

/// Decodes a `node_meta` map produced by [`encode_metadata`].
pub fn decode_metadata(bytes: &[u8]) -> Result<BTreeMap<String, String>, minicbor::decode::Error> {
    let mut d = Decoder::new(bytes);
    let len = d
        .map()?
        .ok_or_else(|| minicbor::decode::Error::message("indefinite-length metadata map"))?;
    let mut out = BTreeMap::new();
    for _ in 0..len {
        let k = d.str()?.to_string();
        let v = d.str()?.to_string();
        out.insert(k, v);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trips() {
        let mut snapshot = BTreeMap::new();
        snapshot.insert("a".to_string(), vec![1, 2, 3]);
        snapshot.insert("b".to_string(), vec![]);
        let bytes = encode_snapshot(&snapshot);
        assert_eq!(decode_snapshot(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn empty_snapshot_round_trips() {
        let snapshot = BTreeMap::new();
        let bytes = encode_snapshot(&snapshot);
        assert_eq!(decode_snapshot(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn metadata_round_trips() {
        let metadata = BTreeMap::from([("api_port".to_string(), "9000".to_string())]);
        let bytes = encode_metadata(&metadata);
        assert_eq!(decode_metadata(&bytes).unwrap(), metadata);
    }
}
