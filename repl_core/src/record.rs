//! The replicated unit: [`Record`] plus its [`Meta`] envelope.
//!
//! The wire format is a CBOR map keyed by small integers (see the `#[n(_)]`
//! attributes below). Map encoding means a decoder simply skips keys it does
//! not recognize and falls back to `Default` for keys it expects but does not
//! find — this is what gives us "unknown fields ignored" and "missing
//! `committed_regions` decodes to the empty set" for free, without any
//! hand-rolled parsing.

use std::collections::BTreeSet;

use minicbor::{Decode, Encode};

use crate::error::CodecError;

/// Per-record metadata assigned by the writer and mutated by gossip merges.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cbor(map)]
pub struct Meta {
    /// Monotonic version assigned by the writer. Ties are allowed.
    #[n(0)]
    pub version: i32,

    /// Opaque label carried alongside the record.
    #[n(1)]
    #[cbor(default)]
    pub service_code: String,

    /// Region id of the node that originated this record.
    #[n(2)]
    pub source_region: u32,

    /// Regions that have observed this record at `version` or later.
    #[n(3)]
    #[cbor(with = "region_set", default)]
    pub committed_regions: BTreeSet<u32>,

    /// Tombstone flag. Never reverts to `false` once set.
    #[n(4)]
    #[cbor(default)]
    pub to_delete: bool,
}

impl Meta {
    /// `source_region` is the client-chosen originating region carried
    /// verbatim on the wire; `committing_region` is the region id of the
    /// node that is serving this write and seeds `committed_regions`. The
    /// two are independent: a node can serve a write on behalf of a
    /// different region than the one it itself belongs to.
    pub fn new(version: i32, service_code: impl Into<String>, source_region: u32, committing_region: u32) -> Self {
        Self {
            version,
            service_code: service_code.into(),
            source_region,
            committed_regions: BTreeSet::from([committing_region]),
            to_delete: false,
        }
    }
}

/// The unit of replication: a client-chosen `id`, an opaque payload, and the
/// [`Meta`] envelope the merge engine reconciles.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cbor(map)]
pub struct Record {
    #[n(0)]
    pub id: String,

    #[n(1)]
    pub action_name: String,

    #[n(2)]
    #[cbor(with = "minicbor::bytes", default)]
    pub data: Vec<u8>,

    #[n(3)]
    pub meta: Meta,
}

impl Record {
    /// Serializes to the stable, self-describing wire/at-rest format.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(minicbor::to_vec(self)?)
    }

    /// Decodes a record previously produced by [`Record::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(minicbor::decode(bytes)?)
    }
}

/// `with`-module used for the `committed_regions` field: region ids are
/// encoded as a plain CBOR array of unsigned integers rather than via
/// `BTreeSet`'s default (nonexistent) CBOR representation.
mod region_set {
    use std::collections::BTreeSet;

    use minicbor::decode::{Decode, Decoder, Error};
    use minicbor::encode::{self, Encode, Encoder, Write};

    pub fn encode<C, W: Write>(
        set: &BTreeSet<u32>,
        e: &mut Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), encode::Error<W::Error>> {
        e.array(set.len() as u64)?;
        for region in set {
            region.encode(e, ctx)?;
        }
        Ok(())
    }

    pub fn decode<'b, C>(d: &mut Decoder<'b>, ctx: &mut C) -> Result<BTreeSet<u32>, Error> {
        let len = d.array()?.unwrap_or(0);
        let mut set = BTreeSet::new();
        for _ in 0..len {
            set.insert(u32::decode(d, ctx)?);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record {
            id: "evt-1".into(),
            action_name: "created".into(),
            data: b"hello".to_vec(),
            meta: Meta::new(1, "svc-a", 0, 0),
        }
    }

    #[test]
    fn round_trips() {
        let record = sample();
        let bytes = record.encode().unwrap();
        let decoded = Record::decode(&bytes).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn empty_payload_round_trips() {
        let mut record = sample();
        record.data = Vec::new();
        let bytes = record.encode().unwrap();
        let decoded = Record::decode(&bytes).unwrap();
        assert_eq!(decoded.data, Vec::<u8>::new());
    }

    #[test]
    fn missing_committed_regions_decodes_to_empty_set() {
        // Hand-build a map that omits key 3 (committed_regions) entirely.
        let mut buf = Vec::new();
        let mut e = minicbor::Encoder::new(&mut buf);
        e.map(4).unwrap();
        e.u8(0).unwrap().i32(7).unwrap();
        e.u8(1).unwrap().str("svc").unwrap();
        e.u8(2).unwrap().u32(2).unwrap();
        e.u8(4).unwrap().bool(false).unwrap();
        let meta: Meta = minicbor::decode(&buf).unwrap();
        assert!(meta.committed_regions.is_empty());
        assert_eq!(meta.version, 7);
        assert_eq!(meta.source_region, 2);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut buf = Vec::new();
        let mut e = minicbor::Encoder::new(&mut buf);
        e.map(5).unwrap();
        e.u8(0).unwrap().i32(1).unwrap();
        e.u8(1).unwrap().str("svc").unwrap();
        e.u8(2).unwrap().u32(0).unwrap();
        e.u8(3).unwrap().array(0).unwrap();
        e.u8(99).unwrap().str("from the future").unwrap();
        let meta: Meta = minicbor::decode(&buf).unwrap();
        assert_eq!(meta.version, 1);
    }
}
