//! K-mer vertex identity and sequence payloads.
//!
//! The assembler keys its graph on `(k-1)`-mers: every k-mer of a read is
//! one edge between the vertex of its prefix and the vertex of its suffix.
//! Mers are packed two bits per base into the vertex id itself, so the id
//! space is dense, decode is total, and the graph capacity is `4^(k-1)`.

use std::str;

use crate::error::GraphError;
use crate::graph::VertexId;
use crate::record::vertex::Payload;
use crate::record::wire::{ByteReader, ByteWriter};

/// Packs `(k-1)`-mers into vertex ids and back.
#[derive(Debug, Clone, Copy)]
pub struct MerCodec {
    k: usize,
}

impl MerCodec {
    /// `k` is the k-mer (edge) length; vertices are `(k-1)`-mers. Bounded
    /// so that every packed mer fits a non-negative 32-bit id.
    pub fn new(k: usize) -> Result<Self, GraphError> {
        if !(3..=16).contains(&k) {
            return Err(GraphError::Precondition(format!(
                "k must be in 3..=16 to index vertices by packed mer, got {k}"
            )));
        }
        Ok(Self { k })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Length of the mers serving as vertex identities.
    pub fn mer_len(&self) -> usize {
        self.k - 1
    }

    /// Graph capacity covering every possible mer: `4^(k-1)`.
    pub fn vertex_capacity(&self) -> usize {
        1usize << (2 * self.mer_len())
    }

    pub fn encode(&self, mer: &str) -> Result<VertexId, GraphError> {
        if mer.len() != self.mer_len() {
            return Err(GraphError::InvalidInput(format!(
                "expected a {}-mer, got {:?}",
                self.mer_len(),
                mer
            )));
        }
        let mut id: VertexId = 0;
        for base in mer.bytes() {
            let bits = match base.to_ascii_uppercase() {
                b'A' => 0,
                b'C' => 1,
                b'G' => 2,
                b'T' => 3,
                other => {
                    return Err(GraphError::InvalidInput(format!(
                        "invalid base {:?} in mer {mer:?}",
                        other as char
                    )))
                }
            };
            id = (id << 2) | bits;
        }
        Ok(id)
    }

    /// Total for ids in `0..vertex_capacity()`.
    pub fn decode(&self, id: VertexId) -> String {
        let mut mer = vec![0u8; self.mer_len()];
        let mut rest = id;
        for slot in mer.iter_mut().rev() {
            *slot = match rest & 0b11 {
                0 => b'A',
                1 => b'C',
                2 => b'G',
                _ => b'T',
            };
            rest >>= 2;
        }
        String::from_utf8(mer).unwrap_or_default()
    }
}

/// Sequence fragment carried by an assembly vertex record.
///
/// A fresh record holds its own `(k-1)`-mer; chain compression fuses the
/// successor's fragment onto it, dropping the `k-2` bases the two share.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerPayload {
    seq: String,
    overlap: u16,
}

impl MerPayload {
    pub fn new(seq: &str, overlap: usize) -> Self {
        Self {
            seq: seq.to_string(),
            overlap: overlap as u16,
        }
    }

    pub fn seq(&self) -> &str {
        &self.seq
    }
}

impl Payload for MerPayload {
    fn to_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_i16(self.overlap as i16);
        w.put_bytes(self.seq.as_bytes());
        w.into_inner()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, GraphError> {
        let mut r = ByteReader::new(bytes);
        let overlap = r
            .get_i16()
            .ok_or_else(|| GraphError::Framing("mer payload shorter than its header".into()))?;
        let seq_bytes = bytes.get(2..).unwrap_or_default();
        let seq = str::from_utf8(seq_bytes)
            .map_err(|_| GraphError::Framing("mer payload is not valid utf-8".into()))?;
        Ok(Self {
            seq: seq.to_string(),
            overlap: overlap.max(0) as u16,
        })
    }

    fn fuse(&mut self, successor: &Self) {
        let cut = (self.overlap as usize).min(successor.seq.len());
        self.seq.push_str(&successor.seq[cut..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::vertex::{EdgeFormat, VertexRecord};
    use crate::utils::config::CoreConfig;

    #[test]
    fn codec_round_trips_every_mer_of_small_k() {
        let codec = MerCodec::new(3).unwrap();
        assert_eq!(codec.vertex_capacity(), 16);
        for id in 0..16 {
            let mer = codec.decode(id);
            assert_eq!(codec.encode(&mer).unwrap(), id);
        }
    }

    #[test]
    fn encode_is_case_insensitive_and_checked() {
        let codec = MerCodec::new(4).unwrap();
        assert_eq!(
            codec.encode("acg").unwrap(),
            codec.encode("ACG").unwrap()
        );
        assert!(codec.encode("AXG").is_err());
        assert!(codec.encode("ACGT").is_err()); // wrong length
    }

    #[test]
    fn k_bounds_are_enforced() {
        assert!(MerCodec::new(2).is_err());
        assert!(MerCodec::new(17).is_err());
        assert!(MerCodec::new(16).is_ok());
    }

    #[test]
    fn fuse_drops_the_shared_overlap() {
        // 4-mers chain AACG -> ACGT: vertices AAC and ACG and CGT.
        let mut head = MerPayload::new("AAC", 2);
        head.fuse(&MerPayload::new("ACG", 2));
        assert_eq!(head.seq(), "AACG");
        head.fuse(&MerPayload::new("CGT", 2));
        assert_eq!(head.seq(), "AACGT");
    }

    #[test]
    fn payload_survives_the_record_wire_format() {
        let config = CoreConfig::default();
        let mut record =
            VertexRecord::with_payload(9, MerPayload::new("ACGTA", 2), config);
        record.add_edge_to(3).unwrap();
        let bytes = record.to_bytes(EdgeFormat::EdgesTo).unwrap();
        let parsed: VertexRecord<MerPayload> =
            VertexRecord::from_bytes(&bytes, config).unwrap();
        assert_eq!(parsed.payload().seq(), "ACGTA");
        assert_eq!(parsed, record);
    }

    #[test]
    fn fuse_through_compress_chain_concatenates_fragments() {
        let config = CoreConfig::default();
        let codec = MerCodec::new(4).unwrap();
        let a = codec.encode("AAC").unwrap();
        let b = codec.encode("ACG").unwrap();
        let c = codec.encode("CGT").unwrap();

        let mut first =
            VertexRecord::with_payload(a, MerPayload::new("AAC", 2), config);
        first.add_edge_to(b).unwrap();
        let mut second =
            VertexRecord::with_payload(b, MerPayload::new("ACG", 2), config);
        second.add_edge_to(c).unwrap();

        assert!(first.compress_chain(&second).unwrap());
        assert_eq!(first.payload().seq(), "AACG");
        assert_eq!(first.edges_to().collect::<Vec<_>>(), vec![c]);
    }
}
