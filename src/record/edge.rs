//! Standalone edge records.
//!
//! An edge record is not how a vertex record stores its adjacency; it is
//! the unit a builder emits to deliver edge evidence to the destination
//! vertex's reducer. The wire form is fixed-size, so unlike vertex records
//! a truncated edge record is an error rather than a partial reconstruction.

use crate::error::GraphError;
use crate::graph::VertexId;
use crate::record::wire::{ByteReader, ByteWriter, TAG_EDGE};

/// Wire size: tag byte plus two 32-bit vertex ids.
const EDGE_RECORD_LEN: usize = 9;

/// A directed edge between two vertex ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRecord {
    from: VertexId,
    to: VertexId,
}

impl EdgeRecord {
    pub fn new(from: VertexId, to: VertexId) -> Self {
        Self { from, to }
    }

    pub fn from(&self) -> VertexId {
        self.from
    }

    pub fn to(&self) -> VertexId {
        self.to
    }

    /// True when the bytes carry an edge record, judged solely by the
    /// leading tag byte.
    pub fn is_edge_bytes(bytes: &[u8]) -> bool {
        bytes.first() == Some(&TAG_EDGE)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_u8(TAG_EDGE);
        w.put_i32(self.from);
        w.put_i32(self.to);
        w.into_inner()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GraphError> {
        if bytes.len() < EDGE_RECORD_LEN {
            return Err(GraphError::Framing(format!(
                "edge record needs {EDGE_RECORD_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let mut r = ByteReader::new(bytes);
        match r.get_u8() {
            Some(TAG_EDGE) => {}
            other => {
                return Err(GraphError::Framing(format!(
                    "expected edge record tag {TAG_EDGE}, got {other:?}"
                )))
            }
        }
        // Lengths were checked above; the reads cannot come up short.
        let from = r.get_i32().unwrap_or(crate::graph::NO_VERTEX);
        let to = r.get_i32().unwrap_or(crate::graph::NO_VERTEX);
        Ok(Self { from, to })
    }
}
