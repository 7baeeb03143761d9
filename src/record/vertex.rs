//! Partition-local vertex records.
//!
//! A [`VertexRecord`] is a self-contained snapshot of one vertex and its
//! edges, suitable for shuffling between workers: it is not part of a
//! global graph, keeps both its outgoing and incoming adjacency as sorted
//! multisets, and serializes to a fixed big-endian byte layout. The
//! coverage pruner and the chain compressor operate on these records.
//!
//! Classification flags (branch / source / sink) are carried in the record
//! header so that a harness can route a serialized record without decoding
//! it. Edge mutation refreshes a flag only when the mutation could have
//! invalidated it; a partial record reconstructed from an `EdgesTo` wire
//! image therefore keeps the flags its writer computed from evidence that
//! is no longer locally present. `compute_is_branch` and
//! `compute_source_sink` make the flags authoritative for the local edges.

use std::fmt;

use crate::error::GraphError;
use crate::graph::adjacency::{EdgeChain, EdgeCursor};
use crate::graph::{VertexId, NO_VERTEX};
use crate::record::edge::EdgeRecord;
use crate::record::wire::{ByteReader, ByteWriter, TAG_VERTEX};
use crate::utils::config::CoreConfig;

pub(crate) const FLAG_IS_BRANCH: u8 = 0x1;
pub(crate) const FLAG_IS_SOURCE: u8 = 0x2;
pub(crate) const FLAG_IS_SINK: u8 = 0x4;

/// Which of a record's two adjacency lists an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDir {
    To,
    From,
}

/// How much adjacency a serialized record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeFormat {
    /// Only the edges pointing out of the vertex.
    EdgesTo,
    /// Both outgoing and incoming edges.
    EdgesToFrom,
}

/// Extension hook for data a derived record type carries through the
/// pipeline: serialized after the edge lists, and fused when a chain
/// merge absorbs a successor record.
pub trait Payload: Clone + Default + Send {
    fn to_bytes(&self) -> Vec<u8>;
    fn from_bytes(bytes: &[u8]) -> Result<Self, GraphError>;
    /// Fold the unique successor's payload into this one during a chain
    /// merge.
    fn fuse(&mut self, successor: &Self);
}

/// The base record carries opaque bytes and fuses to nothing.
impl Payload for Vec<u8> {
    fn to_bytes(&self) -> Vec<u8> {
        self.clone()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, GraphError> {
        Ok(bytes.to_vec())
    }

    fn fuse(&mut self, _successor: &Self) {}
}

/// Result of a keyed pairwise chain merge.
#[derive(Debug)]
pub enum CompressOutcome<P: Payload> {
    /// The predecessor absorbed the successor; one record remains.
    Compressed(VertexRecord<P>),
    /// The pair was not mergeable under this key; both records pass
    /// through unchanged.
    Unchanged(VertexRecord<P>, VertexRecord<P>),
}

/// The unique successor of a record, with its edge multiplicity.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tail {
    pub(crate) id: VertexId,
    pub(crate) count: usize,
}

/// A partition-local vertex record.
#[derive(Debug, Clone)]
pub struct VertexRecord<P: Payload = Vec<u8>> {
    id: VertexId,
    flags: u8,
    to: EdgeChain<VertexId>,
    from: EdgeChain<VertexId>,
    payload: P,
    config: CoreConfig,
}

impl<P: Payload> VertexRecord<P> {
    pub fn new(id: VertexId, config: CoreConfig) -> Self {
        Self {
            id,
            flags: 0,
            to: EdgeChain::new(),
            from: EdgeChain::new(),
            payload: P::default(),
            config,
        }
    }

    pub fn with_payload(id: VertexId, payload: P, config: CoreConfig) -> Self {
        Self {
            payload,
            ..Self::new(id, config)
        }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Reconstruct a record from its wire image. A truncated image yields
    /// as much of the record as the bytes describe, without error; only a
    /// missing or wrong tag is rejected.
    pub fn from_bytes(bytes: &[u8], config: CoreConfig) -> Result<Self, GraphError> {
        let mut r = ByteReader::new(bytes);
        match r.get_u8() {
            Some(TAG_VERTEX) => {}
            other => {
                return Err(GraphError::Framing(format!(
                    "expected vertex record tag {TAG_VERTEX}, got {other:?}"
                )))
            }
        }

        let flags = r.get_u8().unwrap_or(0);
        let id = r.get_i32().unwrap_or(NO_VERTEX);
        let mut record = Self::new(id, config);
        record.flags = flags;

        if let Some(n_to) = r.get_i16() {
            for _ in 0..n_to.max(0) {
                match r.get_i32() {
                    Some(v) => record.add_edge_to(v)?,
                    None => break,
                }
            }
        }
        if let Some(n_from) = r.get_i16() {
            for _ in 0..n_from.max(0) {
                match r.get_i32() {
                    Some(v) => record.add_edge_from(v)?,
                    None => break,
                }
            }
        }
        if let Some(payload_len) = r.get_i16() {
            if payload_len > 0 {
                if let Some(payload_bytes) = r.get_bytes(payload_len as usize) {
                    record.payload = P::from_bytes(payload_bytes)?;
                }
            }
        }

        Ok(record)
    }

    /// Serialize to the wire layout. `EdgesTo` writes an empty incoming
    /// list; a reader of such an image sees the flags the writer computed
    /// but not the incoming evidence behind them.
    pub fn to_bytes(&self, format: EdgeFormat) -> Result<Vec<u8>, GraphError> {
        let mut w = ByteWriter::new();
        w.put_u8(TAG_VERTEX);
        w.put_u8(self.flags);
        w.put_i32(self.id);

        w.put_i16(self.to.len() as i16);
        for &v in self.to.iter() {
            w.put_i32(v);
        }

        match format {
            EdgeFormat::EdgesToFrom => {
                w.put_i16(self.from.len() as i16);
                for &v in self.from.iter() {
                    w.put_i32(v);
                }
            }
            EdgeFormat::EdgesTo => w.put_i16(0),
        }

        let payload_bytes = self.payload.to_bytes();
        if payload_bytes.len() > i16::MAX as usize {
            return Err(GraphError::PayloadTooLarge {
                len: payload_bytes.len(),
            });
        }
        w.put_i16(payload_bytes.len() as i16);
        w.put_bytes(&payload_bytes);

        Ok(w.into_inner())
    }

    // Edge mutation.

    /// Add an edge pointing from this vertex to `to`. Negative ids are
    /// silently ignored.
    pub fn add_edge_to(&mut self, to: VertexId) -> Result<(), GraphError> {
        if to < 0 {
            return Ok(());
        }
        self.to.insert(to, self.config.allow_edge_multiples)?;
        // A record can be flagged a branch from evidence that is not stored
        // locally, so a set flag is never cleared implicitly.
        if !self.is_branch() {
            self.compute_is_branch();
        }
        // A new out-edge can only invalidate the sink classification.
        if self.is_sink() {
            self.compute_source_sink();
        }
        Ok(())
    }

    /// Add an edge pointing from `from` to this vertex. Negative ids are
    /// silently ignored.
    pub fn add_edge_from(&mut self, from: VertexId) -> Result<(), GraphError> {
        if from < 0 {
            return Ok(());
        }
        self.from.insert(from, self.config.allow_edge_multiples)?;
        if !self.is_branch() {
            self.compute_is_branch();
        }
        if self.is_source() {
            self.compute_source_sink();
        }
        Ok(())
    }

    /// Remove every outgoing edge to `to`. Cursors positioned on a removed
    /// edge advance to its successor.
    pub fn remove_edge_to(&mut self, to: VertexId) {
        self.to.remove_all(to);
        if !self.is_branch() {
            self.compute_is_branch();
        }
        if self.is_sink() {
            self.compute_source_sink();
        }
    }

    /// Remove every incoming edge from `from`.
    pub fn remove_edge_from(&mut self, from: VertexId) {
        self.from.remove_all(from);
        if !self.is_branch() {
            self.compute_is_branch();
        }
        if self.is_source() {
            self.compute_source_sink();
        }
    }

    /// Apply a standalone edge record. Does nothing unless the edge names
    /// this vertex on one of its ends.
    pub fn add_edge_record(&mut self, edge: &EdgeRecord) -> Result<(), GraphError> {
        if edge.to() == self.id {
            self.add_edge_from(edge.from())
        } else if edge.from() == self.id {
            self.add_edge_to(edge.to())
        } else {
            Ok(())
        }
    }

    // Adjacency access.

    pub fn edges_to(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.to.iter().copied()
    }

    pub fn edges_from(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.from.iter().copied()
    }

    pub fn out_count(&self) -> usize {
        self.to.len()
    }

    pub fn in_count(&self) -> usize {
        self.from.len()
    }

    fn chain(&self, dir: EdgeDir) -> &EdgeChain<VertexId> {
        match dir {
            EdgeDir::To => &self.to,
            EdgeDir::From => &self.from,
        }
    }

    fn chain_mut(&mut self, dir: EdgeDir) -> &mut EdgeChain<VertexId> {
        match dir {
            EdgeDir::To => &mut self.to,
            EdgeDir::From => &mut self.from,
        }
    }

    /// Register a cursor over one adjacency list.
    pub fn open_cursor(&mut self, dir: EdgeDir) -> EdgeCursor {
        self.chain_mut(dir).open_cursor()
    }

    pub fn close_cursor(&mut self, dir: EdgeDir, cursor: EdgeCursor) {
        self.chain_mut(dir).close_cursor(cursor);
    }

    pub fn cursor_begin(&mut self, dir: EdgeDir, cursor: EdgeCursor) -> Option<VertexId> {
        self.chain_mut(dir).cursor_begin(cursor)
    }

    pub fn cursor_next(&mut self, dir: EdgeDir, cursor: EdgeCursor) -> Option<VertexId> {
        self.chain_mut(dir).cursor_next(cursor)
    }

    pub fn cursor_done(&self, dir: EdgeDir, cursor: EdgeCursor) -> bool {
        self.chain(dir).cursor_done(cursor)
    }

    /// Begin group iteration: each step yields a batch of consecutive
    /// edges sharing a destination (or origin).
    pub fn cursor_begin_group(&mut self, dir: EdgeDir, cursor: EdgeCursor) -> Option<Vec<VertexId>> {
        self.chain_mut(dir).cursor_begin_group(cursor)
    }

    pub fn cursor_next_group(&mut self, dir: EdgeDir, cursor: EdgeCursor) -> Option<Vec<VertexId>> {
        self.chain_mut(dir).cursor_next_group(cursor)
    }

    // Classification.

    pub fn is_branch(&self) -> bool {
        self.flags & FLAG_IS_BRANCH != 0
    }

    pub fn is_source(&self) -> bool {
        self.flags & FLAG_IS_SOURCE != 0
    }

    pub fn is_sink(&self) -> bool {
        self.flags & FLAG_IS_SINK != 0
    }

    /// Recompute the branch flag from the local edges: a branch has edges
    /// to at least two distinct vertices or from at least two distinct
    /// vertices.
    pub fn compute_is_branch(&mut self) {
        self.flags &= !FLAG_IS_BRANCH;
        for dir in [EdgeDir::To, EdgeDir::From] {
            let mut first = NO_VERTEX;
            for &v in self.chain(dir).iter() {
                if first == NO_VERTEX {
                    first = v;
                } else if first != v {
                    self.flags |= FLAG_IS_BRANCH;
                    return;
                }
            }
        }
    }

    /// Recompute the source and sink flags from the local edges.
    pub fn compute_source_sink(&mut self) {
        self.flags &= !(FLAG_IS_SOURCE | FLAG_IS_SINK);
        if !self.to.is_empty() && self.from.is_empty() {
            self.flags |= FLAG_IS_SOURCE;
        }
        if self.to.is_empty() && !self.from.is_empty() {
            self.flags |= FLAG_IS_SINK;
        }
    }

    // Merging and chain compression.

    /// Union another partial representation of the same vertex into this
    /// one. Records with different ids cannot be merged.
    pub fn merge(&mut self, other: &Self) -> Result<(), GraphError> {
        if other.id != self.id {
            return Err(GraphError::Precondition(format!(
                "cannot merge vertex {} into vertex {}",
                other.id, self.id
            )));
        }
        for v in other.edges_to() {
            self.add_edge_to(v)?;
        }
        for v in other.edges_from() {
            self.add_edge_from(v)?;
        }
        Ok(())
    }

    /// The unique successor of this record: `NO_VERTEX` when the out-list
    /// is empty or points at more than one distinct vertex.
    pub(crate) fn tail(&self) -> Tail {
        let mut id = NO_VERTEX;
        let mut count = 0usize;
        for &v in self.to.iter() {
            if id == NO_VERTEX {
                id = v;
            } else if id != v {
                return Tail {
                    id: NO_VERTEX,
                    count: 0,
                };
            }
            count += 1;
        }
        Tail { id, count }
    }

    /// Draw this record's pairing key for one compression round: a fair
    /// coin picks the record's own id or its unique successor's id, so a
    /// reducer only sees a pair when both records agree on the merge.
    /// A record with no unique successor keys to itself.
    pub fn compress_chain_key(&self, rng: &mut fastrand::Rng) -> VertexId {
        let tail = self.tail();
        if tail.id == NO_VERTEX {
            return self.id;
        }
        if rng.bool() {
            tail.id
        } else {
            self.id
        }
    }

    /// Absorb `other` into this record if this record's unique successor
    /// is `other` and `other` itself has a unique successor. On success
    /// this record's out-edges are replaced by edges to `other`'s
    /// successor and the payloads are fused; returns whether the merge
    /// happened.
    ///
    /// Under `compress_multiples_must_match` the multiplicities on both
    /// sides must agree; otherwise the surviving multiplicity is the
    /// minimum of the two.
    pub fn compress_chain(&mut self, other: &Self) -> Result<bool, GraphError> {
        let tail = self.tail();
        if tail.id != other.id() {
            return Ok(false);
        }
        let other_tail = other.tail();
        if other_tail.id == NO_VERTEX {
            return Ok(false);
        }
        if self.config.compress_multiples_must_match && tail.count != other_tail.count {
            return Ok(false);
        }
        let count = tail.count.min(other_tail.count);

        self.payload.fuse(&other.payload);

        // The incoming list is stale after a chain merge (predecessors of
        // absorbed interior vertices no longer exist); both lists restart.
        self.to = EdgeChain::new();
        self.from = EdgeChain::new();
        for _ in 0..count {
            self.to
                .insert(other_tail.id, self.config.allow_edge_multiples)?;
        }
        Ok(true)
    }

    /// Keyed pairwise merge: the record whose id equals the key is the
    /// successor and is absorbed into the other. Pairs that do not line up
    /// with the key pass through unchanged. Two chain records can share a
    /// key without being adjacent when both point at the same vertex.
    pub fn compress_pair(
        key: VertexId,
        a: Self,
        b: Self,
    ) -> Result<CompressOutcome<P>, GraphError> {
        if key != NO_VERTEX {
            if key == a.id() {
                let mut survivor = b;
                if survivor.compress_chain(&a)? {
                    return Ok(CompressOutcome::Compressed(survivor));
                }
                return Ok(CompressOutcome::Unchanged(a, survivor));
            }
            if key == b.id() {
                let mut survivor = a;
                if survivor.compress_chain(&b)? {
                    return Ok(CompressOutcome::Compressed(survivor));
                }
                return Ok(CompressOutcome::Unchanged(survivor, b));
            }
        }
        Ok(CompressOutcome::Unchanged(a, b))
    }
}

impl<P: Payload + PartialEq> PartialEq for VertexRecord<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.flags == other.flags
            && self.edges_to().eq(other.edges_to())
            && self.edges_from().eq(other.edges_from())
            && self.payload == other.payload
    }
}

impl<P: Payload> fmt::Display for VertexRecord<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vertex {}", self.id)?;
        if !self.to.is_empty() {
            write!(f, "; to:")?;
            for v in self.edges_to() {
                write!(f, " {v}")?;
            }
        }
        if !self.from.is_empty() {
            write!(f, "; from:")?;
            for v in self.edges_from() {
                write!(f, " {v}")?;
            }
        }
        Ok(())
    }
}
