use thiserror::Error;

use crate::graph::VertexId;

/// Errors surfaced by the graph engine and the record pipeline.
///
/// None of these are retried internally; harness-level retries are the
/// caller's concern. Out-of-range vertex indices on `add_edge`/`remove_edge`
/// are tolerated silently and do not produce a `RangeViolation`; iterator
/// creation and degree queries do.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Vertex index outside `[0, capacity)` where tolerance does not apply.
    #[error("vertex {vertex} out of range for graph capacity {capacity}")]
    RangeViolation { vertex: VertexId, capacity: usize },

    /// Malformed or truncated byte record beyond the recoverable prefix.
    #[error("malformed record: {0}")]
    Framing(String),

    /// Structurally unacceptable input, e.g. a branch record fed to the
    /// chain compressor.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A per-direction edge list would grow past its hard cap.
    #[error("edge list capacity exceeded ({limit} edges per direction)")]
    CapacityExceeded { limit: u16 },

    /// A record payload does not fit the 16-bit length field of the wire
    /// format.
    #[error("record payload too large for wire format ({len} bytes)")]
    PayloadTooLarge { len: usize },

    /// An operation was requested with parameters that make it meaningless,
    /// e.g. non-positive coverage or a merge of records with different ids.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// An underlying stream failed while framing records.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
