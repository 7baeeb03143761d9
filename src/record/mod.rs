//! Self-contained records and their wire formats.
//!
//! The pipeline exchanges two record kinds, distinguished solely by a
//! leading tag byte: vertex records (tag 1) and edge records (tag 2).
//! Anything else in a stream is a framing error.

pub mod edge;
pub mod vertex;
pub mod wire;

use std::io::{Read, Write};

pub use edge::EdgeRecord;
pub use vertex::{CompressOutcome, EdgeDir, EdgeFormat, Payload, VertexRecord};
pub use wire::{FrameReader, FrameWriter, TAG_EDGE, TAG_VERTEX};

use crate::error::GraphError;
use crate::utils::config::CoreConfig;
use vertex::{FLAG_IS_BRANCH, FLAG_IS_SINK, FLAG_IS_SOURCE};

/// True when the bytes carry a vertex record, judged solely by the leading
/// tag byte.
pub fn is_vertex_bytes(bytes: &[u8]) -> bool {
    bytes.first() == Some(&TAG_VERTEX)
}

/// True when the bytes carry a vertex record flagged as a branch, without
/// decoding the record.
pub fn is_branch_bytes(bytes: &[u8]) -> bool {
    is_vertex_bytes(bytes) && bytes.get(1).is_some_and(|f| f & FLAG_IS_BRANCH != 0)
}

/// True when the bytes carry a vertex record flagged as a source.
pub fn is_source_bytes(bytes: &[u8]) -> bool {
    is_vertex_bytes(bytes) && bytes.get(1).is_some_and(|f| f & FLAG_IS_SOURCE != 0)
}

/// True when the bytes carry a vertex record flagged as a sink.
pub fn is_sink_bytes(bytes: &[u8]) -> bool {
    is_vertex_bytes(bytes) && bytes.get(1).is_some_and(|f| f & FLAG_IS_SINK != 0)
}

/// One record of a mixed input stream.
#[derive(Debug, Clone)]
pub enum StreamRecord<P: Payload = Vec<u8>> {
    Vertex(VertexRecord<P>),
    Edge(EdgeRecord),
}

impl<P: Payload> StreamRecord<P> {
    /// Dispatch on the leading tag byte. Unknown tags terminate parsing
    /// with a framing error.
    pub fn parse(bytes: &[u8], config: CoreConfig) -> Result<Self, GraphError> {
        match bytes.first() {
            Some(&TAG_VERTEX) => Ok(Self::Vertex(VertexRecord::from_bytes(bytes, config)?)),
            Some(&TAG_EDGE) => Ok(Self::Edge(EdgeRecord::from_bytes(bytes)?)),
            other => Err(GraphError::Framing(format!(
                "unknown record tag {other:?}"
            ))),
        }
    }

    pub fn to_bytes(&self, format: EdgeFormat) -> Result<Vec<u8>, GraphError> {
        match self {
            Self::Vertex(v) => v.to_bytes(format),
            Self::Edge(e) => Ok(e.to_bytes()),
        }
    }
}

/// Read an entire framed record stream.
pub fn read_stream<P: Payload, R: Read>(
    reader: R,
    config: CoreConfig,
) -> Result<Vec<StreamRecord<P>>, GraphError> {
    let mut frames = FrameReader::new(reader);
    let mut records = Vec::new();
    while let Some(frame) = frames.next_frame()? {
        records.push(StreamRecord::parse(&frame, config)?);
    }
    Ok(records)
}

/// Write vertex records as a framed stream. Only vertex records travel
/// downstream; edge evidence is consumed during the build phase.
pub fn write_stream<P: Payload, W: Write>(
    writer: W,
    records: &[VertexRecord<P>],
    format: EdgeFormat,
) -> Result<(), GraphError> {
    let mut frames = FrameWriter::new(writer);
    for record in records {
        frames.write_frame(&record.to_bytes(format)?)?;
    }
    Ok(())
}
