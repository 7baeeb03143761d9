//! Record pipeline phases: build, prune, compress.
//!
//! Each phase is a pure per-key reduction over self-contained records, so
//! a harness can run them in-process (as [`crate::assembly::Assembler`]
//! does) or shard them across workers, with a barrier between compression
//! rounds as the only cross-worker ordering requirement.

pub mod build;
pub mod compress;
pub mod prune;

pub use build::{BuildOutput, VertexBuilder};
pub use compress::{ChainCompressor, CompressionStats};
pub use prune::prune_record;
