//! # EulerForge - De Novo Sequence Assembly Engine
//!
//! A de Bruijn-style directed-graph engine for reconstructing an unknown
//! string from redundant short reads. Reads become edges between fixed
//! length prefix/suffix vertices; coverage pruning drops likely-erroneous
//! vertices, chain compression collapses linear runs, and Euler tours over
//! the compressed graph yield candidate reconstructions.

pub mod assembly;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod record;
pub mod seq;
pub mod utils;

// Re-export commonly used types at crate level
pub use crate::error::GraphError;
pub use crate::graph::{Edge, VertexId, NO_VERTEX};
pub use crate::utils::config::{CoreConfig, DISABLE_COVERAGE};

/// Result type used throughout the crate
pub type Result<T> = anyhow::Result<T>;

/// Error type used throughout the crate
pub type Error = anyhow::Error;
