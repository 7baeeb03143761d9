//! Vertex building: merge partial records, apply coverage, partition.
//!
//! Builders upstream emit one partial vertex record per observation plus
//! one edge record per out-edge, delivered to the destination vertex. This
//! phase groups everything by vertex id, merges the partials, folds in the
//! edge evidence as incoming edges, optionally prunes by coverage, and
//! recomputes the classification flags. Output is split into branch and
//! chain records so that only chains reach the compressor.

use ahash::AHashMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::GraphError;
use crate::graph::VertexId;
use crate::pipeline::prune::prune_record;
use crate::record::{EdgeRecord, Payload, StreamRecord, VertexRecord};
use crate::utils::config::{CoreConfig, DISABLE_COVERAGE};

/// Builder output, partitioned by the branch flag when
/// `partition_branches_chains` is set; otherwise everything lands in
/// `chain`.
#[derive(Debug)]
pub struct BuildOutput<P: Payload> {
    pub branch: Vec<VertexRecord<P>>,
    pub chain: Vec<VertexRecord<P>>,
}

impl<P: Payload> BuildOutput<P> {
    /// All records regardless of partition, chains first.
    pub fn into_records(self) -> Vec<VertexRecord<P>> {
        let mut records = self.chain;
        records.extend(self.branch);
        records
    }
}

#[derive(Debug)]
struct KeyGroup<P: Payload> {
    vertices: Vec<VertexRecord<P>>,
    edges: Vec<EdgeRecord>,
}

impl<P: Payload> Default for KeyGroup<P> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
        }
    }
}

/// Merges a mixed record stream into one final record per vertex.
#[derive(Debug, Clone)]
pub struct VertexBuilder {
    config: CoreConfig,
}

impl VertexBuilder {
    pub fn new(config: CoreConfig) -> Self {
        Self { config }
    }

    /// Consume an input stream and produce the final per-vertex records.
    ///
    /// Every vertex record also contributes one edge record per out-edge,
    /// delivered to the destination vertex so it learns its incoming
    /// adjacency. Standalone edge records in the input are delivered the
    /// same way. A vertex that only ever appears as an edge destination
    /// produces no output.
    pub fn run<P: Payload>(
        &self,
        inputs: impl IntoIterator<Item = StreamRecord<P>>,
    ) -> Result<BuildOutput<P>, GraphError> {
        let mut groups: AHashMap<VertexId, KeyGroup<P>> = AHashMap::new();
        let mut input_count = 0usize;
        for input in inputs {
            input_count += 1;
            match input {
                StreamRecord::Vertex(vertex) => {
                    let id = vertex.id();
                    let outs: Vec<VertexId> = vertex.edges_to().collect();
                    groups.entry(id).or_default().vertices.push(vertex);
                    for to in outs {
                        groups
                            .entry(to)
                            .or_default()
                            .edges
                            .push(EdgeRecord::new(id, to));
                    }
                }
                StreamRecord::Edge(edge) => {
                    groups.entry(edge.to()).or_default().edges.push(edge);
                }
            }
        }
        debug!(
            inputs = input_count,
            keys = groups.len(),
            "vertex build scatter complete"
        );

        let config = self.config;
        let mut merged: Vec<VertexRecord<P>> = groups
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(_, group)| reduce_group(group, &config))
            .collect::<Result<Vec<_>, GraphError>>()?
            .into_iter()
            .flatten()
            .collect();
        merged.sort_by_key(|record| record.id());

        let (branch, chain) = if self.config.partition_branches_chains {
            merged.into_iter().partition(|record| record.is_branch())
        } else {
            (Vec::new(), merged)
        };
        info!(
            branches = branch.len(),
            chains = chain.len(),
            "vertex build complete"
        );
        Ok(BuildOutput { branch, chain })
    }
}

/// Merge one key group into its final record, or reject it.
fn reduce_group<P: Payload>(
    group: KeyGroup<P>,
    config: &CoreConfig,
) -> Result<Option<VertexRecord<P>>, GraphError> {
    if group.vertices.is_empty() && group.edges.is_empty() {
        return Err(GraphError::InvalidInput(
            "empty value set in vertex build reduction".into(),
        ));
    }

    let mut vertices = group.vertices.into_iter();
    let Some(mut vertex) = vertices.next() else {
        // Edge evidence without a vertex observation: nothing to emit.
        return Ok(None);
    };
    for partial in vertices {
        vertex.merge(&partial)?;
    }
    for edge in &group.edges {
        vertex.add_edge_record(edge)?;
    }

    if config.coverage != DISABLE_COVERAGE && !prune_record(&mut vertex, config.coverage)? {
        return Ok(None);
    }

    vertex.compute_is_branch();
    vertex.compute_source_sink();
    Ok(Some(vertex))
}
