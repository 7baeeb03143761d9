//! The assembly façade: reads in, candidate reconstructions out.
//!
//! Drives the full pipeline over k-mer records: map reads to per-mer
//! vertex records, build (merge + optional coverage pruning + partition),
//! compress the chains to a fixpoint, lay the surviving records out as a
//! digraph, extract Euler tours, and translate each tour back into text by
//! joining the vertex fragments on their `k-2` overlap.
//!
//! Tour extraction emits closed tours on Eulerian graphs. A linear target
//! string leaves one source and one sink, so the façade closes that gap
//! with a synthetic sink-to-source edge before touring, then rotates the
//! tour to start at the source and drops the synthetic edge. Graphs with
//! any other degree profile are toured as-is, best effort.

use ahash::AHashMap;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assembly::kmer::{MerCodec, MerPayload};
use crate::graph::{BasicDigraph, Edge, EdgeMultiples, EulerPaths, PlainEdge, VertexId};
use crate::pipeline::{ChainCompressor, VertexBuilder};
use crate::record::{StreamRecord, VertexRecord};
use crate::utils::config::CoreConfig;

/// Assembly parameters on top of the engine configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// K-mer length; vertices are `(k-1)`-mers.
    pub k: usize,
    /// Fixed seed for the compression pairing coin; `None` draws one.
    pub seed: Option<u64>,
    /// Engine configuration handed through to every phase.
    pub core: CoreConfig,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            k: 5,
            seed: None,
            core: CoreConfig::default(),
        }
    }
}

impl AssemblyConfig {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }
}

/// De-novo assembler over the de Bruijn record pipeline.
#[derive(Debug, Clone)]
pub struct Assembler {
    config: AssemblyConfig,
    codec: MerCodec,
}

impl Assembler {
    pub fn new(config: AssemblyConfig) -> crate::Result<Self> {
        config.core.validate()?;
        let codec = MerCodec::new(config.k)?;
        Ok(Self { config, codec })
    }

    /// Reconstruct candidate strings from a redundant read set.
    pub fn assemble<S: AsRef<str>>(&self, reads: &[S]) -> crate::Result<Vec<String>> {
        let records = self.records_from_reads(reads)?;
        info!(
            reads = reads.len(),
            records = records.len(),
            k = self.config.k,
            "assembly records mapped"
        );

        let builder = VertexBuilder::new(self.config.core);
        let built = builder.run(records).context("vertex build failed")?;

        let compressor = match self.config.seed {
            Some(seed) => ChainCompressor::with_seed(self.config.core, seed),
            None => ChainCompressor::new(self.config.core),
        };
        let (chains, stats) = compressor
            .compress_to_fixpoint(built.chain)
            .context("chain compression failed")?;
        debug!(
            rounds = stats.rounds,
            merges = stats.merges,
            "assembly chains compressed"
        );

        let mut records = built.branch;
        records.extend(chains);
        self.tours_to_text(&records)
    }

    /// One vertex record per mer occurrence, each carrying its fragment
    /// and an edge to the next mer of the read.
    fn records_from_reads<S: AsRef<str>>(
        &self,
        reads: &[S],
    ) -> crate::Result<Vec<StreamRecord<MerPayload>>> {
        let mer_len = self.codec.mer_len();
        let overlap = mer_len - 1;
        let mut records = Vec::new();
        for read in reads {
            let read = read.as_ref();
            if read.len() < mer_len {
                warn!(len = read.len(), mer_len, "read shorter than a mer, skipped");
                continue;
            }
            let mut ids = Vec::with_capacity(read.len() - mer_len + 1);
            for start in 0..=read.len() - mer_len {
                ids.push(self.codec.encode(&read[start..start + mer_len])?);
            }
            for (i, &id) in ids.iter().enumerate() {
                let fragment = &read[i..i + mer_len];
                let mut record = VertexRecord::with_payload(
                    id,
                    MerPayload::new(fragment, overlap),
                    self.config.core,
                );
                if let Some(&next) = ids.get(i + 1) {
                    record.add_edge_to(next)?;
                }
                records.push(StreamRecord::Vertex(record));
            }
        }
        Ok(records)
    }

    /// Lay the final records out as a graph, tour it, and join fragments.
    fn tours_to_text(&self, records: &[VertexRecord<MerPayload>]) -> crate::Result<Vec<String>> {
        let fragments: AHashMap<VertexId, &str> = records
            .iter()
            .map(|record| (record.id(), record.payload().seq()))
            .collect();

        // Multiplicities at this point reflect read redundancy, not the
        // target string, so the tour graph carries each distinct edge once.
        let mut graph = BasicDigraph::new(self.codec.vertex_capacity(), EdgeMultiples::Disabled);
        for record in records {
            for to in record.edges_to() {
                graph.add_edge(record.id(), PlainEdge::new(to))?;
            }
        }

        let closure = self.close_linear_gap(records, &mut graph)?;
        let tours = EulerPaths::compute(&mut graph)?;

        let overlap = self.codec.mer_len() - 1;
        let mut texts = Vec::new();
        for path in tours.paths() {
            let mut vertices: Vec<VertexId> = path.iter().copied().collect();
            if let Some((sink, source)) = closure {
                vertices = open_tour(vertices, sink, source);
            }
            let Some((&first, rest)) = vertices.split_first() else {
                continue;
            };
            let mut text = fragments
                .get(&first)
                .map_or_else(|| self.codec.decode(first), |s| s.to_string());
            for &v in rest {
                match fragments.get(&v) {
                    Some(fragment) => text.push_str(&fragment[overlap.min(fragment.len())..]),
                    None => {
                        let mer = self.codec.decode(v);
                        text.push_str(&mer[overlap..]);
                    }
                }
            }
            texts.push(text);
        }
        info!(tours = texts.len(), "assembly complete");
        Ok(texts)
    }

    /// When the records leave exactly one source and one sink, add a
    /// synthetic sink-to-source edge so the tour closes. Returns the pair
    /// when the edge was added.
    fn close_linear_gap(
        &self,
        records: &[VertexRecord<MerPayload>],
        graph: &mut BasicDigraph,
    ) -> crate::Result<Option<(VertexId, VertexId)>> {
        let sources: Vec<VertexId> = records
            .iter()
            .filter(|r| r.is_source())
            .map(|r| r.id())
            .collect();
        let sinks: Vec<VertexId> = records
            .iter()
            .filter(|r| r.is_sink())
            .map(|r| r.id())
            .collect();
        let (&[source], &[sink]) = (sources.as_slice(), sinks.as_slice()) else {
            debug!(
                sources = sources.len(),
                sinks = sinks.len(),
                "no unique linear gap, touring as-is"
            );
            return Ok(None);
        };
        // A real edge between the two would make the synthetic one
        // indistinguishable; leave such a graph alone.
        if graph.out_edges(sink)?.any(|e| e.to() == source) {
            return Ok(None);
        }
        graph.add_edge(sink, PlainEdge::new(source))?;
        debug!(sink, source, "closed linear gap for touring");
        Ok(Some((sink, source)))
    }
}

/// Rotate a closed tour to start just past the synthetic sink-to-source
/// edge and drop that edge, leaving the open source-to-sink walk.
fn open_tour(vertices: Vec<VertexId>, sink: VertexId, source: VertexId) -> Vec<VertexId> {
    if vertices.len() < 2 || vertices.first() != vertices.last() {
        return vertices;
    }
    let cycle_len = vertices.len() - 1;
    let cut = (0..cycle_len).find(|&j| vertices[j] == sink && vertices[j + 1] == source);
    let Some(cut) = cut else {
        return vertices;
    };
    (0..cycle_len)
        .map(|step| vertices[(cut + 1 + step) % cycle_len])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_tour_rotates_and_strips_the_closure() {
        // Closed walk 2 -> 3 -> 1 -> 0 -> 2 with synthetic edge 1 -> 0:
        // cutting there leaves the open walk 0 -> 2 -> 3 -> 1.
        let walk = vec![2, 3, 1, 0, 2];
        assert_eq!(open_tour(walk, 1, 0), vec![0, 2, 3, 1]);
    }

    #[test]
    fn open_tour_leaves_unclosed_walks_alone() {
        let walk = vec![0, 1, 2];
        assert_eq!(open_tour(walk.clone(), 2, 0), walk);
    }

    #[test]
    fn single_read_reconstructs_itself() {
        let assembler = Assembler::new(AssemblyConfig::new(4)).unwrap();
        let out = assembler.assemble(&["ACGTT"]).unwrap();
        assert_eq!(out, vec!["ACGTT".to_string()]);
    }

    #[test]
    fn short_reads_are_skipped() {
        let assembler = Assembler::new(AssemblyConfig::new(5)).unwrap();
        let out = assembler.assemble(&["ACG"]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn invalid_bases_are_reported() {
        let assembler = Assembler::new(AssemblyConfig::new(4)).unwrap();
        assert!(assembler.assemble(&["ACGXACG"]).is_err());
    }
}
