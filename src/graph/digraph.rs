//! Fixed-capacity directed graph over the adjacency substrate.
//!
//! Vertices are addressed by index in `0..capacity`. Out-of-range indices
//! on `add_edge`/`remove_edge` are silently tolerated; cursor creation and
//! degree queries reject them. In- and out-degrees are cached lazily: a
//! first query sweeps the whole graph, and subsequent edge mutations update
//! the caches incrementally. A cached value of `-1` means the vertex has
//! not been touched by any edge.

use crate::error::GraphError;
use crate::graph::adjacency::{EdgeChain, EdgeCursor};
use crate::graph::{Edge, VertexId};

/// Whether a graph admits parallel edges between an ordered vertex pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMultiples {
    Enabled,
    Disabled,
}

/// A simple edge carrying only its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainEdge {
    to: VertexId,
}

impl PlainEdge {
    pub fn new(to: VertexId) -> Self {
        Self { to }
    }
}

impl Edge for PlainEdge {
    fn to(&self) -> VertexId {
        self.to
    }
}

/// An edge carrying a finite real weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedEdge {
    to: VertexId,
    weight: f32,
}

impl WeightedEdge {
    /// `weight` must be finite; non-finite weights are rejected at the
    /// boundary rather than propagated through the algorithms.
    pub fn new(to: VertexId, weight: f32) -> Self {
        debug_assert!(weight.is_finite(), "edge weight must be finite");
        Self { to, weight }
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        debug_assert!(weight.is_finite(), "edge weight must be finite");
        self.weight = weight;
    }
}

impl Edge for WeightedEdge {
    fn to(&self) -> VertexId {
        self.to
    }
}

pub type BasicDigraph = Digraph<PlainEdge>;
pub type WeightedDigraph = Digraph<WeightedEdge>;

/// A directed graph with a fixed vertex capacity.
#[derive(Debug, Clone)]
pub struct Digraph<E: Edge> {
    chains: Vec<EdgeChain<E>>,
    allow_multiples: bool,
    out_degrees: Option<Vec<i32>>,
    in_degrees: Option<Vec<i32>>,
}

impl<E: Edge> Digraph<E> {
    /// Create a graph addressing vertices `0..vertex_capacity`.
    pub fn new(vertex_capacity: usize, multiples: EdgeMultiples) -> Self {
        debug_assert!(
            vertex_capacity <= i32::MAX as usize,
            "vertex capacity must fit a signed 32-bit index"
        );
        Self {
            chains: (0..vertex_capacity).map(|_| EdgeChain::new()).collect(),
            allow_multiples: multiples == EdgeMultiples::Enabled,
            out_degrees: None,
            in_degrees: None,
        }
    }

    pub fn vertex_capacity(&self) -> usize {
        self.chains.len()
    }

    pub fn edge_multiples(&self) -> EdgeMultiples {
        if self.allow_multiples {
            EdgeMultiples::Enabled
        } else {
            EdgeMultiples::Disabled
        }
    }

    fn in_range(&self, v: VertexId) -> bool {
        v >= 0 && (v as usize) < self.chains.len()
    }

    fn range_error(&self, v: VertexId) -> GraphError {
        GraphError::RangeViolation {
            vertex: v,
            capacity: self.chains.len(),
        }
    }

    /// Add an edge from `from`. Out-of-range endpoints are silently
    /// ignored; only the per-direction capacity bound is an error.
    pub fn add_edge(&mut self, from: VertexId, edge: E) -> Result<(), GraphError> {
        let to = edge.to();
        if !self.in_range(from) || !self.in_range(to) {
            return Ok(());
        }
        let inserted = self.chains[from as usize].insert(edge, self.allow_multiples)?;
        if inserted {
            // Keep the same "touched" semantics as the full sweep: the new
            // edge touches both endpoints in both arrays.
            if let Some(in_degrees) = &mut self.in_degrees {
                let d = in_degrees[to as usize];
                in_degrees[to as usize] = if d == -1 { 1 } else { d + 1 };
                if in_degrees[from as usize] == -1 {
                    in_degrees[from as usize] = 0;
                }
            }
            if let Some(out_degrees) = &mut self.out_degrees {
                let d = out_degrees[from as usize];
                out_degrees[from as usize] = if d == -1 { 1 } else { d + 1 };
                if out_degrees[to as usize] == -1 {
                    out_degrees[to as usize] = 0;
                }
            }
        }
        Ok(())
    }

    /// Remove every edge from `from` to `to`. Out-of-range endpoints are
    /// silently ignored.
    pub fn remove_edge(&mut self, from: VertexId, to: VertexId) {
        if !self.in_range(from) || !self.in_range(to) {
            return;
        }
        let removed = self.chains[from as usize].remove_all(to) as i32;
        if removed > 0 {
            if let Some(in_degrees) = &mut self.in_degrees {
                let d = in_degrees[to as usize];
                in_degrees[to as usize] = if d != -1 { d - removed } else { 0 };
            }
            if let Some(out_degrees) = &mut self.out_degrees {
                let d = out_degrees[from as usize];
                out_degrees[from as usize] = if d != -1 { d - removed } else { 0 };
            }
        }
    }

    /// Number of edges directed out of `from`; `-1` if the vertex has
    /// never been touched by an edge.
    pub fn out_degree(&mut self, from: VertexId) -> Result<i32, GraphError> {
        if !self.in_range(from) {
            return Err(self.range_error(from));
        }
        self.cache_degrees();
        Ok(self.out_degrees.as_ref().map_or(-1, |d| d[from as usize]))
    }

    /// Number of edges directed into `to`; `-1` if the vertex has never
    /// been touched by an edge.
    pub fn in_degree(&mut self, to: VertexId) -> Result<i32, GraphError> {
        if !self.in_range(to) {
            return Err(self.range_error(to));
        }
        self.cache_degrees();
        Ok(self.in_degrees.as_ref().map_or(-1, |d| d[to as usize]))
    }

    /// True when the vertex has no outgoing edges.
    pub fn is_sink(&self, v: VertexId) -> Result<bool, GraphError> {
        if !self.in_range(v) {
            return Err(self.range_error(v));
        }
        Ok(self.chains[v as usize].is_empty())
    }

    /// Read-only iteration over the out-edges of `from`, in destination
    /// order.
    pub fn out_edges(&self, from: VertexId) -> Result<impl Iterator<Item = &E>, GraphError> {
        if !self.in_range(from) {
            return Err(self.range_error(from));
        }
        Ok(self.chains[from as usize].iter())
    }

    /// Register a cursor over the out-edges of `from`.
    pub fn cursor(&mut self, from: VertexId) -> Result<EdgeCursor, GraphError> {
        if !self.in_range(from) {
            return Err(self.range_error(from));
        }
        Ok(self.chains[from as usize].open_cursor())
    }

    pub fn cursor_begin(&mut self, from: VertexId, cursor: EdgeCursor) -> Option<E> {
        self.chains.get_mut(from as usize)?.cursor_begin(cursor)
    }

    pub fn cursor_next(&mut self, from: VertexId, cursor: EdgeCursor) -> Option<E> {
        self.chains.get_mut(from as usize)?.cursor_next(cursor)
    }

    pub fn cursor_done(&self, from: VertexId, cursor: EdgeCursor) -> bool {
        match self.chains.get(from as usize) {
            Some(chain) => chain.cursor_done(cursor),
            None => true,
        }
    }

    pub fn cursor_begin_group(&mut self, from: VertexId, cursor: EdgeCursor) -> Option<Vec<E>> {
        self.chains
            .get_mut(from as usize)?
            .cursor_begin_group(cursor)
    }

    pub fn cursor_next_group(&mut self, from: VertexId, cursor: EdgeCursor) -> Option<Vec<E>> {
        self.chains
            .get_mut(from as usize)?
            .cursor_next_group(cursor)
    }

    pub fn close_cursor(&mut self, from: VertexId, cursor: EdgeCursor) {
        if let Some(chain) = self.chains.get_mut(from as usize) {
            chain.close_cursor(cursor);
        }
    }

    /// One sweep populates both degree arrays; afterwards mutations keep
    /// them consistent incrementally. A vertex never touched by any edge
    /// stays at `-1`.
    fn cache_degrees(&mut self) {
        if self.in_degrees.is_some() && self.out_degrees.is_some() {
            return;
        }

        let n = self.chains.len();
        let mut in_degrees = vec![-1i32; n];
        let mut out_degrees = vec![-1i32; n];
        for v in 0..n {
            let mut out_degree = 0i32;
            for edge in self.chains[v].iter() {
                out_degree += 1;
                let to = edge.to() as usize;
                in_degrees[to] = if in_degrees[to] == -1 {
                    1
                } else {
                    in_degrees[to] + 1
                };
                if out_degrees[to] == -1 {
                    out_degrees[to] = 0;
                }
            }
            if out_degree > 0 {
                out_degrees[v] = out_degree;
                if in_degrees[v] == -1 {
                    in_degrees[v] = 0;
                }
            }
        }
        self.in_degrees = Some(in_degrees);
        self.out_degrees = Some(out_degrees);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_ids(graph: &BasicDigraph, from: VertexId) -> Vec<VertexId> {
        graph
            .out_edges(from)
            .unwrap()
            .map(|e| e.to())
            .collect()
    }

    #[test]
    fn out_of_range_add_and_remove_are_noops() {
        let mut graph = BasicDigraph::new(4, EdgeMultiples::Disabled);
        graph.add_edge(-1, PlainEdge::new(2)).unwrap();
        graph.add_edge(0, PlainEdge::new(9)).unwrap();
        graph.add_edge(7, PlainEdge::new(0)).unwrap();
        graph.remove_edge(0, 9);
        graph.remove_edge(-3, 1);
        assert!(to_ids(&graph, 0).is_empty());
    }

    #[test]
    fn cursor_creation_rejects_out_of_range() {
        let mut graph = BasicDigraph::new(2, EdgeMultiples::Disabled);
        assert!(matches!(
            graph.cursor(5),
            Err(GraphError::RangeViolation { vertex: 5, .. })
        ));
        assert!(graph.cursor(-1).is_err());
        assert!(graph.cursor(1).is_ok());
    }

    #[test]
    fn degrees_are_cached_lazily() {
        let mut graph = BasicDigraph::new(5, EdgeMultiples::Enabled);
        graph.add_edge(0, PlainEdge::new(1)).unwrap();
        graph.add_edge(0, PlainEdge::new(1)).unwrap();
        graph.add_edge(1, PlainEdge::new(2)).unwrap();

        assert_eq!(graph.out_degree(0).unwrap(), 2);
        assert_eq!(graph.in_degree(1).unwrap(), 2);
        assert_eq!(graph.in_degree(2).unwrap(), 1);
        assert_eq!(graph.out_degree(2).unwrap(), 0);
        // Vertex 4 was never touched by any edge.
        assert_eq!(graph.out_degree(4).unwrap(), -1);
        assert_eq!(graph.in_degree(4).unwrap(), -1);
    }

    #[test]
    fn degree_queries_reject_out_of_range() {
        let mut graph = BasicDigraph::new(3, EdgeMultiples::Disabled);
        assert!(graph.out_degree(3).is_err());
        assert!(graph.in_degree(-1).is_err());
    }

    #[test]
    fn mutation_updates_cached_degrees() {
        let mut graph = BasicDigraph::new(4, EdgeMultiples::Enabled);
        graph.add_edge(0, PlainEdge::new(1)).unwrap();
        assert_eq!(graph.out_degree(0).unwrap(), 1);

        graph.add_edge(0, PlainEdge::new(1)).unwrap();
        graph.add_edge(2, PlainEdge::new(1)).unwrap();
        assert_eq!(graph.out_degree(0).unwrap(), 2);
        assert_eq!(graph.in_degree(1).unwrap(), 3);

        // Removal deletes both parallels and the caches follow.
        graph.remove_edge(0, 1);
        assert_eq!(graph.out_degree(0).unwrap(), 0);
        assert_eq!(graph.in_degree(1).unwrap(), 1);
    }

    #[test]
    fn incremental_update_touches_both_arrays_like_the_sweep() {
        let mut graph = BasicDigraph::new(4, EdgeMultiples::Disabled);
        // Force the caches into existence before any edge lands.
        assert_eq!(graph.out_degree(0).unwrap(), -1);

        graph.add_edge(0, PlainEdge::new(1)).unwrap();
        // Both endpoints are now touched in both arrays, exactly as a
        // fresh full sweep would report them.
        assert_eq!(graph.out_degree(0).unwrap(), 1);
        assert_eq!(graph.in_degree(0).unwrap(), 0);
        assert_eq!(graph.out_degree(1).unwrap(), 0);
        assert_eq!(graph.in_degree(1).unwrap(), 1);
        // An untouched vertex still reads as untouched.
        assert_eq!(graph.out_degree(3).unwrap(), -1);
    }

    #[test]
    fn duplicate_add_without_multiples_leaves_degrees_alone() {
        let mut graph = BasicDigraph::new(3, EdgeMultiples::Disabled);
        graph.add_edge(0, PlainEdge::new(1)).unwrap();
        assert_eq!(graph.out_degree(0).unwrap(), 1);
        graph.add_edge(0, PlainEdge::new(1)).unwrap();
        assert_eq!(graph.out_degree(0).unwrap(), 1);
        assert_eq!(to_ids(&graph, 0), vec![1]);
    }

    #[test]
    fn weighted_edges_carry_weights() {
        let mut graph = WeightedDigraph::new(3, EdgeMultiples::Enabled);
        graph.add_edge(0, WeightedEdge::new(1, 0.5)).unwrap();
        graph.add_edge(0, WeightedEdge::new(2, 2.0)).unwrap();
        let weights: Vec<f32> = graph
            .out_edges(0)
            .unwrap()
            .map(|e| e.weight())
            .collect();
        assert_eq!(weights, vec![0.5, 2.0]);
    }

    #[test]
    fn is_sink_reflects_out_edges() {
        let mut graph = BasicDigraph::new(3, EdgeMultiples::Disabled);
        graph.add_edge(0, PlainEdge::new(1)).unwrap();
        assert!(!graph.is_sink(0).unwrap());
        assert!(graph.is_sink(1).unwrap());
        assert!(graph.is_sink(9).is_err());
    }

    #[test]
    fn graph_cursor_survives_removal() {
        let mut graph = BasicDigraph::new(5, EdgeMultiples::Disabled);
        for to in [1, 2, 3] {
            graph.add_edge(0, PlainEdge::new(to)).unwrap();
        }
        let cursor = graph.cursor(0).unwrap();
        graph.cursor_begin(0, cursor);
        graph.cursor_next(0, cursor); // at 2
        graph.remove_edge(0, 2);
        assert_eq!(graph.cursor_next(0, cursor).map(|e| e.to()), Some(3));
    }
}
