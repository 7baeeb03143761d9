//! Euler tour extraction.
//!
//! Finds the Euler tours of a directed graph: the walks that use each edge
//! of a weakly-connected component exactly once. The classic linear-time
//! algorithm, driven by a capacity-sized table of adjacency cursors and an
//! explicit trace stack so the graph itself is never mutated.
//!
//! The Eulerian precondition (every vertex's in-degree equals its
//! out-degree) is not checked: a graph that violates it yields best-effort
//! paths that may not be closed. Callers that need closure must validate
//! degrees themselves.

use std::collections::VecDeque;

use tracing::debug;

use crate::error::GraphError;
use crate::graph::adjacency::EdgeCursor;
use crate::graph::digraph::Digraph;
use crate::graph::{Edge, VertexId};

/// The tours of a graph, each an ordered sequence of vertex indices.
#[derive(Debug, Clone)]
pub struct EulerPaths {
    paths: Vec<VecDeque<VertexId>>,
}

impl EulerPaths {
    /// Walk the graph and collect its tours.
    ///
    /// Takes the graph mutably for cursor registration and lazy degree
    /// caching only; the edge set is unchanged on return.
    pub fn compute<E: Edge>(graph: &mut Digraph<E>) -> Result<Self, GraphError> {
        let capacity = graph.vertex_capacity();
        let mut cursors: Vec<Option<EdgeCursor>> = vec![None; capacity];
        let mut trace_stack: Vec<VertexId> = Vec::new();
        let mut paths: Vec<VecDeque<VertexId>> = Vec::new();

        for i in 0..capacity {
            let start = i as VertexId;
            if graph.out_degree(start)? <= 0 {
                continue;
            }
            // Skip vertices whose cursor a previous tour already exhausted.
            if let Some(cursor) = cursors[i] {
                if graph.cursor_done(start, cursor) {
                    continue;
                }
            }

            let mut v = start;
            let mut path = VecDeque::new();
            path.push_back(v);
            while Self::trace(graph, &mut cursors, &mut trace_stack, v)? == v {
                match trace_stack.pop() {
                    Some(u) => {
                        v = u;
                        path.push_front(v);
                    }
                    None => break,
                }
            }
            paths.push(path);
        }

        for (i, cursor) in cursors.into_iter().enumerate() {
            if let Some(cursor) = cursor {
                graph.close_cursor(i as VertexId, cursor);
            }
        }

        debug!(paths = paths.len(), "euler tour extraction complete");
        Ok(Self { paths })
    }

    /// Follow unused edges from `v` until stuck, pushing each departed
    /// vertex on the trace stack. Returns the vertex the walk got stuck at.
    fn trace<E: Edge>(
        graph: &mut Digraph<E>,
        cursors: &mut [Option<EdgeCursor>],
        trace_stack: &mut Vec<VertexId>,
        mut v: VertexId,
    ) -> Result<VertexId, GraphError> {
        loop {
            let slot = v as usize;
            let edge = match cursors[slot] {
                None => {
                    let cursor = graph.cursor(v)?;
                    cursors[slot] = Some(cursor);
                    graph.cursor_begin(v, cursor)
                }
                Some(cursor) => graph.cursor_next(v, cursor),
            };
            match edge {
                None => break,
                Some(edge) => {
                    trace_stack.push(v);
                    v = edge.to();
                }
            }
        }
        Ok(v)
    }

    pub fn paths(&self) -> &[VecDeque<VertexId>] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<VecDeque<VertexId>> {
        self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::digraph::{BasicDigraph, EdgeMultiples, PlainEdge};

    fn graph_with_edges(capacity: usize, edges: &[(VertexId, VertexId)]) -> BasicDigraph {
        let mut graph = BasicDigraph::new(capacity, EdgeMultiples::Enabled);
        for &(from, to) in edges {
            graph.add_edge(from, PlainEdge::new(to)).unwrap();
        }
        graph
    }

    fn path_vec(path: &VecDeque<VertexId>) -> Vec<VertexId> {
        path.iter().copied().collect()
    }

    #[test]
    fn four_cycle_yields_single_closed_tour() {
        let mut graph = graph_with_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let tours = EulerPaths::compute(&mut graph).unwrap();
        assert_eq!(tours.paths().len(), 1);
        let path = path_vec(&tours.paths()[0]);
        assert_eq!(path.len(), 5);
        assert_eq!(path.first(), path.last());
        // The tour is a rotation of 0 -> 1 -> 2 -> 3 -> 0.
        let rotation: Vec<VertexId> = (0..4).map(|i| (path[0] + i) % 4).collect();
        assert_eq!(&path[..4], &rotation[..]);
    }

    #[test]
    fn figure_eight_splices_subcycles() {
        // Two cycles sharing vertex 0: 0 -> 1 -> 0 and 0 -> 2 -> 0.
        let mut graph = graph_with_edges(3, &[(0, 1), (1, 0), (0, 2), (2, 0)]);
        let tours = EulerPaths::compute(&mut graph).unwrap();
        assert_eq!(tours.paths().len(), 1);
        let path = path_vec(&tours.paths()[0]);
        // Every edge used exactly once: 4 edges, 5 vertices in the walk.
        assert_eq!(path.len(), 5);
        assert_eq!(path.first(), path.last());
        let mut used: Vec<(VertexId, VertexId)> =
            path.windows(2).map(|w| (w[0], w[1])).collect();
        used.sort_unstable();
        assert_eq!(used, vec![(0, 1), (0, 2), (1, 0), (2, 0)]);
    }

    #[test]
    fn disjoint_cycles_yield_one_tour_each() {
        let mut graph = graph_with_edges(6, &[(0, 1), (1, 0), (3, 4), (4, 5), (5, 3)]);
        let tours = EulerPaths::compute(&mut graph).unwrap();
        assert_eq!(tours.paths().len(), 2);
        for path in tours.paths() {
            assert_eq!(path.front(), path.back());
        }
    }

    #[test]
    fn parallel_edges_are_each_walked() {
        let mut graph = graph_with_edges(2, &[(0, 1), (0, 1), (1, 0), (1, 0)]);
        let tours = EulerPaths::compute(&mut graph).unwrap();
        assert_eq!(tours.paths().len(), 1);
        // 4 edges -> 5 vertices in the closed walk.
        assert_eq!(tours.paths()[0].len(), 5);
    }

    #[test]
    fn graph_is_not_mutated() {
        let mut graph = graph_with_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        EulerPaths::compute(&mut graph).unwrap();
        for v in 0..4 {
            assert_eq!(graph.out_degree(v).unwrap(), 1);
            let edges: Vec<VertexId> =
                graph.out_edges(v).unwrap().map(|e| e.to()).collect();
            assert_eq!(edges, vec![(v + 1) % 4]);
        }
        // A second extraction over the same graph sees the same tours.
        let again = EulerPaths::compute(&mut graph).unwrap();
        assert_eq!(again.paths().len(), 1);
        assert_eq!(again.paths()[0].len(), 5);
    }

    #[test]
    fn empty_graph_has_no_tours() {
        let mut graph = BasicDigraph::new(3, EdgeMultiples::Disabled);
        let tours = EulerPaths::compute(&mut graph).unwrap();
        assert!(tours.paths().is_empty());
    }
}
