//! Strongly-connected components.
//!
//! Tarjan's algorithm over a [`Digraph`], iterativized with an explicit
//! frame stack so component extraction does not recurse on deep graphs.

use crate::error::GraphError;
use crate::graph::digraph::Digraph;
use crate::graph::{Edge, VertexId};

const UNVISITED: usize = usize::MAX;

/// Component labels for every vertex of a graph.
#[derive(Debug, Clone)]
pub struct StrongComponents {
    ids: Vec<usize>,
    count: usize,
}

impl StrongComponents {
    pub fn compute<E: Edge>(graph: &Digraph<E>) -> Result<Self, GraphError> {
        let n = graph.vertex_capacity();
        let mut index = vec![UNVISITED; n];
        let mut low = vec![0usize; n];
        let mut ids = vec![UNVISITED; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<usize> = Vec::new();
        let mut next_index = 0usize;
        let mut count = 0usize;

        // (vertex, out-neighbors, next neighbor offset)
        let mut frames: Vec<(usize, Vec<usize>, usize)> = Vec::new();

        for root in 0..n {
            if index[root] != UNVISITED {
                continue;
            }
            index[root] = next_index;
            low[root] = next_index;
            next_index += 1;
            stack.push(root);
            on_stack[root] = true;
            frames.push((root, Self::neighbors(graph, root)?, 0));

            while let Some(frame) = frames.last_mut() {
                let v = frame.0;
                if frame.2 < frame.1.len() {
                    let w = frame.1[frame.2];
                    frame.2 += 1;
                    if index[w] == UNVISITED {
                        index[w] = next_index;
                        low[w] = next_index;
                        next_index += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        frames.push((w, Self::neighbors(graph, w)?, 0));
                    } else if on_stack[w] {
                        low[v] = low[v].min(index[w]);
                    }
                } else {
                    frames.pop();
                    if let Some(parent) = frames.last_mut() {
                        low[parent.0] = low[parent.0].min(low[v]);
                    }
                    if low[v] == index[v] {
                        loop {
                            let w = match stack.pop() {
                                Some(w) => w,
                                None => break,
                            };
                            on_stack[w] = false;
                            ids[w] = count;
                            if w == v {
                                break;
                            }
                        }
                        count += 1;
                    }
                }
            }
        }

        Ok(Self { ids, count })
    }

    fn neighbors<E: Edge>(graph: &Digraph<E>, v: usize) -> Result<Vec<usize>, GraphError> {
        Ok(graph
            .out_edges(v as VertexId)?
            .map(|e| e.to() as usize)
            .collect())
    }

    /// Number of components.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Component label of `v`, if in range.
    pub fn component_of(&self, v: VertexId) -> Option<usize> {
        if v < 0 {
            return None;
        }
        self.ids.get(v as usize).copied()
    }

    /// True when `v` and `w` are mutually reachable.
    pub fn strongly_reachable(&self, v: VertexId, w: VertexId) -> bool {
        match (self.component_of(v), self.component_of(w)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
