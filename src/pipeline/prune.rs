//! Coverage-based error pruning.
//!
//! With reads drawn at an expected coverage `c`, a genuine vertex should
//! see roughly `c` parallel edges on each adjacent vertex pair; an edge
//! group far below that is likely a read error. Each group smaller than
//! `ceil(c / 2)` is removed, independently on the outgoing and incoming
//! side. A record left with no surviving group on either side has no
//! corroborating evidence at all and is rejected outright.

use tracing::trace;

use crate::error::GraphError;
use crate::record::vertex::{EdgeDir, Payload, VertexRecord};

/// Prune one fully merged record in place.
///
/// Returns `Ok(true)` when the record survives (its flags recomputed from
/// the surviving edges) and `Ok(false)` when it is rejected. Rejection is
/// a result, not an error. `coverage` must be positive.
pub fn prune_record<P: Payload>(
    record: &mut VertexRecord<P>,
    coverage: i32,
) -> Result<bool, GraphError> {
    if coverage <= 0 {
        return Err(GraphError::Precondition(format!(
            "coverage must be positive when pruning, got {coverage}"
        )));
    }
    let min_cov = (coverage as usize).div_ceil(2);

    let covered_from = sweep(record, EdgeDir::From, min_cov);
    let covered_to = sweep(record, EdgeDir::To, min_cov);

    if !covered_from && !covered_to {
        trace!(vertex = record.id(), "rejected: no surviving edge group");
        return Ok(false);
    }
    record.compute_is_branch();
    record.compute_source_sink();
    Ok(true)
}

/// Remove every undercovered group on one side; true when at least one
/// group survived.
fn sweep<P: Payload>(record: &mut VertexRecord<P>, dir: EdgeDir, min_cov: usize) -> bool {
    let cursor = record.open_cursor(dir);
    let mut survivors = 0usize;
    // Fetch the next group before deleting the current one: the cursor is
    // already positioned beyond the edges being removed, so the removal
    // never touches it.
    let mut group = record.cursor_begin_group(dir, cursor);
    while let Some(current) = group {
        let next = record.cursor_next_group(dir, cursor);
        if current.len() < min_cov {
            match dir {
                EdgeDir::To => record.remove_edge_to(current[0]),
                EdgeDir::From => record.remove_edge_from(current[0]),
            }
        } else {
            survivors += 1;
        }
        group = next;
    }
    record.close_cursor(dir, cursor);
    survivors > 0
}
