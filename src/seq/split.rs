//! Redundant read splitting.
//!
//! Each copy cuts the sequence into consecutive chunks of random length in
//! `[min_len, max_len]`; different copies cut at different offsets, so the
//! union of copies covers most k-mers that any single copy's chunk
//! boundaries sever. A trailing remainder shorter than `min_len` is merged
//! into the final chunk rather than emitted on its own.

use anyhow::bail;
use rayon::prelude::*;
use tracing::debug;

fn validate(sequence: &str, min_len: usize, max_len: usize) -> crate::Result<()> {
    if min_len == 0 || max_len < min_len {
        bail!("invalid read length range [{min_len}, {max_len}]");
    }
    if sequence.is_empty() {
        bail!("cannot split an empty sequence");
    }
    Ok(())
}

fn split_once(sequence: &str, min_len: usize, max_len: usize, rng: &mut fastrand::Rng, out: &mut Vec<String>) {
    let total = sequence.len();
    let mut left = 0;
    while left < total {
        let length = rng.usize(min_len..=max_len);
        let mut right = left + length;
        if right > total || total - right < min_len {
            right = total;
        }
        out.push(sequence[left..right].to_string());
        left = right;
    }
}

/// Split `copies` passes over the sequence into reads.
pub fn split_reads(
    sequence: &str,
    min_len: usize,
    max_len: usize,
    copies: usize,
    rng: &mut fastrand::Rng,
) -> crate::Result<Vec<String>> {
    validate(sequence, min_len, max_len)?;
    let mut reads = Vec::new();
    for _ in 0..copies {
        split_once(sequence, min_len, max_len, rng, &mut reads);
    }
    debug!(copies, reads = reads.len(), "sequence split into reads");
    Ok(reads)
}

/// The same split fanned out over the thread pool, one seeded generator
/// per copy so workers draw independent cut points.
pub fn split_reads_parallel(
    sequence: &str,
    min_len: usize,
    max_len: usize,
    copies: usize,
    seed: u64,
) -> crate::Result<Vec<String>> {
    validate(sequence, min_len, max_len)?;
    let per_copy: Vec<Vec<String>> = (0..copies)
        .into_par_iter()
        .map(|copy| {
            let mut rng = fastrand::Rng::with_seed(seed.wrapping_add(copy as u64));
            let mut reads = Vec::new();
            split_once(sequence, min_len, max_len, &mut rng, &mut reads);
            reads
        })
        .collect();
    Ok(per_copy.into_iter().flatten().collect())
}
