//! Iterated randomized chain compression.
//!
//! A chain `v0 -> v1 -> ... -> vn` whose interior vertices neither branch
//! in nor branch out can be collapsed to a single record. Collapsing is
//! pairwise: each round, every record draws a pairing key (its own id or
//! its unique successor's id, by fair coin), records are grouped by key,
//! and a group holding a record together with its agreeing predecessor is
//! merged. The coin prevents conflicting adjacent merges that would leave
//! a chain stuck half-compressed.
//!
//! Rounds repeat until `termination_count` consecutive rounds perform no
//! merge. Since every merge strictly reduces the record count, the whole
//! run terminates after at most the initial record count of productive
//! rounds.

use ahash::AHashMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::GraphError;
use crate::graph::VertexId;
use crate::record::vertex::{CompressOutcome, Payload, VertexRecord};
use crate::utils::config::CoreConfig;

/// Summary of one compression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionStats {
    /// Rounds executed, including the final silent ones.
    pub rounds: usize,
    /// Total successful merges across all rounds.
    pub merges: usize,
}

/// Per-run iteration state. Deliberately request-scoped: two concurrent
/// compression runs must not share counters.
#[derive(Debug, Default)]
struct CompressionRun {
    round: usize,
    silent: u32,
    merges: usize,
}

/// Drives chain compression over a set of non-branch records.
#[derive(Debug, Clone)]
pub struct ChainCompressor {
    config: CoreConfig,
    seed: u64,
}

impl ChainCompressor {
    /// A compressor with a run seed drawn from the global generator.
    pub fn new(config: CoreConfig) -> Self {
        Self::with_seed(config, fastrand::u64(..))
    }

    /// A compressor with a fixed seed; rounds are then deterministic.
    pub fn with_seed(config: CoreConfig, seed: u64) -> Self {
        Self { config, seed }
    }

    /// Iterate compression rounds until `termination_count` consecutive
    /// rounds are silent. Returns the surviving records sorted by id.
    pub fn compress_to_fixpoint<P: Payload>(
        &self,
        records: Vec<VertexRecord<P>>,
    ) -> Result<(Vec<VertexRecord<P>>, CompressionStats), GraphError> {
        let mut run = CompressionRun::default();
        let limit = self.config.termination_count.max(1);
        let mut records = records;

        loop {
            let round_seed = mix(self.seed, run.round as u64);
            let (next, merges) = self.round_keyed(records, |record| {
                let mut rng = fastrand::Rng::with_seed(mix(round_seed, record.id() as u64));
                record.compress_chain_key(&mut rng)
            })?;
            records = next;
            run.round += 1;
            run.merges += merges;
            if merges == 0 {
                run.silent += 1;
            } else {
                run.silent = 0;
            }
            debug!(
                round = run.round,
                merges,
                remaining = records.len(),
                "chain compression round"
            );
            if run.silent >= limit {
                break;
            }
        }

        info!(
            rounds = run.round,
            merges = run.merges,
            records = records.len(),
            "chain compression finished"
        );
        Ok((
            records,
            CompressionStats {
                rounds: run.round,
                merges: run.merges,
            },
        ))
    }

    /// One pair-and-merge round with an explicit key function. Branch
    /// records must never enter the compressor.
    pub(crate) fn round_keyed<P: Payload>(
        &self,
        records: Vec<VertexRecord<P>>,
        key_of: impl Fn(&VertexRecord<P>) -> VertexId,
    ) -> Result<(Vec<VertexRecord<P>>, usize), GraphError> {
        let mut groups: AHashMap<VertexId, Vec<VertexRecord<P>>> = AHashMap::new();
        for record in records {
            if record.is_branch() {
                return Err(GraphError::InvalidInput(format!(
                    "branch record {} fed to the chain compressor",
                    record.id()
                )));
            }
            groups.entry(key_of(&record)).or_default().push(record);
        }

        let reduced: Vec<(Vec<VertexRecord<P>>, usize)> = groups
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(key, mut bucket)| -> Result<_, GraphError> {
                if bucket.len() != 2 {
                    // A single record passes through. More than two at one
                    // key cannot happen for well-formed chain input; such
                    // records also pass through untouched.
                    return Ok((bucket, 0));
                }
                let (Some(b), Some(a)) = (bucket.pop(), bucket.pop()) else {
                    return Ok((bucket, 0));
                };
                match VertexRecord::compress_pair(key, a, b)? {
                    CompressOutcome::Compressed(merged) => Ok((vec![merged], 1)),
                    CompressOutcome::Unchanged(a, b) => Ok((vec![a, b], 0)),
                }
            })
            .collect::<Result<Vec<_>, GraphError>>()?;

        let mut merges = 0usize;
        let mut out = Vec::new();
        for (bucket, bucket_merges) in reduced {
            merges += bucket_merges;
            out.extend(bucket);
        }
        out.sort_by_key(|r| r.id());
        Ok((out, merges))
    }
}

/// Cheap 64-bit mix for deriving per-round, per-record seeds; keeps the
/// coin flips of a distributed round independent without shared state.
fn mix(a: u64, b: u64) -> u64 {
    (a ^ b.wrapping_mul(0x9e37_79b9_7f4a_7c15)).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NO_VERTEX;
    use crate::utils::config::CoreConfig;

    type Record = VertexRecord<Vec<u8>>;

    fn chain_record(id: VertexId, to: VertexId, config: CoreConfig) -> Record {
        let mut record = Record::new(id, config);
        if to != NO_VERTEX {
            record.add_edge_to(to).unwrap();
        }
        record
    }

    #[test]
    fn forced_pairing_compresses_a_three_link_chain_in_two_rounds() {
        let config = CoreConfig::default();
        let compressor = ChainCompressor::with_seed(config, 0);
        let records = vec![
            chain_record(1, 2, config),
            chain_record(2, 3, config),
            chain_record(3, 4, config),
        ];

        // Round 1: pair 1 and 2 at key 2; 3 keys to itself.
        let (records, merges) = compressor
            .round_keyed(records, |r| if r.id() <= 2 { 2 } else { 3 })
            .unwrap();
        assert_eq!(merges, 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), 1);
        assert_eq!(records[0].edges_to().collect::<Vec<_>>(), vec![3]);

        // Round 2: pair the merged record with 3 at key 3.
        let (records, merges) = compressor.round_keyed(records, |_| 3).unwrap();
        assert_eq!(merges, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), 1);
        assert_eq!(records[0].edges_to().collect::<Vec<_>>(), vec![4]);

        // Round 3 is silent.
        let (records, merges) = compressor
            .round_keyed(records, |r| r.id())
            .unwrap();
        assert_eq!(merges, 0);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn fixpoint_reduces_a_chain_to_its_head() {
        let config = CoreConfig {
            termination_count: 4,
            ..CoreConfig::default()
        };
        let records: Vec<Record> = (0..8).map(|i| chain_record(i, i + 1, config)).collect();
        let compressor = ChainCompressor::with_seed(config, 7);
        let (records, stats) = compressor.compress_to_fixpoint(records).unwrap();

        // Whatever the coin flips did, the survivors partition the chain:
        // consecutive records, each pointing at the next one's id.
        assert!(!records.is_empty());
        assert_eq!(records[0].id(), 0);
        let mut expected_next = None;
        for record in &records {
            if let Some(expected) = expected_next {
                assert_eq!(record.id(), expected);
            }
            let to: Vec<VertexId> = record.edges_to().collect();
            assert_eq!(to.len(), 1);
            expected_next = Some(to[0]);
        }
        assert_eq!(expected_next, Some(8));
        assert_eq!(stats.merges, 8 - records.len());
        assert!(stats.rounds >= 4);
    }

    #[test]
    fn record_count_never_increases_across_rounds() {
        let config = CoreConfig::default();
        let compressor = ChainCompressor::with_seed(config, 3);
        let mut records: Vec<Record> =
            (0..6).map(|i| chain_record(i, i + 1, config)).collect();
        let mut previous = records.len();
        for round in 0..6 {
            let seed = mix(3, round as u64);
            let (next, _) = compressor
                .round_keyed(records, |r| {
                    let mut rng = fastrand::Rng::with_seed(mix(seed, r.id() as u64));
                    r.compress_chain_key(&mut rng)
                })
                .unwrap();
            assert!(next.len() <= previous);
            previous = next.len();
            records = next;
        }
    }

    #[test]
    fn branch_record_is_invalid_input() {
        let config = CoreConfig::default();
        let mut branch = Record::new(1, config);
        branch.add_edge_to(2).unwrap();
        branch.add_edge_to(5).unwrap();
        branch.compute_is_branch();

        let compressor = ChainCompressor::with_seed(config, 0);
        assert!(matches!(
            compressor.compress_to_fixpoint(vec![branch]),
            Err(GraphError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_input_terminates_silently() {
        let config = CoreConfig::default();
        let compressor = ChainCompressor::with_seed(config, 0);
        let (records, stats) = compressor
            .compress_to_fixpoint(Vec::<Record>::new())
            .unwrap();
        assert!(records.is_empty());
        assert_eq!(stats.merges, 0);
        assert_eq!(stats.rounds, 1);
    }

    #[test]
    fn payload_fusion_runs_on_merge() {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Tag(String);
        impl Payload for Tag {
            fn to_bytes(&self) -> Vec<u8> {
                self.0.as_bytes().to_vec()
            }
            fn from_bytes(bytes: &[u8]) -> Result<Self, GraphError> {
                Ok(Self(String::from_utf8_lossy(bytes).into_owned()))
            }
            fn fuse(&mut self, successor: &Self) {
                self.0.push_str(&successor.0);
            }
        }

        let config = CoreConfig::default();
        let mut a = VertexRecord::with_payload(1, Tag("a".into()), config);
        a.add_edge_to(2).unwrap();
        let mut b = VertexRecord::with_payload(2, Tag("b".into()), config);
        b.add_edge_to(3).unwrap();

        let compressor = ChainCompressor::with_seed(config, 0);
        let (records, merges) = compressor
            .round_keyed(vec![a, b], |_| 2)
            .unwrap();
        assert_eq!(merges, 1);
        assert_eq!(records[0].payload(), &Tag("ab".into()));
    }
}
