//! Candidate matching: find every fingerprint pair whose normalized distance
//! falls within the cutoff.
//!
//! Two strategies produce the exact same edge set: an all-pairs brute force
//! (the reference), and a multi-index Hamming lookup for bit hashes that
//! prunes most pairs on large collections.

use rayon::prelude::*;

use crate::distance::{distance, hamming_distance, DistanceError};
use crate::encoder::Fingerprint;

/// An unordered matching pair, stored with `a < b` (indices into the
/// fingerprint slice) plus the distance that qualified it.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchEdge {
    pub a: usize,
    pub b: usize,
    pub distance: f64,
}

/// All-pairs reference matcher.
///
/// Returns every pair with `distance <= cutoff`, exactly once, sorted by
/// `(a, b)`. Rows are compared in parallel; each worker fills its own edge
/// vector and the results are concatenated, so the output never depends on
/// thread interleaving. Zero or one fingerprint yields zero edges.
pub fn brute_force(fingerprints: &[Fingerprint], cutoff: f64) -> Result<Vec<MatchEdge>, DistanceError> {
    let n = fingerprints.len();
    if n < 2 {
        return Ok(Vec::new());
    }

    let rows: Result<Vec<Vec<MatchEdge>>, DistanceError> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut row = Vec::new();
            for j in (i + 1)..n {
                let d = distance(&fingerprints[i], &fingerprints[j])?;
                if d <= cutoff {
                    row.push(MatchEdge { a: i, b: j, distance: d });
                }
            }
            Ok(row)
        })
        .collect();

    let mut edges: Vec<MatchEdge> = rows?.into_iter().flatten().collect();
    edges.sort_by(|x, y| (x.a, x.b).cmp(&(y.a, y.b)));
    Ok(edges)
}

const NUM_CHUNKS: usize = 8;
const CHUNK_BITS: usize = 8;
const NUM_BUCKETS: usize = 1 << CHUNK_BITS;

/// Largest bit cutoff the index answers exhaustively. With 8 chunks and
/// 1-bit-per-chunk probing, any pair within 15 bits shares some chunk up to
/// one flipped bit (pigeonhole).
pub const MAX_INDEXED_DISTANCE: u32 = 15;

/// Multi-index Hamming table: one bucket table per 8-bit chunk of the hash.
struct MihIndex {
    hashes: Vec<u64>,
    tables: [Vec<Vec<u32>>; NUM_CHUNKS],
}

impl MihIndex {
    fn new(hashes: Vec<u64>) -> Self {
        let empty_table = vec![Vec::new(); NUM_BUCKETS];
        let mut tables: [Vec<Vec<u32>>; NUM_CHUNKS] = std::array::from_fn(|_| empty_table.clone());

        for (id, &hash) in hashes.iter().enumerate() {
            for k in 0..NUM_CHUNKS {
                tables[k][Self::chunk(hash, k) as usize].push(id as u32);
            }
        }

        MihIndex { hashes, tables }
    }

    #[inline]
    fn chunk(hash: u64, chunk_idx: usize) -> u16 {
        ((hash >> (chunk_idx * CHUNK_BITS)) & 0xFF) as u16
    }

    /// Every index whose hash is within `max_bits` of `query_hash`,
    /// including the query itself. Sorted, deduplicated.
    fn query(&self, query_hash: u64, max_bits: u32) -> Vec<u32> {
        let mut results = Vec::new();
        let chunk_tolerance = max_bits / NUM_CHUNKS as u32;

        for k in 0..NUM_CHUNKS {
            let q_chunk = Self::chunk(query_hash, k);

            let mut probe = |bucket_val: u16| {
                for &idx in &self.tables[k][bucket_val as usize] {
                    // Exact distance check before collecting, so buckets only
                    // act as a candidate filter.
                    if hamming_distance(self.hashes[idx as usize], query_hash) <= max_bits {
                        results.push(idx);
                    }
                }
            };

            probe(q_chunk);
            if chunk_tolerance >= 1 {
                for bit in 0..CHUNK_BITS {
                    probe(q_chunk ^ (1 << bit));
                }
            }
        }

        results.sort_unstable();
        results.dedup();
        results
    }
}

/// Indexed matcher for the bit-hash family.
///
/// Returns `None` when it does not apply — non-bit fingerprints, or a cutoff
/// wider than the index can answer exhaustively — in which case the caller
/// falls back to `brute_force`. When it does apply, the edge set is identical
/// to brute force for the same inputs and cutoff.
pub fn indexed(fingerprints: &[Fingerprint], cutoff: f64) -> Option<Vec<MatchEdge>> {
    let hashes: Option<Vec<u64>> = fingerprints
        .iter()
        .map(|f| match f {
            Fingerprint::Bits(bits) => Some(*bits),
            Fingerprint::Embedding(_) => None,
        })
        .collect();
    let hashes = hashes?;

    // Same integer cutoff the normalized comparison implies: popcounts are
    // whole numbers, so d <= cutoff iff popcount <= floor(cutoff * 64).
    let max_bits = (cutoff * 64.0).floor() as u32;
    if max_bits > MAX_INDEXED_DISTANCE {
        return None;
    }

    if hashes.len() < 2 {
        return Some(Vec::new());
    }

    let index = MihIndex::new(hashes);
    let rows: Vec<Vec<MatchEdge>> = (0..index.hashes.len())
        .into_par_iter()
        .map(|i| {
            index
                .query(index.hashes[i], max_bits)
                .into_iter()
                .map(|j| j as usize)
                .filter(|&j| j > i)
                .map(|j| MatchEdge {
                    a: i,
                    b: j,
                    distance: hamming_distance(index.hashes[i], index.hashes[j]) as f64 / 64.0,
                })
                .collect()
        })
        .collect();

    let mut edges: Vec<MatchEdge> = rows.into_iter().flatten().collect();
    edges.sort_by(|x, y| (x.a, x.b).cmp(&(y.a, y.b)));
    Some(edges)
}
