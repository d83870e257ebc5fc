use thiserror::Error;

use crate::encoder::Fingerprint;

/// Fingerprints from incompatible encoders were compared. Fatal for the run:
/// it means the caller mixed encoder families or embedding widths.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DistanceError {
    #[error("cannot compare fingerprints from different encoder families")]
    MixedFamilies,
    #[error("embedding length mismatch: {0} vs {1}")]
    LengthMismatch(usize, usize),
}

/// Normalized distance between two fingerprints, in [0, 1].
///
/// 0 means identical, 1 maximally dissimilar, regardless of method: bit
/// hashes use Hamming distance over 64 bits, embeddings use 1 − cosine
/// similarity clamped to [0, 1]. This lets the matcher apply the single rule
/// `distance <= 1 - threshold` for every encoder family.
pub fn distance(a: &Fingerprint, b: &Fingerprint) -> Result<f64, DistanceError> {
    match (a, b) {
        (Fingerprint::Bits(x), Fingerprint::Bits(y)) => {
            Ok(hamming_distance(*x, *y) as f64 / 64.0)
        }
        (Fingerprint::Embedding(x), Fingerprint::Embedding(y)) => {
            if x.len() != y.len() {
                return Err(DistanceError::LengthMismatch(x.len(), y.len()));
            }
            Ok(cosine_distance(x, y))
        }
        _ => Err(DistanceError::MixedFamilies),
    }
}

/// Hamming distance between two perceptual hashes (number of differing bits).
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// 1 − cosine similarity, clamped to [0, 1].
///
/// Cosine is undefined for a zero-magnitude vector; such a vector is treated
/// as identical to itself (distance 0) and maximally distant from everything
/// else, which keeps symmetry and self-distance-zero intact.
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += *x as f64 * *y as f64;
        norm_a += *x as f64 * *x as f64;
        norm_b += *y as f64 * *y as f64;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return if a == b { 0.0 } else { 1.0 };
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    (1.0 - similarity).clamp(0.0, 1.0)
}
