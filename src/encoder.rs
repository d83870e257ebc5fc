use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;

use crate::scanner::is_image_file;

/// Comparison semantics implied by an encoder family.
///
/// Downstream code picks the distance metric from the family without ever
/// looking inside a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Fixed-width bit vectors, compared by normalized Hamming distance.
    BitHash,
    /// Dense float vectors, compared by cosine distance.
    Embedding,
}

/// Compact fixed-size representation of an image, used only through the
/// distance evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Fingerprint {
    /// 64-bit perceptual hash.
    Bits(u64),
    /// Fixed-length feature vector.
    Embedding(Vec<f32>),
}

impl Fingerprint {
    pub fn family(&self) -> Family {
        match self {
            Fingerprint::Bits(_) => Family::BitHash,
            Fingerprint::Embedding(_) => Family::Embedding,
        }
    }
}

/// Built-in fingerprinting methods.
///
/// `Dhash`, `Ahash` and `Phash` produce 64-bit hashes; `Grid` produces a
/// 64-dimensional luminance embedding and serves as the reference
/// embedding-family encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Dhash,
    Ahash,
    Phash,
    Grid,
}

impl Method {
    pub fn family(&self) -> Family {
        match self {
            Method::Dhash | Method::Ahash | Method::Phash => Family::BitHash,
            Method::Grid => Family::Embedding,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Dhash => "dhash",
            Method::Ahash => "ahash",
            Method::Phash => "phash",
            Method::Grid => "grid",
        }
    }
}

/// Error for an unrecognized method name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown method: {0} (expected phash, dhash, ahash, or grid)")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dhash" => Ok(Method::Dhash),
            "ahash" => Ok(Method::Ahash),
            "phash" => Ok(Method::Phash),
            "grid" | "embedding" => Ok(Method::Grid),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

/// Maps a decoded image to a fingerprint.
///
/// Must be deterministic: the same pixels always produce the same
/// fingerprint. Implementations are injected into the detector, so custom
/// hash or embedding schemes can replace the built-in ones.
pub trait FingerprintEncoder: Send + Sync {
    /// The family every fingerprint from this encoder belongs to.
    fn family(&self) -> Family;

    /// Compute the fingerprint of an already-decoded image.
    fn encode(&self, img: &DynamicImage) -> Fingerprint;
}

impl FingerprintEncoder for Method {
    fn family(&self) -> Family {
        Method::family(self)
    }

    fn encode(&self, img: &DynamicImage) -> Fingerprint {
        match self {
            Method::Dhash => Fingerprint::Bits(dhash_from_image(img)),
            Method::Ahash => Fingerprint::Bits(ahash_from_image(img)),
            Method::Phash => Fingerprint::Bits(phash_from_image(img)),
            Method::Grid => Fingerprint::Embedding(grid_from_image(img)),
        }
    }
}

/// Per-image encoding failure. Recoverable: the image is skipped and counted
/// as invalid.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("not an image file: {0}")]
    NotAnImage(PathBuf),
    #[error("failed to open image {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Load an image from disk and fingerprint it with the given encoder.
pub fn encode_path(path: &Path, encoder: &dyn FingerprintEncoder) -> Result<Fingerprint, EncodeError> {
    if !is_image_file(path) {
        return Err(EncodeError::NotAnImage(path.to_path_buf()));
    }

    let img = image::open(path).map_err(|e| EncodeError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(encoder.encode(&img))
}

/// Compute dHash (difference hash) from a decoded image. Returns a 64-bit
/// perceptual hash.
///
/// Algorithm:
/// 1. Resize to 9×8 grayscale
/// 2. For each of 8 rows, compare 8 adjacent pixel pairs → 64 bits
///
/// Two visually similar images will have hashes with low Hamming distance.
pub fn dhash_from_image(img: &DynamicImage) -> u64 {
    // 9 columns so we can compare 8 pairs per row
    let resized = img.resize_exact(9, 8, FilterType::Lanczos3);
    let gray = resized.to_luma8();

    let mut hash: u64 = 0;
    for y in 0..8 {
        for x in 0..8 {
            let left = gray.get_pixel(x, y)[0];
            let right = gray.get_pixel(x + 1, y)[0];
            if left > right {
                hash |= 1 << (y * 8 + x);
            }
        }
    }

    hash
}

/// Compute aHash (average hash): each of the 8×8 grayscale pixels is compared
/// to the mean luminance.
pub fn ahash_from_image(img: &DynamicImage) -> u64 {
    let resized = img.resize_exact(8, 8, FilterType::Lanczos3);
    let gray = resized.to_luma8();

    let sum: u32 = gray.pixels().map(|p| p.0[0] as u32).sum();
    let mean = sum / 64;

    let mut hash: u64 = 0;
    for (i, p) in gray.pixels().enumerate() {
        if p.0[0] as u32 > mean {
            hash |= 1 << i;
        }
    }

    hash
}

const DCT_SIZE: usize = 32;

/// Compute pHash (DCT-based perceptual hash), the most robust of the hash
/// family against re-encoding and resizing.
///
/// 1. Resize to 32×32 grayscale
/// 2. 2-D DCT
/// 3. Keep the top-left 8×8 low frequencies, DC excluded (63 coefficients)
/// 4. Set a bit for each coefficient above the median
pub fn phash_from_image(img: &DynamicImage) -> u64 {
    let resized = img.resize_exact(DCT_SIZE as u32, DCT_SIZE as u32, FilterType::Lanczos3);
    let pixels: Vec<f64> = resized.to_luma8().pixels().map(|p| p.0[0] as f64).collect();

    let dct = dct_2d(&pixels, DCT_SIZE);

    // Top-left 8×8 block carries the low frequencies; the DC component would
    // only encode overall brightness, so it is skipped.
    let mut coeffs = Vec::with_capacity(63);
    for y in 0..8 {
        for x in 0..8 {
            if x == 0 && y == 0 {
                continue;
            }
            coeffs.push(dct[y * DCT_SIZE + x]);
        }
    }

    let mut sorted = coeffs.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = sorted[sorted.len() / 2];

    let mut hash: u64 = 0;
    for (i, &c) in coeffs.iter().enumerate() {
        if c > median {
            hash |= 1 << i;
        }
    }

    hash
}

/// 2-D DCT-II via separable 1-D passes with a precomputed cosine table.
/// Unnormalized, which is fine since bits come from a median comparison.
fn dct_2d(pixels: &[f64], size: usize) -> Vec<f64> {
    let cos_table: Vec<f64> = (0..size)
        .flat_map(|u| {
            (0..size).map(move |x| {
                ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / (2.0 * size as f64)).cos()
            })
        })
        .collect();

    // Rows
    let mut rows = vec![0.0; size * size];
    for y in 0..size {
        for u in 0..size {
            let mut sum = 0.0;
            for x in 0..size {
                sum += pixels[y * size + x] * cos_table[u * size + x];
            }
            rows[y * size + u] = sum;
        }
    }

    // Columns
    let mut out = vec![0.0; size * size];
    for x in 0..size {
        for v in 0..size {
            let mut sum = 0.0;
            for y in 0..size {
                sum += rows[y * size + x] * cos_table[v * size + y];
            }
            out[v * size + x] = sum;
        }
    }

    out
}

/// Reference embedding encoder: the 8×8 grayscale thumbnail flattened into a
/// 64-dimensional vector. Stands in for learned feature extractors, which
/// plug in through `FingerprintEncoder`.
pub fn grid_from_image(img: &DynamicImage) -> Vec<f32> {
    let resized = img.resize_exact(8, 8, FilterType::Lanczos3);
    resized
        .to_luma8()
        .pixels()
        .map(|p| p.0[0] as f32 / 255.0)
        .collect()
}
