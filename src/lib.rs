//! dupescan: near-duplicate image detection via perceptual fingerprints.
//!
//! The engine fingerprints images (bit hashes or embeddings), finds every
//! pair within a normalized distance cutoff, groups matches into connected
//! components, and reports the groups with statistics. Image decoding comes
//! from the `image` crate; everything else about storage, traversal, and
//! output format is left to the caller.
//!
//! ```no_run
//! use dupescan::{Detector, DetectorConfig, ImageInput, Method};
//!
//! let detector = Detector::new(DetectorConfig::new(Method::Phash, 0.9))?;
//! let inputs = vec![
//!     ImageInput::from_path("photos/beach.jpg"),
//!     ImageInput::from_path("photos/beach_copy.jpg"),
//! ];
//! let result = detector.detect(&inputs)?;
//! for (key, duplicates) in &result.duplicates {
//!     println!("{} has {} duplicates", key, duplicates.len());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cluster;
pub mod detector;
pub mod distance;
pub mod encoder;
pub mod logging;
pub mod matcher;
pub mod report;
pub mod scanner;

pub use cluster::DuplicateGroup;
pub use detector::{ConfigError, DetectError, Detector, DetectorConfig, ImageData, ImageInput};
pub use distance::DistanceError;
pub use encoder::{EncodeError, Family, Fingerprint, FingerprintEncoder, Method};
pub use report::{DetectionResult, Statistics};
