//! Engine façade: validates configuration, fingerprints inputs in parallel,
//! runs candidate matching and grouping, and assembles the result.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cluster;
use crate::distance::DistanceError;
use crate::encoder::{encode_path, Fingerprint, FingerprintEncoder, Method, UnknownMethod};
use crate::matcher;
use crate::report::DetectionResult;

/// Caller contract violation, rejected before any processing begins.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error(transparent)]
    UnknownMethod(#[from] UnknownMethod),
    #[error("threshold must be in (0, 1], got {0}")]
    Threshold(f64),
}

/// Run-level failure. Per-image problems never surface here — they are
/// absorbed into the statistics of a well-formed result.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Distance(#[from] DistanceError),
}

/// Detection run configuration.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub method: Method,
    /// Similarity cutoff in (0, 1]: two images match iff their normalized
    /// distance is at most `1 - threshold`.
    pub threshold: f64,
    /// Advisory. Opts into the indexed matcher where it applies; the result
    /// records whether it actually ran.
    pub use_accelerator: bool,
}

impl DetectorConfig {
    pub fn new(method: Method, threshold: f64) -> Self {
        DetectorConfig {
            method,
            threshold,
            use_accelerator: false,
        }
    }
}

/// How one input image reaches the engine. The id is an opaque identifier,
/// unique per input; typically the path.
pub enum ImageData {
    /// Resolve and decode from disk at encoding time.
    Path(PathBuf),
    /// Already decoded by the caller.
    Decoded(DynamicImage),
    /// Fingerprint computed elsewhere; must belong to one family across the
    /// whole run.
    Fingerprint(Fingerprint),
}

pub struct ImageInput {
    pub id: String,
    pub data: ImageData,
}

impl ImageInput {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        ImageInput {
            id: path.to_string_lossy().into_owned(),
            data: ImageData::Path(path),
        }
    }

    pub fn decoded(id: impl Into<String>, img: DynamicImage) -> Self {
        ImageInput {
            id: id.into(),
            data: ImageData::Decoded(img),
        }
    }

    pub fn fingerprint(id: impl Into<String>, fingerprint: Fingerprint) -> Self {
        ImageInput {
            id: id.into(),
            data: ImageData::Fingerprint(fingerprint),
        }
    }
}

/// Stateless duplicate-detection engine. One `detect` call per run; nothing
/// is retained between runs.
pub struct Detector {
    config: DetectorConfig,
    encoder: Box<dyn FingerprintEncoder>,
}

impl Detector {
    /// Build a detector with the method's built-in encoder.
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        let encoder = Box::new(config.method);
        Self::with_encoder(config, encoder)
    }

    /// Build a detector with a caller-supplied encoder (custom hash or
    /// embedding model). The configured method still names the run.
    pub fn with_encoder(
        config: DetectorConfig,
        encoder: Box<dyn FingerprintEncoder>,
    ) -> Result<Self, ConfigError> {
        if !(config.threshold > 0.0 && config.threshold <= 1.0) {
            return Err(ConfigError::Threshold(config.threshold));
        }
        Ok(Detector { config, encoder })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run duplicate detection over the inputs.
    ///
    /// Always returns a well-formed result for per-image problems: inputs
    /// that fail to encode are skipped and counted as invalid, and a run
    /// where nothing survives yields an unsuccessful-but-structured result.
    /// Only caller misconfiguration (mixed fingerprint families) is an `Err`.
    pub fn detect(&self, inputs: &[ImageInput]) -> Result<DetectionResult, DetectError> {
        let total_files = inputs.len();
        let method = self.config.method.as_str();

        // Fingerprint every input in parallel. Each worker writes only its
        // own slot, and the collect preserves input order.
        let encoded: Vec<Option<Fingerprint>> = inputs
            .par_iter()
            .map(|input| match &input.data {
                ImageData::Fingerprint(fp) => Some(fp.clone()),
                ImageData::Decoded(img) => Some(self.encoder.encode(img)),
                ImageData::Path(path) => match encode_path(path, self.encoder.as_ref()) {
                    Ok(fp) => Some(fp),
                    Err(e) => {
                        warn!(id = %input.id, "skipping input: {e}");
                        None
                    }
                },
            })
            .collect();

        let mut ids = Vec::new();
        let mut fingerprints = Vec::new();
        for (input, fp) in inputs.iter().zip(encoded) {
            if let Some(fp) = fp {
                ids.push(input.id.clone());
                fingerprints.push(fp);
            }
        }

        let valid_files = fingerprints.len();
        if valid_files == 0 {
            debug!(total_files, "no inputs survived encoding");
            return Ok(DetectionResult::empty(
                method,
                total_files,
                "no valid input images",
            ));
        }

        let cutoff = 1.0 - self.config.threshold;
        let (edges, accelerated) = if self.config.use_accelerator {
            match matcher::indexed(&fingerprints, cutoff) {
                Some(edges) => (edges, true),
                None => (matcher::brute_force(&fingerprints, cutoff)?, false),
            }
        } else {
            (matcher::brute_force(&fingerprints, cutoff)?, false)
        };

        debug!(
            total_files,
            valid_files,
            edges = edges.len(),
            accelerated,
            "matching complete"
        );

        let groups = cluster::build_groups(&ids, &edges);
        Ok(DetectionResult::from_groups(
            method,
            accelerated,
            groups,
            total_files,
            valid_files,
        ))
    }
}
