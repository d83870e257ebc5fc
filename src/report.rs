//! Final result assembly: grouped duplicates plus the statistics a caller
//! needs to act on them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cluster::DuplicateGroup;

/// Aggregate counts for one detection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Inputs supplied by the caller.
    pub total_files: usize,
    /// Inputs that produced a fingerprint.
    pub valid_files: usize,
    /// Duplicate groups found (size >= 2).
    pub duplicate_groups: usize,
    /// Sum of non-key members across all groups.
    pub total_duplicates: usize,
}

/// The sole artifact of a detection run. Immutable once built; the caller
/// decides the wire or text representation.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub success: bool,
    pub method: String,
    /// Whether the indexed matcher actually ran (the accelerator flag is
    /// advisory, so this can be false even when it was requested).
    pub accelerated: bool,
    /// Canonical key -> lexicographically ordered duplicate members.
    pub duplicates: BTreeMap<String, Vec<String>>,
    pub statistics: Statistics,
    /// Diagnostic for unsuccessful runs, e.g. no valid inputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DetectionResult {
    /// Assemble a successful result from duplicate groups.
    pub fn from_groups(
        method: &str,
        accelerated: bool,
        groups: Vec<DuplicateGroup>,
        total_files: usize,
        valid_files: usize,
    ) -> Self {
        let total_duplicates = groups.iter().map(|g| g.duplicates.len()).sum();
        let duplicate_groups = groups.len();
        let duplicates: BTreeMap<String, Vec<String>> =
            groups.into_iter().map(|g| (g.key, g.duplicates)).collect();

        DetectionResult {
            success: true,
            method: method.to_string(),
            accelerated,
            duplicates,
            statistics: Statistics {
                total_files,
                valid_files,
                duplicate_groups,
                total_duplicates,
            },
            message: None,
        }
    }

    /// Well-formed result for a run where nothing could be processed. Not an
    /// error: the caller still gets statistics and a diagnostic message.
    pub fn empty(method: &str, total_files: usize, message: &str) -> Self {
        DetectionResult {
            success: false,
            method: method.to_string(),
            accelerated: false,
            duplicates: BTreeMap::new(),
            statistics: Statistics {
                total_files,
                valid_files: 0,
                duplicate_groups: 0,
                total_duplicates: 0,
            },
            message: Some(message.to_string()),
        }
    }
}
