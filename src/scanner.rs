use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Check if a file has a decodable image extension
pub fn is_image_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    matches!(
        ext.as_str(),
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff" | "tif" | "webp"
    )
}

/// Recursively collect all image files under a root directory.
///
/// Entries are walked in filename order so runs over the same tree always
/// produce the same input list.
pub fn scan_images(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_image_file(path))
        .collect()
}
