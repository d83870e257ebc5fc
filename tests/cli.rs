//! Integration tests for the dupescan CLI.
//!
//! These tests run the actual binary against temporary directories of
//! generated images to verify end-to-end behavior.

use assert_cmd::Command;
use image::{DynamicImage, RgbImage};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Render a diagonal gradient; the same content at any resolution should
/// fingerprint as a near-duplicate.
fn write_gradient(path: &Path, width: u32, height: u32) {
    let mut img = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let nx = (x * 255 / width) as u8;
            let ny = (y * 255 / height) as u8;
            img.put_pixel(x, y, image::Rgb([nx, ny, 128]));
        }
    }
    DynamicImage::ImageRgb8(img)
        .save(path)
        .expect("Failed to write test image");
}

/// Render a checkerboard, visually unrelated to the gradient.
fn write_checkerboard(path: &Path, width: u32, height: u32) {
    let mut img = RgbImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = if (x / 10 + y / 10) % 2 == 0 { 255 } else { 0 };
            img.put_pixel(x, y, image::Rgb([v, v, v]));
        }
    }
    DynamicImage::ImageRgb8(img)
        .save(path)
        .expect("Failed to write test image");
}

/// Helper to get dupescan command
fn dupescan() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("dupescan").unwrap()
}

/// A directory with one resized duplicate pair plus an unrelated image
fn setup_gallery() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_gradient(&dir.path().join("beach.png"), 100, 80);
    write_gradient(&dir.path().join("beach_small.png"), 50, 40);
    write_checkerboard(&dir.path().join("tiles.png"), 100, 80);
    dir
}

#[test]
fn test_finds_resized_duplicates_json() {
    let dir = setup_gallery();

    let output = dupescan()
        .arg(dir.path())
        .args(["--method", "dhash", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(result["success"], true);
    assert_eq!(result["method"], "dhash");
    assert_eq!(result["statistics"]["total_files"], 3);
    assert_eq!(result["statistics"]["valid_files"], 3);
    assert_eq!(result["statistics"]["duplicate_groups"], 1);
    assert_eq!(result["statistics"]["total_duplicates"], 1);

    // The lexicographically smallest path is the group key.
    let (key, members) = result["duplicates"]
        .as_object()
        .unwrap()
        .iter()
        .next()
        .unwrap();
    assert!(key.ends_with("beach.png"));
    assert!(members[0].as_str().unwrap().ends_with("beach_small.png"));
}

#[test]
fn test_human_output_summary() {
    let dir = setup_gallery();

    dupescan()
        .arg(dir.path())
        .args(["--method", "dhash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Group 1 (2 files)"))
        .stdout(predicate::str::contains("Summary: 1 group(s), 1 duplicate(s), 3 of 3 files valid"));
}

#[test]
fn test_no_duplicates_at_strict_threshold() {
    let dir = TempDir::new().unwrap();
    write_gradient(&dir.path().join("a.png"), 100, 80);
    write_checkerboard(&dir.path().join("b.png"), 100, 80);

    dupescan()
        .arg(dir.path())
        .args(["--method", "dhash", "--threshold", "0.95"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No duplicates found."));
}

#[test]
fn test_accelerated_run_same_groups() {
    let dir = setup_gallery();

    let output = dupescan()
        .arg(dir.path())
        .args(["--method", "dhash", "--accelerate", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(result["accelerated"], true);
    assert_eq!(result["statistics"]["duplicate_groups"], 1);
}

#[test]
fn test_corrupt_image_counted_invalid() {
    let dir = TempDir::new().unwrap();
    write_gradient(&dir.path().join("ok1.png"), 100, 80);
    write_gradient(&dir.path().join("ok2.png"), 100, 80);
    fs::write(dir.path().join("broken.jpg"), b"not actually a jpeg").unwrap();

    let output = dupescan()
        .arg(dir.path())
        .args(["--method", "dhash", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(result["statistics"]["total_files"], 3);
    assert_eq!(result["statistics"]["valid_files"], 2);
    assert_eq!(result["statistics"]["duplicate_groups"], 1);
}

#[test]
fn test_all_inputs_invalid_structured_result() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("junk1.png"), b"junk").unwrap();
    fs::write(dir.path().join("junk2.png"), b"junk").unwrap();

    let output = dupescan()
        .arg(dir.path())
        .args(["--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(result["success"], false);
    assert_eq!(result["statistics"]["total_files"], 2);
    assert_eq!(result["statistics"]["valid_files"], 0);
    assert_eq!(result["message"], "no valid input images");
}

#[test]
fn test_unknown_method_rejected() {
    let dir = TempDir::new().unwrap();

    dupescan()
        .arg(dir.path())
        .args(["--method", "whash"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --method"));
}

#[test]
fn test_out_of_range_threshold_rejected() {
    let dir = TempDir::new().unwrap();

    dupescan()
        .arg(dir.path())
        .args(["--threshold", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_missing_directory_errors() {
    dupescan()
        .arg("/nonexistent/gallery")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a directory"));
}
