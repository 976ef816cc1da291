// ABOUTME: Utility functions for the slidedecks application
// ABOUTME: Provides path validation and the guarded copy helpers used by every stage

use crate::errors::{DeckError, Result};
use log::{debug, warn};
use std::fs;
use std::path::Path;

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DeckError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(DeckError::ValidationError(format!(
            "Path is not a file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Validate that a directory exists
pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DeckError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(DeckError::ValidationError(format!(
            "Path is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(DeckError::FileReadError)?;
    } else if !path.is_dir() {
        return Err(DeckError::ValidationError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a file's parent directory exists
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        ensure_directory_exists(parent)?;
    }
    Ok(())
}

/// Recursively copy `src` into `dst`, overwriting files that already exist.
/// Returns the number of files copied.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<usize> {
    validate_directory_exists(src)?;
    ensure_directory_exists(dst)?;

    let mut copied = 0;
    for entry in fs::read_dir(src).map_err(DeckError::FileReadError)? {
        let entry = entry.map_err(DeckError::FileReadError)?;
        let file_type = entry.file_type().map_err(DeckError::FileReadError)?;
        let target = dst.join(entry.file_name());
        if file_type.is_dir() {
            copied += copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(DeckError::FileReadError)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Copy a directory if it exists. A missing source is logged and skipped.
pub fn copy_dir_if_exists(src: &Path, dst: &Path) -> Result<bool> {
    if !src.is_dir() {
        warn!("Skipping missing directory: {:?}", src);
        return Ok(false);
    }
    let copied = copy_dir_all(src, dst)?;
    debug!("Copied {} files from {:?} to {:?}", copied, src, dst);
    Ok(true)
}

/// Copy a single file if it exists, creating the target's parent directory.
/// A missing source is logged and skipped.
pub fn copy_file_if_exists(src: &Path, dst: &Path) -> Result<bool> {
    if !src.is_file() {
        warn!("Skipping missing file: {:?}", src);
        return Ok(false);
    }
    ensure_parent_directory_exists(dst)?;
    fs::copy(src, dst).map_err(DeckError::FileReadError)?;
    Ok(true)
}

/// Remove a directory tree if present
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(DeckError::FileReadError)?;
    }
    Ok(())
}
