// ABOUTME: reveal.js release acquisition for the slidedecks application
// ABOUTME: Downloads a pinned release archive into a per-version cache and verifies its digest

use crate::config::Config;
use crate::errors::{DeckError, Result};
use crate::layout::ProjectLayout;
use crate::utils;
use log::{info, warn};
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zip::ZipArchive;

const DIGEST_MARKER: &str = ".sha256";
const FETCH_TIMEOUT_SECS: u64 = 120;

/// A pinned reveal.js release and where it is cached
#[derive(Debug, Clone)]
pub struct Framework {
    pub version: String,
    pub url: String,
    pub expected_sha256: Option<String>,
    cache_root: PathBuf,
}

impl Framework {
    pub fn new(config: &Config, layout: &ProjectLayout) -> Self {
        Self {
            version: config.revealjs_version.clone(),
            url: config.revealjs_archive_url(),
            expected_sha256: config.revealjs_sha256.clone(),
            cache_root: layout.framework_cache_dir(),
        }
    }

    /// Directory the release is extracted to
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_root.join(&self.version)
    }

    /// Theme templates shipped with the release
    pub fn theme_dir(&self) -> PathBuf {
        self.cache_dir().join("css").join("theme")
    }

    /// Whether the cache can be reused as-is.
    /// Without an expected digest, the directory's presence is enough.
    pub fn is_cached(&self) -> bool {
        let dir = self.cache_dir();
        if !dir.is_dir() {
            return false;
        }
        match &self.expected_sha256 {
            None => true,
            Some(expected) => fs::read_to_string(dir.join(DIGEST_MARKER))
                .map(|marker| marker.trim() == expected)
                .unwrap_or(false),
        }
    }

    /// Make sure the release is available locally and return its directory
    pub fn ensure(&self) -> Result<PathBuf> {
        let dir = self.cache_dir();
        if self.is_cached() {
            info!("Using cached reveal.js {} at {:?}", self.version, dir);
            return Ok(dir);
        }
        if dir.exists() {
            warn!(
                "Cached reveal.js {} does not match the expected digest, refetching",
                self.version
            );
            utils::remove_dir_if_exists(&dir)?;
        }

        let bytes = self.fetch_archive()?;
        self.install_archive(&bytes)
    }

    fn fetch_archive(&self) -> Result<Vec<u8>> {
        info!("Fetching reveal.js {} from {}", self.version, self.url);

        let client = Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        let response = client.get(&self.url).send()?;
        if !response.status().is_success() {
            return Err(DeckError::FetchStatusError {
                url: self.url.clone(),
                status: response.status().as_u16(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }

    /// Verify and extract a release archive into the cache.
    /// The archive's single top-level directory becomes the cache directory.
    pub fn install_archive(&self, bytes: &[u8]) -> Result<PathBuf> {
        let actual = sha256_hex(bytes);
        if let Some(expected) = &self.expected_sha256 {
            if *expected != actual {
                return Err(DeckError::IntegrityError {
                    path: PathBuf::from(&self.url),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        utils::ensure_directory_exists(&self.cache_root)?;
        let staging = tempfile::Builder::new()
            .prefix(".reveal-")
            .tempdir_in(&self.cache_root)
            .map_err(DeckError::FileReadError)?;

        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        archive.extract(staging.path())?;

        let dir = self.cache_dir();
        match single_top_level_dir(staging.path())? {
            Some(top) => fs::rename(&top, &dir).map_err(DeckError::FileReadError)?,
            None => {
                let extracted = staging.into_path();
                fs::rename(&extracted, &dir).map_err(DeckError::FileReadError)?;
            }
        }

        fs::write(dir.join(DIGEST_MARKER), &actual).map_err(DeckError::FileReadError)?;
        info!("Installed reveal.js {} into {:?}", self.version, dir);
        Ok(dir)
    }
}

/// Hex-encoded SHA-256 digest
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn single_top_level_dir(path: &Path) -> Result<Option<PathBuf>> {
    let entries: Vec<_> = fs::read_dir(path)
        .map_err(DeckError::FileReadError)?
        .collect::<std::io::Result<_>>()
        .map_err(DeckError::FileReadError)?;
    match entries.as_slice() {
        [only] if only.path().is_dir() => Ok(Some(only.path())),
        _ => Ok(None),
    }
}
