// ABOUTME: Configuration module for the slidedecks application
// ABOUTME: Provides configuration settings and environment variable handling

use crate::render::ExportConfig;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_REVEALJS_VERSION: &str = "4.6.1";
pub const DEFAULT_TIMEOUT_MS: u64 = 30000;
pub const DEFAULT_LOAD_PAUSE_MS: u64 = 5000;

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub browser_path: Option<String>,
    pub revealjs_version: String,
    pub revealjs_url: Option<String>,
    pub revealjs_sha256: Option<String>,
    pub asciidoctor_bin: String,
    pub asciidoctor_requires: Vec<String>,
    pub sass_bin: String,
    pub default_timeout_ms: u64,
    pub load_pause_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            browser_path: None,
            revealjs_version: DEFAULT_REVEALJS_VERSION.to_string(),
            revealjs_url: None,
            revealjs_sha256: None,
            asciidoctor_bin: "asciidoctor".to_string(),
            asciidoctor_requires: vec![
                "asciidoctor-revealjs".to_string(),
                "asciidoctor-diagram".to_string(),
            ],
            sass_bin: "sass".to_string(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            load_pause_ms: DEFAULT_LOAD_PAUSE_MS,
        }
    }
}

impl Config {
    /// Create a configuration rooted at the given project directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let root = env::var("SLIDEDECKS_ROOT")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.root);
        let browser_path = env::var("BROWSER_PATH").ok().filter(|s| !s.is_empty());
        let revealjs_version =
            env::var("REVEALJS_VERSION").unwrap_or(defaults.revealjs_version);
        let revealjs_url = env::var("REVEALJS_URL").ok().filter(|s| !s.is_empty());
        let revealjs_sha256 = env::var("REVEALJS_SHA256")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase());
        let asciidoctor_bin = env::var("ASCIIDOCTOR_BIN").unwrap_or(defaults.asciidoctor_bin);
        let asciidoctor_requires = env::var("ASCIIDOCTOR_REQUIRES")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or(defaults.asciidoctor_requires);
        let sass_bin = env::var("SASS_BIN").unwrap_or(defaults.sass_bin);
        let default_timeout_ms = env::var("DEFAULT_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let load_pause_ms = env::var("LOAD_PAUSE_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_LOAD_PAUSE_MS);

        Self {
            root,
            browser_path,
            revealjs_version,
            revealjs_url,
            revealjs_sha256,
            asciidoctor_bin,
            asciidoctor_requires,
            sass_bin,
            default_timeout_ms,
            load_pause_ms,
        }
    }

    /// Release archive URL for the pinned reveal.js version
    pub fn revealjs_archive_url(&self) -> String {
        self.revealjs_url.clone().unwrap_or_else(|| {
            format!(
                "https://github.com/hakimel/reveal.js/archive/refs/tags/{}.zip",
                self.revealjs_version
            )
        })
    }

    /// Get an export configuration with defaults from this config
    pub fn get_export_config(&self) -> ExportConfig {
        ExportConfig {
            navigation_timeout_ms: self.default_timeout_ms,
            load_pause_ms: self.load_pause_ms,
            browser_path: self.browser_path.clone(),
            ..ExportConfig::default()
        }
    }
}
