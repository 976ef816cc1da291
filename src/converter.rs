// ABOUTME: Document conversion for the slidedecks application
// ABOUTME: Wraps the external asciidoctor CLI behind a trait so stages can be tested without it

use crate::config::Config;
use crate::errors::{DeckError, Result};
use crate::utils;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Output backend for a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    RevealJs,
    Html5,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::RevealJs => "revealjs",
            Backend::Html5 => "html5",
        }
    }
}

/// One markup-to-HTML conversion
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub output_file: String,
    pub backend: Backend,
    pub attributes: Vec<(String, String)>,
}

impl ConversionRequest {
    pub fn new(source: &Path, output_dir: &Path, output_file: &str, backend: Backend) -> Self {
        Self {
            source: source.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            output_file: output_file.to_string(),
            backend,
            attributes: Vec::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Vec<(String, String)>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }
}

/// Converts a markup document to HTML
pub trait DocumentConverter {
    /// Run the conversion and return the path of the written file
    fn convert(&self, request: &ConversionRequest) -> Result<PathBuf>;
}

/// The asciidoctor command-line converter
#[derive(Debug, Clone)]
pub struct Asciidoctor {
    pub program: String,
    pub requires: Vec<String>,
}

impl Asciidoctor {
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.asciidoctor_bin.clone(),
            requires: config.asciidoctor_requires.clone(),
        }
    }

    /// Command-line arguments for a request
    pub fn args(&self, request: &ConversionRequest) -> Vec<String> {
        let mut args = Vec::new();
        // The html5 backend is built in; extension libraries only matter for slides
        if request.backend == Backend::RevealJs {
            for library in &self.requires {
                args.push("-r".to_string());
                args.push(library.clone());
            }
        }
        args.extend([
            "-b".to_string(),
            request.backend.as_str().to_string(),
            "-S".to_string(),
            "unsafe".to_string(),
            "-D".to_string(),
            request.output_dir.to_string_lossy().to_string(),
            "-o".to_string(),
            request.output_file.clone(),
        ]);
        for (key, value) in &request.attributes {
            args.push("-a".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push(request.source.to_string_lossy().to_string());
        args
    }
}

impl DocumentConverter for Asciidoctor {
    fn convert(&self, request: &ConversionRequest) -> Result<PathBuf> {
        utils::validate_file_exists(&request.source)?;
        utils::ensure_directory_exists(&request.output_dir)?;

        let args = self.args(request);
        info!(
            "Converting {:?} with {} ({})",
            request.source,
            self.program,
            request.backend.as_str()
        );
        debug!("{} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| {
                DeckError::ConverterError(format!("Failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            return Err(DeckError::ConverterError(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let written = request.output_path();
        if !written.exists() {
            return Err(DeckError::ConverterError(format!(
                "{} did not produce {:?}",
                self.program, written
            )));
        }
        Ok(written)
    }
}
