// ABOUTME: Style compilation for the slidedecks application
// ABOUTME: Stages reveal.js theme templates with local overlays, unpacks the font bundle and compiles SASS

use crate::config::Config;
use crate::errors::{DeckError, Result};
use crate::layout::ProjectLayout;
use crate::pipeline::Context;
use crate::utils;
use flate2::read::GzDecoder;
use log::{error, info, warn};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Compiles one stylesheet source file to CSS
pub trait StylesheetCompiler {
    fn compile(&self, input: &Path, load_paths: &[PathBuf]) -> Result<String>;
}

/// The `sass` command-line compiler
#[derive(Debug, Clone)]
pub struct SassCli {
    pub program: String,
}

impl SassCli {
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.sass_bin.clone(),
        }
    }
}

impl StylesheetCompiler for SassCli {
    fn compile(&self, input: &Path, load_paths: &[PathBuf]) -> Result<String> {
        let mut command = Command::new(&self.program);
        command.arg("--no-source-map");
        for path in load_paths {
            command.arg(format!("--load-path={}", path.to_string_lossy()));
        }
        command.arg(input);

        let output = command.output().map_err(|e| {
            DeckError::StyleCompileError(format!("Failed to run {}: {}", self.program, e))
        })?;
        if !output.status.success() {
            return Err(DeckError::StyleCompileError(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| DeckError::StyleCompileError(format!("Invalid UTF-8 in CSS output: {}", e)))
    }
}

/// Outcome of a style build
#[derive(Debug, Default)]
pub struct StyleReport {
    pub compiled: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub font_bundle_extracted: bool,
}

/// Build the shared theme assets: compiled CSS plus the packaged asset bundle
pub fn build_styles(ctx: &Context) -> Result<StyleReport> {
    info!("Building styles...");
    let layout = &ctx.layout;

    let framework = ctx.framework();
    framework.ensure()?;
    let theme_dir = framework.theme_dir();
    if !theme_dir.is_dir() {
        return Err(DeckError::ConfigError(format!(
            "reveal.js theme directory not found: {:?}",
            theme_dir
        )));
    }

    let scss_dir = layout.scss_dir();
    let scss_source_dir = layout.scss_source_dir();
    let bundle_dir = layout.asset_bundle_dir();
    utils::ensure_directory_exists(&scss_source_dir)?;
    utils::ensure_directory_exists(&layout.compiled_css_dir())?;
    utils::ensure_directory_exists(&bundle_dir)?;

    info!("Copying reveal.js theme files from {:?}", theme_dir);
    utils::copy_dir_all(&theme_dir, &scss_dir)?;

    // Local sources are copied last so they win on name collisions
    let local_sources = layout.stylesheet_sources();
    if utils::copy_dir_if_exists(&local_sources, &scss_source_dir)? {
        utils::copy_dir_all(&local_sources, &bundle_dir.join("style"))?;
    }

    let mut report = StyleReport::default();

    let font_archive = layout.font_archive();
    if font_archive.is_file() {
        info!("Extracting font bundle {:?}", font_archive);
        match extract_font_bundle(&font_archive, layout) {
            Ok(()) => report.font_bundle_extracted = true,
            Err(e) => error!("Failed to extract font bundle: {}", e),
        }
    } else {
        warn!("No font bundle at {:?}", font_archive);
    }

    compile_sources(ctx, &mut report)?;

    info!(
        "SASS compilation completed: {} compiled, {} failed",
        report.compiled.len(),
        report.failed.len()
    );
    Ok(report)
}

/// Unpack the gzip tarball into a scratch directory, turn its CSS files into
/// SCSS partials next to the theme templates and copy its contents into the
/// asset bundle. The scratch directory is removed on every path.
fn extract_font_bundle(archive: &Path, layout: &ProjectLayout) -> Result<()> {
    let scss_dir = layout.scss_dir();
    let scratch = tempfile::Builder::new()
        .prefix("temp-font")
        .tempdir_in(scss_dir.parent().unwrap_or(&scss_dir))
        .map_err(DeckError::FileReadError)?;

    let file = File::open(archive).map_err(DeckError::FileReadError)?;
    tar::Archive::new(GzDecoder::new(file))
        .unpack(scratch.path())
        .map_err(|e| DeckError::ArchiveError(format!("Failed to unpack {:?}: {}", archive, e)))?;

    let package = scratch.path().join("package");
    utils::validate_directory_exists(&package)?;

    for entry in fs::read_dir(&package).map_err(DeckError::FileReadError)? {
        let path = entry.map_err(DeckError::FileReadError)?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "css") {
            if let Some(stem) = path.file_stem() {
                let target = scss_dir.join(format!("{}.scss", stem.to_string_lossy()));
                fs::copy(&path, &target).map_err(DeckError::FileReadError)?;
            }
        }
    }

    utils::copy_dir_all(&package, &layout.asset_bundle_dir())?;
    Ok(())
}

fn compile_sources(ctx: &Context, report: &mut StyleReport) -> Result<()> {
    let layout = &ctx.layout;
    let load_paths = vec![layout.scss_dir(), layout.scss_source_dir()];
    let output_dir = layout.compiled_css_dir();

    for input in stylesheet_sources(&layout.scss_source_dir())? {
        let stem = match input.file_stem() {
            Some(stem) => stem.to_string_lossy().to_string(),
            None => continue,
        };
        let output = output_dir.join(format!("{}.css", stem));

        match ctx.compiler.compile(&input, &load_paths) {
            Ok(css) => {
                fs::write(&output, css).map_err(DeckError::FileReadError)?;
                info!("Compiled {:?} -> {:?}", input, output);
                report.compiled.push(output);
            }
            Err(e) => {
                error!("Failed to compile {:?}: {}", input, e);
                report.failed.push((input, e.to_string()));
            }
        }
    }
    Ok(())
}

/// `.scss` and `.sass` files directly inside `dir`, sorted by name
pub fn stylesheet_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut sources = Vec::new();
    for entry in fs::read_dir(dir).map_err(DeckError::FileReadError)? {
        let path = entry.map_err(DeckError::FileReadError)?.path();
        let is_source = path.is_file()
            && path
                .extension()
                .map_or(false, |ext| ext == "scss" || ext == "sass");
        if is_source {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}
