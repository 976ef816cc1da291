// ABOUTME: Presentation building for the slidedecks application
// ABOUTME: Assembles a standalone reveal.js build directory and converts the slide source into it

use crate::converter::{Backend, ConversionRequest};
use crate::errors::{DeckError, Result};
use crate::html;
use crate::layout::INDEX_HTML;
use crate::pipeline::Context;
use crate::registry::PresentationConfig;
use crate::utils;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Files the converter expects at pre-4.0 locations, relative to the reveal.js dir
const LEGACY_ASSET_PATHS: &[(&str, &str)] = &[
    ("dist/reset.css", "css/reset.css"),
    ("dist/reveal.css", "css/reveal.css"),
    ("dist/reveal.js", "js/reveal.js"),
];

/// Build one presentation and return its HTML build directory
pub fn build_presentation(ctx: &Context, name: &str) -> Result<PathBuf> {
    info!("Building presentation: {}", name);
    let layout = &ctx.layout;
    let config = ctx.registry.get(name)?;

    let source = layout.slide_source(name);
    if !source.is_file() {
        return Err(DeckError::PathNotFoundError(source));
    }

    let framework_dir = ctx.framework().ensure()?;

    let build_dir = layout.html_build_dir(name);
    utils::ensure_directory_exists(&build_dir)?;

    info!("Copying reveal.js template...");
    let reveal_dir = build_dir.join("reveal.js");
    utils::copy_dir_all(&framework_dir, &reveal_dir)?;
    reconcile_asset_layout(&reveal_dir)?;

    info!("Copying images...");
    utils::copy_dir_if_exists(
        &layout.slide_source_dir(name).join("images"),
        &build_dir.join("images"),
    )?;

    copy_theme_assets(ctx, config, &build_dir)?;

    info!("Converting AsciiDoc to reveal.js...");
    let include_dir = layout.slide_source_dir(name);
    let request = ConversionRequest::new(&source, &build_dir, INDEX_HTML, Backend::RevealJs)
        .with_attributes(revealjs_attributes(config, &include_dir));
    let html_file = ctx.converter.convert(&request)?;

    info!("Adding print CSS support for PDF export...");
    html::patch_html_file(&html_file)?;

    info!("Built {} into {:?}", name, build_dir);
    Ok(build_dir)
}

/// Copy the dist/ files of a reveal.js 4 release to where the converter's
/// templates look for them
pub fn reconcile_asset_layout(reveal_dir: &Path) -> Result<()> {
    info!("Setting up reveal.js asset compatibility...");
    for (from, to) in LEGACY_ASSET_PATHS {
        utils::copy_file_if_exists(&reveal_dir.join(from), &reveal_dir.join(to))?;
    }

    let legacy_zoom = reveal_dir.join("plugin").join("zoom-js").join("zoom.js");
    if legacy_zoom.is_file() {
        utils::copy_file_if_exists(
            &legacy_zoom,
            &reveal_dir.join("plugin").join("zoom").join("zoom.js"),
        )?;
    }

    if !reveal_dir
        .join("plugin")
        .join("highlight")
        .join("monokai.css")
        .is_file()
    {
        warn!("monokai.css not found at expected location");
    }
    Ok(())
}

fn copy_theme_assets(ctx: &Context, config: &PresentationConfig, build_dir: &Path) -> Result<()> {
    info!("Setting up theme CSS and fonts...");
    let layout = &ctx.layout;
    let bundle_dir = layout.asset_bundle_dir();
    let theme_dir = build_dir.join("build").join("sass");

    utils::copy_dir_if_exists(&bundle_dir.join("style"), &build_dir.join("style"))?;
    utils::copy_dir_if_exists(&bundle_dir.join("package"), &build_dir.join("package"))?;

    utils::ensure_directory_exists(&theme_dir)?;
    utils::copy_file_if_exists(
        &layout.compiled_theme_css(&config.theme),
        &theme_dir.join(format!("{}.css", config.theme)),
    )?;
    utils::copy_dir_if_exists(&bundle_dir.join("fonts"), &theme_dir.join("fonts"))?;

    for logo in logo_images(&bundle_dir.join("style"))? {
        if let Some(file_name) = logo.file_name() {
            utils::copy_file_if_exists(&logo, &theme_dir.join(file_name))?;
        }
    }
    Ok(())
}

fn logo_images(style_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for pattern in ["*.png", "*.svg"] {
        let glob_pattern = format!("{}/{}", style_dir.to_string_lossy(), pattern);
        let entries = glob::glob(&glob_pattern)
            .map_err(|e| DeckError::ValidationError(format!("Invalid glob pattern: {}", e)))?;
        images.extend(entries.flatten());
    }
    images.sort();
    Ok(images)
}

/// Converter attributes for a deck: reveal.js options plus theme and highlighter
pub fn revealjs_attributes(
    config: &PresentationConfig,
    include_dir: &Path,
) -> Vec<(String, String)> {
    let reveal_options = [
        ("controls", "false".to_string()),
        ("overview", "true".to_string()),
        ("progress", "true".to_string()),
        ("history", "true".to_string()),
        ("center", "false".to_string()),
        ("customtheme", format!("build/sass/{}.css", config.theme)),
    ];

    let mut attributes = vec![
        (
            "includedir".to_string(),
            include_dir.to_string_lossy().to_string(),
        ),
        ("revealjsdir".to_string(), "reveal.js".to_string()),
        ("revealjs-theme".to_string(), config.theme.clone()),
        ("source-highlighter".to_string(), "highlightjs".to_string()),
        ("icons".to_string(), "font".to_string()),
    ];
    attributes.extend(
        reveal_options
            .into_iter()
            .map(|(key, value)| (format!("revealjs_{}", key), value)),
    );
    attributes
}
