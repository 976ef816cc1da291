// ABOUTME: Pages aggregation for the slidedecks application
// ABOUTME: Stages every deck's HTML and PDF with metadata and regenerates the year-grouped index

use crate::converter::{Backend, ConversionRequest};
use crate::errors::{DeckError, Result};
use crate::layout::{INDEX_HTML, METADATA_FILE};
use crate::pipeline::Context;
use crate::registry::{PresentationMetadata, SiteConfig};
use crate::utils;
use chrono::Datelike;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const INDEX_ADOC: &str = "index.adoc";

/// Outcome of regenerating the index
#[derive(Debug)]
pub struct IndexReport {
    pub entries: Vec<PresentationMetadata>,
    pub index_source: PathBuf,
    /// The site front page, when conversion succeeded
    pub front_page: Option<PathBuf>,
}

/// Stage one presentation's HTML and PDF outputs and write its metadata
pub fn copy_to_pages(ctx: &Context, name: &str) -> Result<PathBuf> {
    info!("Copying {} to pages...", name);
    let layout = &ctx.layout;
    let config = ctx.registry.get(name)?;

    let staged = layout.staged_presentation_dir(name);
    utils::remove_dir_if_exists(&staged)?;
    let html_target = staged.join("html");
    let pdf_target = staged.join("pdf");
    utils::ensure_directory_exists(&html_target)?;
    utils::ensure_directory_exists(&pdf_target)?;

    if utils::copy_dir_if_exists(&layout.html_build_dir(name), &html_target)? {
        info!("Copied HTML files to {:?}", html_target);
    }
    if utils::copy_dir_if_exists(&layout.pdf_export_dir(name), &pdf_target)? {
        info!("Copied PDF files to {:?}", pdf_target);
    }

    let metadata_path = layout.staged_metadata(name);
    write_metadata(&config.metadata(), &metadata_path)?;
    info!("Created metadata at {:?}", metadata_path);
    Ok(staged)
}

pub fn write_metadata(metadata: &PresentationMetadata, path: &Path) -> Result<()> {
    utils::ensure_parent_directory_exists(path)?;
    let json = serde_json::to_string_pretty(metadata)?;
    fs::write(path, json).map_err(DeckError::FileReadError)
}

/// Read metadata for every staged presentation, newest first.
/// Directories without a metadata file are skipped.
pub fn collect_metadata(staging_dir: &Path) -> Result<Vec<PresentationMetadata>> {
    let mut entries = Vec::new();
    if !staging_dir.is_dir() {
        return Ok(entries);
    }

    for entry in fs::read_dir(staging_dir).map_err(DeckError::FileReadError)? {
        let entry = entry.map_err(DeckError::FileReadError)?;
        if !entry.file_type().map_err(DeckError::FileReadError)?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let metadata_path = entry.path().join(METADATA_FILE);
        if !metadata_path.is_file() {
            debug!("No metadata for {}, skipping", name);
            continue;
        }

        match read_metadata(&metadata_path) {
            Ok(mut metadata) => {
                metadata.name = name;
                entries.push(metadata);
            }
            Err(e) => warn!("Ignoring unreadable metadata {:?}: {}", metadata_path, e),
        }
    }

    sort_newest_first(&mut entries);
    Ok(entries)
}

fn read_metadata(path: &Path) -> Result<PresentationMetadata> {
    let content = fs::read_to_string(path).map_err(DeckError::FileReadError)?;
    Ok(serde_json::from_str(&content)?)
}

/// Sort by date descending; same-day entries by name
pub fn sort_newest_first(entries: &mut [PresentationMetadata]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.name.cmp(&b.name)));
}

/// Group entries by calendar year, newest year first, keeping entry order
pub fn group_by_year(entries: &[PresentationMetadata]) -> Vec<(i32, Vec<&PresentationMetadata>)> {
    let mut years: BTreeMap<i32, Vec<&PresentationMetadata>> = BTreeMap::new();
    for entry in entries {
        years.entry(entry.date.year()).or_default().push(entry);
    }
    years.into_iter().rev().collect()
}

/// Whether a video address is absolute (has a URL scheme)
pub fn has_url_scheme(address: &str) -> bool {
    // Single-letter schemes are Windows drive letters
    url::Url::parse(address)
        .map(|url| url.scheme().len() > 1)
        .unwrap_or(false)
}

/// AsciiDoc link for a video address; `None` when there is no video
pub fn video_link(video: &str) -> Option<String> {
    let video = video.trim();
    if video.is_empty() {
        None
    } else if has_url_scheme(video) {
        Some(format!("{}[Video]", video))
    } else {
        Some(format!("link:{}[Video]", video))
    }
}

/// Render the AsciiDoc index: one table per year
pub fn render_index(site: &SiteConfig, entries: &[PresentationMetadata]) -> String {
    let mut doc = format!("# {}\n", site.title);
    if let Some(author) = &site.author {
        let _ = writeln!(doc, ":author: {}", author);
    }
    doc.push_str(":experimental:\n\n");
    if !site.intro.trim().is_empty() {
        doc.push_str(site.intro.trim_end());
        doc.push_str("\n\n");
    }

    for (year, presentations) in group_by_year(entries) {
        let _ = writeln!(doc, "## {}\n", year);
        doc.push_str("[cols=\"2a,3a,7a\"]\n|===\n");
        for p in presentations {
            let mut links = vec![
                format!("link:{}/html/index.html[HTML]", p.name),
                format!("link:{}/pdf/index.pdf[PDF]", p.name),
            ];
            links.extend(video_link(&p.video));
            let _ = writeln!(
                doc,
                "| {} | {} | {} - {}",
                p.date.format("%Y-%m-%d"),
                escape_cell(&p.venue),
                escape_cell(&p.title),
                links.join(" - ")
            );
        }
        doc.push_str("|===\n\n");
    }
    doc
}

/// A bare `|` would start a new table cell
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Regenerate the index from whatever is staged.
/// A failed conversion is logged; staged copies stay valid.
pub fn build_index(ctx: &Context) -> Result<IndexReport> {
    info!("Building pages index...");
    let layout = &ctx.layout;
    let docs_dir = layout.pages_docs_dir();
    let staging_dir = layout.staging_dir();
    utils::ensure_directory_exists(&docs_dir)?;

    let entries = collect_metadata(&staging_dir)?;
    info!("Found {} staged presentations", entries.len());

    let index_source = docs_dir.join(INDEX_ADOC);
    fs::write(&index_source, render_index(ctx.registry.site(), &entries))
        .map_err(DeckError::FileReadError)?;
    info!("Created {:?}", index_source);

    let request = ConversionRequest::new(&index_source, &docs_dir, INDEX_HTML, Backend::Html5);
    let front_page = match ctx.converter.convert(&request) {
        Ok(html) => {
            let target = staging_dir.join(INDEX_HTML);
            utils::ensure_directory_exists(&staging_dir)?;
            fs::copy(&html, &target).map_err(DeckError::FileReadError)?;
            info!("Copied index to staging at {:?}", target);
            Some(target)
        }
        Err(e) => {
            error!("Failed to convert {:?} to HTML: {}", index_source, e);
            None
        }
    };

    Ok(IndexReport {
        entries,
        index_source,
        front_page,
    })
}

/// Stage every registered presentation, then rebuild the index
pub fn build_pages(ctx: &Context) -> Result<IndexReport> {
    info!("Building pages...");
    for config in ctx.registry.iter() {
        copy_to_pages(ctx, &config.name)?;
    }
    let report = build_index(ctx)?;
    info!("Pages build completed: {:?}", staging_index(ctx));
    Ok(report)
}

fn staging_index(ctx: &Context) -> PathBuf {
    ctx.layout.staging_dir().join(INDEX_HTML)
}
