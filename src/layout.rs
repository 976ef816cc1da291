// ABOUTME: Project directory layout for the slidedecks application
// ABOUTME: Maps every input and output of the pipeline to a path under the project root

use std::path::{Path, PathBuf};

pub const METADATA_FILE: &str = "metadata.json";
pub const INDEX_HTML: &str = "index.html";
pub const INDEX_PDF: &str = "index.pdf";
pub const SLIDE_SOURCE: &str = "index.adoc";

/// Paths of the pipeline's inputs and outputs, relative to one project root
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // Stylesheet inputs and outputs

    pub fn stylesheet_sources(&self) -> PathBuf {
        self.root.join("stylesheet").join("src").join("main").join("sass")
    }

    pub fn font_archive(&self) -> PathBuf {
        self.root.join("stylesheet").join("nflx").join("font.tgz")
    }

    fn stylesheet_build(&self) -> PathBuf {
        self.root.join("stylesheet").join("build")
    }

    /// Scratch directory holding the framework's theme templates
    pub fn scss_dir(&self) -> PathBuf {
        self.stylesheet_build().join("scss")
    }

    /// Overlay of local stylesheet sources; everything here gets compiled
    pub fn scss_source_dir(&self) -> PathBuf {
        self.scss_dir().join("source")
    }

    pub fn compiled_css_dir(&self) -> PathBuf {
        self.stylesheet_build().join("sass")
    }

    pub fn compiled_theme_css(&self, theme: &str) -> PathBuf {
        self.compiled_css_dir().join(format!("{}.css", theme))
    }

    /// Packaged theme assets (style sources, fonts, logo)
    pub fn asset_bundle_dir(&self) -> PathBuf {
        self.stylesheet_build().join("docs").join("asciidocRevealJs")
    }

    // Per-presentation paths

    pub fn presentation_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn slide_source_dir(&self, name: &str) -> PathBuf {
        self.presentation_dir(name)
            .join("src")
            .join("docs")
            .join("asciidoc")
    }

    pub fn slide_source(&self, name: &str) -> PathBuf {
        self.slide_source_dir(name).join(SLIDE_SOURCE)
    }

    pub fn html_build_dir(&self, name: &str) -> PathBuf {
        self.presentation_dir(name)
            .join("build")
            .join("docs")
            .join("asciidocRevealJs")
    }

    pub fn html_index(&self, name: &str) -> PathBuf {
        self.html_build_dir(name).join(INDEX_HTML)
    }

    pub fn pdf_export_dir(&self, name: &str) -> PathBuf {
        self.presentation_dir(name)
            .join("build")
            .join("docs")
            .join("asciidocRevealJsExport")
    }

    pub fn pdf_file(&self, name: &str) -> PathBuf {
        self.pdf_export_dir(name).join(INDEX_PDF)
    }

    // Pages

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("pages").join("build").join("staging")
    }

    pub fn staged_presentation_dir(&self, name: &str) -> PathBuf {
        self.staging_dir().join(name)
    }

    pub fn staged_metadata(&self, name: &str) -> PathBuf {
        self.staged_presentation_dir(name).join(METADATA_FILE)
    }

    pub fn pages_docs_dir(&self) -> PathBuf {
        self.root.join("pages").join("build").join("docs")
    }

    // Framework cache

    pub fn framework_cache_dir(&self) -> PathBuf {
        self.root.join(".cache").join("reveal.js")
    }
}
