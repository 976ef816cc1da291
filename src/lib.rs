// ABOUTME: Library module for the slidedecks program.
// ABOUTME: Builds AsciiDoc decks into reveal.js HTML and PDFs and assembles the index site.

pub mod config;
pub mod converter;
pub mod errors;
pub mod framework;
pub mod html;
pub mod layout;
pub mod pages;
pub mod pipeline;
pub mod presentation;
pub mod registry;
pub mod render;
pub mod server;
pub mod styles;
pub mod utils;

// Reexport common types and functions
pub use config::Config;
pub use converter::{Asciidoctor, Backend, ConversionRequest, DocumentConverter};
pub use errors::{DeckError, Result};
pub use framework::Framework;
pub use layout::ProjectLayout;
pub use pages::{build_index, build_pages, copy_to_pages};
pub use pipeline::{run_all, Context};
pub use presentation::build_presentation;
pub use registry::{PresentationConfig, PresentationMetadata, Registry, SiteConfig};
pub use render::{export_pdf, ExportConfig};
pub use server::FileServer;
pub use styles::{build_styles, SassCli, StylesheetCompiler};

#[cfg(test)]
mod tests;
