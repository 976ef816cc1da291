// ABOUTME: PDF export module for the slidedecks application
// ABOUTME: Prints a served reveal.js deck to PDF using a headless browser

use crate::errors::{DeckError, Result};
use crate::pipeline::Context;
use crate::server::FileServer;
use crate::utils;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use log::{info, warn};
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

const REVEAL_READY_JS: &str = r#"typeof Reveal !== "undefined""#;
const SLIDE_SELECTOR: &str = ".reveal .slides section";
const POLL_INTERVAL_MS: u64 = 100;

/// Configuration for browser printing
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub width: u32,
    pub height: u32,
    pub navigation_timeout_ms: u64,
    pub reveal_timeout_ms: u64,
    pub slides_timeout_ms: u64,
    pub load_pause_ms: u64,
    /// Portrait A4 in inches; `landscape` rotates it
    pub paper_width: f64,
    pub paper_height: f64,
    pub browser_path: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 1050,
            navigation_timeout_ms: 30000,
            reveal_timeout_ms: 15000,
            slides_timeout_ms: 10000,
            load_pause_ms: 5000,
            paper_width: 8.27,
            paper_height: 11.69,
            browser_path: None,
        }
    }
}

impl ExportConfig {
    pub fn pdf_options(&self) -> PrintToPdfOptions {
        PrintToPdfOptions {
            landscape: Some(true),
            print_background: Some(true),
            paper_width: Some(self.paper_width),
            paper_height: Some(self.paper_height),
            margin_top: Some(0.0),
            margin_bottom: Some(0.0),
            margin_left: Some(0.0),
            margin_right: Some(0.0),
            prefer_css_page_size: Some(true),
            ..Default::default()
        }
    }
}

/// Export a built presentation to PDF and return the PDF path
pub fn export_pdf(ctx: &Context, name: &str) -> Result<PathBuf> {
    info!("Exporting PDF for presentation: {}", name);
    let layout = &ctx.layout;
    ctx.registry.get(name)?;

    let html_index = layout.html_index(name);
    if !html_index.is_file() {
        warn!("Build the presentation first with: slidedecks build {}", name);
        return Err(DeckError::PathNotFoundError(html_index));
    }

    let export_dir = layout.pdf_export_dir(name);
    utils::ensure_directory_exists(&export_dir)?;

    info!("Starting HTTP server for assets...");
    let server = FileServer::start(&layout.html_build_dir(name))?;
    let url = format!("{}/index.html?print-pdf", server.url());

    let pdf = print_to_pdf(&url, &ctx.config.get_export_config())?;
    drop(server);

    let pdf_file = layout.pdf_file(name);
    fs::write(&pdf_file, pdf).map_err(DeckError::FileReadError)?;
    info!("PDF exported to: {:?}", pdf_file);
    Ok(pdf_file)
}

/// Load a deck in a headless browser and print it.
/// The browser process is closed when this returns, on every path.
pub fn print_to_pdf(url: &str, config: &ExportConfig) -> Result<Vec<u8>> {
    let browser = launch_browser(config)?;

    let tab = browser.new_tab().map_err(|e| browser_error("Failed to create new tab", e))?;
    tab.set_default_timeout(Duration::from_millis(config.navigation_timeout_ms));

    info!("Loading presentation from: {}", url);
    tab.navigate_to(url)
        .map_err(|e| browser_error("Failed to navigate to presentation", e))?;
    tab.wait_until_navigated()
        .map_err(|e| browser_error("Navigation failed", e))?;

    info!("Waiting for presentation to load...");
    wait_for_condition(
        &tab,
        REVEAL_READY_JS,
        Duration::from_millis(config.reveal_timeout_ms),
    )?;
    tab.wait_for_element_with_custom_timeout(
        SLIDE_SELECTOR,
        Duration::from_millis(config.slides_timeout_ms),
    )
    .map_err(|e| {
        DeckError::TimeoutError(format!("No slides rendered ({}): {}", SLIDE_SELECTOR, e))
    })?;

    // reveal.js has no readiness signal for images and fonts
    thread::sleep(Duration::from_millis(config.load_pause_ms));

    match count_slides(&tab) {
        Some(count) => info!("Found {} slides to export", count),
        None => warn!("Could not count slides"),
    }

    info!("Generating PDF...");
    tab.print_to_pdf(Some(config.pdf_options()))
        .map_err(|e| browser_error("Failed to print PDF", e))
}

fn launch_browser(config: &ExportConfig) -> Result<Browser> {
    let mut launch_options_builder = LaunchOptionsBuilder::default();
    launch_options_builder
        .headless(true)
        .sandbox(false)
        .window_size(Some((config.width, config.height)))
        .args(launch_args());

    if let Some(browser_path) = &config.browser_path {
        launch_options_builder.path(Some(browser_path.into()));
    }

    let launch_options = launch_options_builder
        .build()
        .map_err(|e| DeckError::BrowserError {
            message: format!("Failed to build browser options: {:?}", e),
            source: None,
        })?;

    info!("Launching headless browser");
    Browser::new(launch_options).map_err(|e| browser_error("Failed to launch browser", e))
}

/// Extra browser flags for the current platform
pub fn launch_args() -> Vec<&'static OsStr> {
    let mut args = vec![OsStr::new("--font-render-hinting=none")];
    if cfg!(target_os = "linux") {
        args.push(OsStr::new("--disable-setuid-sandbox"));
        args.push(OsStr::new("--disable-dev-shm-usage"));
    }
    args
}

/// Poll a JavaScript expression until it evaluates to `true`
fn wait_for_condition(tab: &Tab, expression: &str, timeout: Duration) -> Result<()> {
    let deadline = Instant::now() + timeout;
    loop {
        let ready = tab
            .evaluate(expression, false)
            .ok()
            .and_then(|result| result.value)
            .and_then(|value| value.as_bool())
            .unwrap_or(false);
        if ready {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(DeckError::TimeoutError(format!(
                "Timed out after {:?} waiting for `{}`",
                timeout, expression
            )));
        }
        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }
}

fn count_slides(tab: &Tab) -> Option<u64> {
    let js = format!("document.querySelectorAll('{}').length", SLIDE_SELECTOR);
    tab.evaluate(&js, false)
        .ok()
        .and_then(|result| result.value)
        .and_then(|value| value.as_u64())
}

fn browser_error(message: &str, err: anyhow::Error) -> DeckError {
    DeckError::BrowserError {
        message: format!("{}: {}", message, err),
        source: None,
    }
}
