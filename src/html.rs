// ABOUTME: HTML post-processing module for the slidedecks application
// ABOUTME: Splices print stylesheet support into converted reveal.js decks

use crate::errors::{DeckError, Result};
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Substring whose presence means the deck already has print support
pub const PRINT_MARKER: &str = "print-pdf";

const PRINT_SNIPPET: &str = r#"
		<!-- Theme used for syntax highlighting of code -->
		<link rel="stylesheet" href="reveal.js/plugin/highlight/monokai.css">

		<!-- Print PDF styles -->
		<script>
			var link = document.createElement( 'link' );
			link.rel = 'stylesheet';
			link.type = 'text/css';
			link.href = window.location.search.match( /print-pdf/gi ) ? 'reveal.js/css/print/pdf.css' : 'reveal.js/css/print/paper.css';
			document.getElementsByTagName( 'head' )[0].appendChild( link );
		</script>
"#;

/// Result of applying the print patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintPatch {
    Applied,
    AlreadyPresent,
    NoAnchor,
}

/// Insert the print stylesheet loader right after the main reveal.css link.
/// Returns the (possibly unchanged) HTML and what happened.
pub fn add_print_support(html: &str) -> (String, PrintPatch) {
    if html.contains(PRINT_MARKER) {
        return (html.to_string(), PrintPatch::AlreadyPresent);
    }

    match find_stylesheet_link_end(html, "reveal.css") {
        Some(end) => {
            let mut patched = String::with_capacity(html.len() + PRINT_SNIPPET.len());
            patched.push_str(&html[..end]);
            patched.push_str(PRINT_SNIPPET);
            patched.push_str(&html[end..]);
            (patched, PrintPatch::Applied)
        }
        None => (html.to_string(), PrintPatch::NoAnchor),
    }
}

/// Byte offset just past the first `<link ...>` tag whose href ends with `file_name`
fn find_stylesheet_link_end(html: &str, file_name: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(start) = html[offset..].find("<link") {
        let tag_start = offset + start;
        let tag_end = tag_start + html[tag_start..].find('>')? + 1;
        let tag = &html[tag_start..tag_end];

        if let Some(href) = attribute_value(tag, "href") {
            if href.rsplit('/').next() == Some(file_name) {
                return Some(tag_end);
            }
        }
        offset = tag_end;
    }
    None
}

fn attribute_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let key = format!("{}=", name);
    let mut from = 0;
    let after = loop {
        let at = from + tag[from..].find(&key)?;
        // `data-href=` and friends are different attributes
        if tag[..at].ends_with(char::is_whitespace) {
            break &tag[at + key.len()..];
        }
        from = at + key.len();
    };
    let quote = after.chars().next()?;
    if quote == '"' || quote == '\'' {
        let rest = &after[1..];
        rest.find(quote).map(|end| &rest[..end])
    } else {
        let end = after
            .find(|c: char| c.is_whitespace() || c == '>')
            .unwrap_or(after.len());
        Some(after[..end].trim_end_matches('/'))
    }
}

/// Apply the print patch to an HTML file in place
pub fn patch_html_file(path: &Path) -> Result<PrintPatch> {
    if !path.exists() {
        return Err(DeckError::PathNotFoundError(path.to_path_buf()));
    }
    let html = fs::read_to_string(path).map_err(DeckError::FileReadError)?;
    let (patched, outcome) = add_print_support(&html);

    match outcome {
        PrintPatch::Applied => {
            write_html_to_file(&patched, path)?;
            info!("Added print CSS support to {:?}", path);
        }
        PrintPatch::AlreadyPresent => info!("Print CSS support already present in {:?}", path),
        PrintPatch::NoAnchor => warn!(
            "No reveal.css stylesheet link in {:?}, print CSS support not added",
            path
        ),
    }
    Ok(outcome)
}

/// Utility function to write HTML content to a file
pub fn write_html_to_file(html_content: &str, output_path: &Path) -> Result<()> {
    info!("Writing HTML to file: {:?}", output_path);

    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(DeckError::FileReadError)?;
        }
    }

    fs::write(output_path, html_content).map_err(DeckError::FileReadError)?;

    Ok(())
}
