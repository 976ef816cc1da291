use super::*;
use crate::converter::ConversionRequest;
use crate::html::{add_print_support, PrintPatch};
use crate::layout::ProjectLayout;
use crate::pages::{collect_metadata, group_by_year, has_url_scheme, render_index, video_link};
use crate::server::{content_type, resolve_request_path};
use chrono::NaiveDate;
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

const DECK_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<link rel="stylesheet" href="reveal.js/dist/reset.css">
<link rel="stylesheet" href="reveal.js/dist/reveal.css">
<link rel="stylesheet" href="build/sass/netflix.css" id="theme">
</head>
<body>
<div class="reveal"><div class="slides"><section><h2>Hello</h2></section></div></div>
</body>
</html>"#;

/// Writes a fixed document for every request and records what it was asked
struct FakeConverter {
    html: String,
    fail: bool,
    requests: Rc<RefCell<Vec<ConversionRequest>>>,
}

impl FakeConverter {
    fn new() -> Self {
        Self {
            html: DECK_HTML.to_string(),
            fail: false,
            requests: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

impl DocumentConverter for FakeConverter {
    fn convert(&self, request: &ConversionRequest) -> Result<PathBuf> {
        self.requests.borrow_mut().push(request.clone());
        if self.fail {
            return Err(DeckError::ConverterError("converter exploded".to_string()));
        }
        fs::create_dir_all(&request.output_dir)?;
        fs::write(request.output_path(), &self.html)?;
        Ok(request.output_path())
    }
}

/// Fails on any source whose name contains "broken"
struct FakeCompiler;

impl StylesheetCompiler for FakeCompiler {
    fn compile(&self, input: &Path, _load_paths: &[PathBuf]) -> Result<String> {
        let name = input.file_name().unwrap().to_string_lossy().to_string();
        if name.contains("broken") {
            Err(DeckError::StyleCompileError(format!("syntax error in {}", name)))
        } else {
            Ok(format!("/* compiled {} */", name))
        }
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn presentation(name: &str, day: &str) -> PresentationConfig {
    PresentationConfig {
        name: name.to_string(),
        date: date(day),
        title: format!("{} talk", name),
        venue: "Meetup".to_string(),
        video: "https://www.youtube.com/watch?v=abc".to_string(),
        theme: "netflix".to_string(),
    }
}

fn metadata(name: &str, day: &str, video: &str) -> PresentationMetadata {
    PresentationMetadata {
        name: name.to_string(),
        date: date(day),
        title: format!("{} talk", name),
        venue: "Meetup".to_string(),
        video: video.to_string(),
    }
}

fn registry() -> Registry {
    Registry::from_presentations(
        SiteConfig::default(),
        vec![presentation("alpha", "2021-06-25"), presentation("beta", "2021-06-24")],
    )
}

fn context(root: &Path, converter: FakeConverter) -> Context {
    Context::new(
        Config::new(root),
        registry(),
        Box::new(converter),
        Box::new(FakeCompiler),
    )
}

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A pre-populated reveal.js cache, so nothing is fetched
fn seed_framework(root: &Path) -> PathBuf {
    let dir = ProjectLayout::new(root)
        .framework_cache_dir()
        .join(config::DEFAULT_REVEALJS_VERSION);
    write_file(&dir.join("dist/reset.css"), "/* reset */");
    write_file(&dir.join("dist/reveal.css"), "/* reveal */");
    write_file(&dir.join("dist/reveal.js"), "// reveal");
    write_file(&dir.join("plugin/highlight/monokai.css"), "/* monokai */");
    write_file(&dir.join("css/theme/source/black.scss"), "$x: 1;");
    write_file(&dir.join("css/theme/template/settings.scss"), "$y: 2;");
    dir
}

// Registry

#[test]
fn test_registry_parse_defaults_theme_and_sorts_names() {
    let registry = Registry::parse(
        r#"
[site]
title = "decks"
author = "Someone"

[presentations.zeta]
date = "2020-01-02"
title = "Zeta"
venue = "Conf"

[presentations.alpha]
date = "2021-06-25"
title = "Alpha"
venue = "Meetup"
video = "https://example.com/v"
theme = "dark"
"#,
    )
    .unwrap();

    assert_eq!(registry.names(), vec!["alpha", "zeta"]);
    assert_eq!(registry.get("zeta").unwrap().theme, registry::DEFAULT_THEME);
    assert_eq!(registry.get("zeta").unwrap().video, "");
    assert_eq!(registry.get("alpha").unwrap().theme, "dark");
    assert_eq!(registry.site().author.as_deref(), Some("Someone"));
}

#[test]
fn test_unknown_presentation_lists_available_names() {
    match registry().get("gamma") {
        Err(DeckError::UnknownPresentation { name, available }) => {
            assert_eq!(name, "gamma");
            assert_eq!(available, vec!["alpha", "beta"]);
        }
        other => panic!("expected UnknownPresentation, got {:?}", other),
    }
}

#[test]
fn test_registry_rejects_path_like_names() {
    let result = Registry::parse(
        r#"
[presentations."../escape"]
date = "2021-01-01"
title = "t"
venue = "v"
"#,
    );
    assert!(matches!(result, Err(DeckError::ConfigError(_))));
}

#[test]
fn test_registry_load_missing_file_is_config_error() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
        Registry::load(temp.path()),
        Err(DeckError::ConfigError(_))
    ));
}

#[test]
fn test_metadata_json_omits_name() {
    let json = serde_json::to_value(presentation("alpha", "2021-06-25").metadata()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "date": "2021-06-25",
            "title": "alpha talk",
            "venue": "Meetup",
            "video": "https://www.youtube.com/watch?v=abc"
        })
    );
}

// Print patch

#[test]
fn test_print_patch_inserted_after_reveal_css() {
    let (patched, outcome) = add_print_support(DECK_HTML);
    assert_eq!(outcome, PrintPatch::Applied);

    let link = r#"<link rel="stylesheet" href="reveal.js/dist/reveal.css">"#;
    let after_link = &patched[patched.find(link).unwrap() + link.len()..];
    assert!(after_link.trim_start().starts_with("<!-- Theme used for syntax highlighting"));
    assert!(patched.contains("reveal.js/css/print/pdf.css"));
    assert!(patched.contains("reveal.js/css/print/paper.css"));
    // reset.css comes first and must not be the anchor
    assert!(patched.find("reset.css").unwrap() < patched.find("monokai.css").unwrap());
    assert!(patched.find(link).unwrap() < patched.find("monokai.css").unwrap());
}

#[test]
fn test_print_patch_is_idempotent() {
    let (once, _) = add_print_support(DECK_HTML);
    let (twice, outcome) = add_print_support(&once);
    assert_eq!(outcome, PrintPatch::AlreadyPresent);
    assert_eq!(once, twice);
}

#[test]
fn test_print_patch_without_anchor_leaves_html_unchanged() {
    let html = "<html><head><link rel=\"stylesheet\" href=\"other.css\"></head></html>";
    let (patched, outcome) = add_print_support(html);
    assert_eq!(outcome, PrintPatch::NoAnchor);
    assert_eq!(patched, html);
}

#[test]
fn test_print_patch_ignores_attributes_ending_in_href() {
    let html = concat!(
        "<html><head>",
        "<link rel=\"preload\" data-href=\"reveal.js/dist/reveal.css\" href=\"fonts.css\">",
        "<link rel=stylesheet href=reveal.js/dist/reveal.css>",
        "</head></html>"
    );
    let (patched, outcome) = add_print_support(html);
    assert_eq!(outcome, PrintPatch::Applied);

    let anchor = "<link rel=stylesheet href=reveal.js/dist/reveal.css>";
    let snippet = patched.find("monokai.css").unwrap();
    assert!(patched.find(anchor).unwrap() + anchor.len() <= snippet);
}

#[test]
fn test_patch_html_file_rewrites_once() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("index.html");
    fs::write(&path, DECK_HTML).unwrap();

    assert_eq!(html::patch_html_file(&path).unwrap(), PrintPatch::Applied);
    let first = fs::read_to_string(&path).unwrap();
    assert_eq!(html::patch_html_file(&path).unwrap(), PrintPatch::AlreadyPresent);
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

// Converter

#[test]
fn test_revealjs_attributes() {
    let attributes =
        presentation::revealjs_attributes(&presentation("alpha", "2021-06-25"), Path::new("/src"));
    let get = |key: &str| {
        attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    assert_eq!(get("includedir"), Some("/src"));
    assert_eq!(get("revealjsdir"), Some("reveal.js"));
    assert_eq!(get("revealjs-theme"), Some("netflix"));
    assert_eq!(get("source-highlighter"), Some("highlightjs"));
    assert_eq!(get("icons"), Some("font"));
    assert_eq!(get("revealjs_controls"), Some("false"));
    assert_eq!(get("revealjs_overview"), Some("true"));
    assert_eq!(get("revealjs_progress"), Some("true"));
    assert_eq!(get("revealjs_history"), Some("true"));
    assert_eq!(get("revealjs_center"), Some("false"));
    assert_eq!(get("revealjs_customtheme"), Some("build/sass/netflix.css"));
}

#[test]
fn test_asciidoctor_args_only_require_extensions_for_slides() {
    let asciidoctor = Asciidoctor::from_config(&Config::default());
    let slides = ConversionRequest::new(
        Path::new("deck/index.adoc"),
        Path::new("out"),
        "index.html",
        Backend::RevealJs,
    )
    .with_attributes(vec![("icons".to_string(), "font".to_string())]);
    let args = asciidoctor.args(&slides);
    assert_eq!(
        &args[..6],
        ["-r", "asciidoctor-revealjs", "-r", "asciidoctor-diagram", "-b", "revealjs"]
    );
    assert!(args.windows(2).any(|w| w == ["-a", "icons=font"]));
    assert_eq!(args.last().map(String::as_str), Some("deck/index.adoc"));

    let page = ConversionRequest::new(
        Path::new("index.adoc"),
        Path::new("out"),
        "index.html",
        Backend::Html5,
    );
    let args = asciidoctor.args(&page);
    assert!(!args.contains(&"-r".to_string()));
    assert!(args.windows(2).any(|w| w == ["-b", "html5"]));
}

// File server

#[test]
fn test_resolve_request_path() {
    let root = Path::new("/site");
    assert_eq!(
        resolve_request_path(root, "/"),
        Some(root.join("index.html"))
    );
    assert_eq!(
        resolve_request_path(root, "/?print-pdf"),
        Some(root.join("index.html"))
    );
    assert_eq!(
        resolve_request_path(root, "/index.html?print-pdf"),
        Some(root.join("index.html"))
    );
    assert_eq!(
        resolve_request_path(root, "/images/a%20b.png"),
        Some(root.join("images").join("a b.png"))
    );
    assert_eq!(resolve_request_path(root, "/../etc/passwd"), None);
    assert_eq!(resolve_request_path(root, "/images/%2e%2e/%2e%2e/x"), None);
}

#[test]
fn test_content_type_by_extension() {
    assert_eq!(content_type(Path::new("a.html")), "text/html");
    assert_eq!(content_type(Path::new("a.CSS")), "text/css");
    assert_eq!(content_type(Path::new("a.js")), "text/javascript");
    assert_eq!(content_type(Path::new("a.jpeg")), "image/jpeg");
    assert_eq!(content_type(Path::new("a.woff2")), "font/woff2");
    assert_eq!(content_type(Path::new("a.bin")), "application/octet-stream");
    assert_eq!(content_type(Path::new("noext")), "application/octet-stream");
}

#[test]
fn test_file_server_serves_and_shuts_down() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("index.html"), "<h1>deck</h1>").unwrap();
    write_file(&temp.path().join("css/theme.css"), "body {}");

    let server = FileServer::start(temp.path()).unwrap();
    let base = server.url();
    assert!(server.port() > 0);

    let client = reqwest::blocking::Client::new();
    let root = client.get(format!("{}/?print-pdf", base)).send().unwrap();
    assert_eq!(root.status().as_u16(), 200);
    assert_eq!(root.headers()["content-type"], "text/html");
    assert_eq!(root.headers()["cache-control"], "no-cache");
    assert_eq!(root.text().unwrap(), "<h1>deck</h1>");

    let css = client.get(format!("{}/css/theme.css", base)).send().unwrap();
    assert_eq!(css.headers()["content-type"], "text/css");

    let missing = client.get(format!("{}/nope.png", base)).send().unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[test]
fn test_file_server_requires_existing_root() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
        FileServer::start(&temp.path().join("missing")),
        Err(DeckError::PathNotFoundError(_))
    ));
}

// PDF export

#[test]
fn test_pdf_options_rotate_portrait_a4() {
    let options = ExportConfig::default().pdf_options();
    assert_eq!(options.paper_width, Some(8.27));
    assert_eq!(options.paper_height, Some(11.69));
    assert_eq!(options.landscape, Some(true));
    assert_eq!(options.print_background, Some(true));
    assert_eq!(options.prefer_css_page_size, Some(true));
    for margin in [
        options.margin_top,
        options.margin_bottom,
        options.margin_left,
        options.margin_right,
    ] {
        assert_eq!(margin, Some(0.0));
    }
}

// Framework cache

fn release_zip(top: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    for (name, content) in [
        ("dist/reveal.css", "/* reveal */"),
        ("css/theme/source/black.scss", "$x: 1;"),
    ] {
        writer.start_file(format!("{}/{}", top, name), options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[test]
fn test_framework_install_strips_top_level_dir() {
    let temp = TempDir::new().unwrap();
    let config = Config::new(temp.path());
    let framework = Framework::new(&config, &ProjectLayout::new(temp.path()));
    assert!(!framework.is_cached());

    let dir = framework.install_archive(&release_zip("reveal.js-4.6.1")).unwrap();
    assert_eq!(dir, framework.cache_dir());
    assert!(dir.join("dist/reveal.css").is_file());
    assert!(framework.theme_dir().join("source/black.scss").is_file());
    assert!(framework.is_cached());
    // the cache is reused without touching the network
    assert_eq!(framework.ensure().unwrap(), dir);

    let leftovers: Vec<_> = fs::read_dir(dir.parent().unwrap())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with(".reveal-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_framework_rejects_digest_mismatch() {
    let temp = TempDir::new().unwrap();
    let mut config = Config::new(temp.path());
    config.revealjs_sha256 = Some("00".repeat(32));
    let framework = Framework::new(&config, &ProjectLayout::new(temp.path()));

    let result = framework.install_archive(&release_zip("reveal.js-4.6.1"));
    assert!(matches!(result, Err(DeckError::IntegrityError { .. })));
    assert!(!framework.cache_dir().exists());
}

#[test]
fn test_framework_download_http_error_is_a_fetch_error() {
    let temp = TempDir::new().unwrap();
    let site = TempDir::new().unwrap();
    let server = FileServer::start(site.path()).unwrap();

    let mut config = Config::new(temp.path());
    config.revealjs_url = Some(format!("{}/reveal.js-4.6.1.zip", server.url()));
    let framework = Framework::new(&config, &ProjectLayout::new(temp.path()));

    match framework.ensure() {
        Err(DeckError::FetchStatusError { url, status }) => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/reveal.js-4.6.1.zip"));
        }
        other => panic!("expected a fetch status error, got {:?}", other),
    }
    assert!(!framework.cache_dir().exists());
}

#[test]
fn test_framework_cache_with_stale_digest_is_not_reused() {
    let temp = TempDir::new().unwrap();
    let archive = release_zip("reveal.js-4.6.1");

    let plain = Framework::new(&Config::new(temp.path()), &ProjectLayout::new(temp.path()));
    plain.install_archive(&archive).unwrap();

    let mut config = Config::new(temp.path());
    config.revealjs_sha256 = Some(framework::sha256_hex(&archive));
    let pinned = Framework::new(&config, &ProjectLayout::new(temp.path()));
    assert!(pinned.is_cached());

    config.revealjs_sha256 = Some("ff".repeat(32));
    let repinned = Framework::new(&config, &ProjectLayout::new(temp.path()));
    assert!(!repinned.is_cached());
}

// Style compiler

fn font_archive(path: &Path) {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, content) in [
        ("package/netflix-sans.css", "@font-face { font-family: NS; }"),
        ("package/fonts/netflix-sans.woff2", "woff2"),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, content.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

#[test]
fn test_build_styles_isolates_compile_failures() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    seed_framework(root);
    let layout = ProjectLayout::new(root);
    write_file(&layout.stylesheet_sources().join("netflix.scss"), "$a: 1;");
    write_file(&layout.stylesheet_sources().join("broken.scss"), "$a: ;");
    write_file(&layout.stylesheet_sources().join("notes.txt"), "ignored");
    font_archive(&layout.font_archive());

    let ctx = context(root, FakeConverter::new());
    let report = build_styles(&ctx).unwrap();

    // the framework's own theme sources land in the overlay and compile too
    assert_eq!(
        report.compiled,
        vec![
            layout.compiled_css_dir().join("black.css"),
            layout.compiled_theme_css("netflix"),
        ]
    );
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("broken.scss"));
    assert!(!layout.compiled_css_dir().join("broken.css").exists());

    // theme templates and local overlay
    assert!(layout.scss_dir().join("source/black.scss").is_file());
    assert!(layout.scss_dir().join("template/settings.scss").is_file());
    assert!(layout.asset_bundle_dir().join("style/netflix.scss").is_file());

    // font bundle
    assert!(report.font_bundle_extracted);
    assert!(layout.scss_dir().join("netflix-sans.scss").is_file());
    assert!(layout.asset_bundle_dir().join("netflix-sans.css").is_file());
    assert!(layout
        .asset_bundle_dir()
        .join("fonts/netflix-sans.woff2")
        .is_file());
    let scratch: Vec<_> = fs::read_dir(layout.scss_dir().parent().unwrap())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("temp-font"))
        .collect();
    assert!(scratch.is_empty());
}

#[test]
fn test_build_styles_fails_without_theme_templates() {
    let temp = TempDir::new().unwrap();
    let dir = seed_framework(temp.path());
    fs::remove_dir_all(dir.join("css")).unwrap();

    let ctx = context(temp.path(), FakeConverter::new());
    assert!(matches!(build_styles(&ctx), Err(DeckError::ConfigError(_))));
}

#[test]
fn test_build_styles_survives_corrupt_font_archive() {
    let temp = TempDir::new().unwrap();
    seed_framework(temp.path());
    let layout = ProjectLayout::new(temp.path());
    write_file(&layout.font_archive(), "not a tarball");
    write_file(&layout.stylesheet_sources().join("netflix.scss"), "$a: 1;");

    let ctx = context(temp.path(), FakeConverter::new());
    let report = build_styles(&ctx).unwrap();
    assert!(!report.font_bundle_extracted);
    assert!(layout.compiled_theme_css("netflix").is_file());
}

// Presentation builder

#[test]
fn test_build_unknown_presentation() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), FakeConverter::new());
    assert!(matches!(
        build_presentation(&ctx, "gamma"),
        Err(DeckError::UnknownPresentation { .. })
    ));
}

#[test]
fn test_build_missing_source_creates_nothing() {
    let temp = TempDir::new().unwrap();
    seed_framework(temp.path());
    let ctx = context(temp.path(), FakeConverter::new());

    assert!(matches!(
        build_presentation(&ctx, "alpha"),
        Err(DeckError::PathNotFoundError(_))
    ));
    assert!(!ctx.layout.html_build_dir("alpha").exists());
}

#[test]
fn test_build_presentation_assembles_build_dir() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    seed_framework(root);
    let layout = ProjectLayout::new(root);
    write_file(&layout.slide_source("alpha"), "= Alpha\n\n== Slide");
    write_file(&layout.slide_source_dir("alpha").join("images/diagram.png"), "png");
    write_file(&layout.compiled_theme_css("netflix"), "/* theme */");
    write_file(&layout.asset_bundle_dir().join("style/Netflix_Symbol_RGB.png"), "logo");
    write_file(&layout.asset_bundle_dir().join("fonts/ns.woff2"), "font");

    let converter = FakeConverter::new();
    let requests = converter.requests.clone();
    let ctx = context(root, converter);

    let build_dir = build_presentation(&ctx, "alpha").unwrap();
    assert_eq!(build_dir, layout.html_build_dir("alpha"));

    assert!(build_dir.join("reveal.js/css/reset.css").is_file());
    assert!(build_dir.join("reveal.js/css/reveal.css").is_file());
    assert!(build_dir.join("reveal.js/js/reveal.js").is_file());
    assert!(build_dir.join("images/diagram.png").is_file());
    assert!(build_dir.join("build/sass/netflix.css").is_file());
    assert!(build_dir.join("build/sass/Netflix_Symbol_RGB.png").is_file());
    assert!(build_dir.join("build/sass/fonts/ns.woff2").is_file());

    let requests = requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].backend, Backend::RevealJs);
    assert_eq!(requests[0].source, layout.slide_source("alpha"));

    let html = fs::read_to_string(build_dir.join("index.html")).unwrap();
    assert!(html.contains(html::PRINT_MARKER));
}

#[test]
fn test_build_converter_failure_is_fatal() {
    let temp = TempDir::new().unwrap();
    seed_framework(temp.path());
    let layout = ProjectLayout::new(temp.path());
    write_file(&layout.slide_source("alpha"), "= Alpha");

    let ctx = context(temp.path(), FakeConverter::failing());
    assert!(matches!(
        build_presentation(&ctx, "alpha"),
        Err(DeckError::ConverterError(_))
    ));
}

#[test]
fn test_export_pdf_requires_built_html() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), FakeConverter::new());
    assert!(matches!(
        export_pdf(&ctx, "alpha"),
        Err(DeckError::PathNotFoundError(_))
    ));
    assert!(matches!(
        export_pdf(&ctx, "gamma"),
        Err(DeckError::UnknownPresentation { .. })
    ));
}

// Pages aggregator

#[test]
fn test_video_links() {
    assert!(has_url_scheme("https://www.youtube.com/watch?v=HnPz3CJEKaM"));
    assert!(has_url_scheme("http://example.com"));
    assert!(!has_url_scheme("videos/talk.mp4"));
    assert!(!has_url_scheme("C:/videos/talk.mp4"));

    assert_eq!(
        video_link("https://youtu.be/x").as_deref(),
        Some("https://youtu.be/x[Video]")
    );
    assert_eq!(
        video_link("videos/talk.mp4").as_deref(),
        Some("link:videos/talk.mp4[Video]")
    );
    assert_eq!(video_link("  "), None);
}

#[test]
fn test_sort_newest_first() {
    let mut entries = vec![
        metadata("beta", "2021-06-24", ""),
        metadata("alpha", "2021-06-25", ""),
    ];
    pages::sort_newest_first(&mut entries);
    assert_eq!(entries[0].name, "alpha");
    assert_eq!(entries[1].name, "beta");
}

#[test]
fn test_group_by_year_descending() {
    let mut entries = vec![
        metadata("old", "2019-12-31", ""),
        metadata("new", "2021-06-24", ""),
        metadata("mid", "2020-01-01", ""),
    ];
    pages::sort_newest_first(&mut entries);
    let groups = group_by_year(&entries);
    let years: Vec<i32> = groups.iter().map(|(year, _)| *year).collect();
    assert_eq!(years, vec![2021, 2020, 2019]);
    assert_eq!(groups[0].1[0].name, "new");
}

#[test]
fn test_render_index_alpha_before_beta_in_single_year() {
    let mut entries = vec![
        metadata("beta", "2021-06-24", "https://youtu.be/b"),
        metadata("alpha", "2021-06-25", "https://youtu.be/a"),
    ];
    pages::sort_newest_first(&mut entries);
    let site = SiteConfig {
        title: "decks".to_string(),
        author: Some("Someone".to_string()),
        intro: "Hello.".to_string(),
    };
    let doc = render_index(&site, &entries);

    assert!(doc.starts_with("# decks\n:author: Someone\n:experimental:\n\nHello.\n\n"));
    assert_eq!(doc.matches("## ").count(), 1);
    assert!(doc.contains("## 2021\n\n[cols=\"2a,3a,7a\"]\n|===\n"));

    let alpha = doc.find("| 2021-06-25 | Meetup | alpha talk").unwrap();
    let beta = doc.find("| 2021-06-24 | Meetup | beta talk").unwrap();
    assert!(alpha < beta);

    for row in doc.lines().filter(|l| l.starts_with("| ")) {
        assert!(row.contains("/html/index.html[HTML]"));
        assert!(row.contains("/pdf/index.pdf[PDF]"));
        assert!(row.contains("[Video]"));
    }
    assert!(doc.contains(
        "alpha talk - link:alpha/html/index.html[HTML] - link:alpha/pdf/index.pdf[PDF] - https://youtu.be/a[Video]"
    ));
}

#[test]
fn test_render_index_escapes_cell_separators() {
    let mut entry = metadata("pipes", "2022-03-01", "");
    entry.title = "Input | Output".to_string();
    entry.venue = "Conf|Meetup".to_string();
    let doc = render_index(&SiteConfig::default(), &[entry]);

    assert!(doc.contains("| 2022-03-01 | Conf\\|Meetup | Input \\| Output - link:pipes/html/index.html[HTML]"));
    let row = doc.lines().find(|l| l.starts_with("| 2022")).unwrap();
    assert_eq!(row.replace("\\|", "").matches('|').count(), 3);
}

#[test]
fn test_collect_metadata_skips_unstaged_dirs() {
    let temp = TempDir::new().unwrap();
    let staging = temp.path();
    pages::write_metadata(
        &metadata("alpha", "2021-06-25", ""),
        &staging.join("alpha/metadata.json"),
    )
    .unwrap();
    pages::write_metadata(
        &metadata("beta", "2021-06-24", ""),
        &staging.join("beta/metadata.json"),
    )
    .unwrap();
    fs::create_dir_all(staging.join("no-metadata/html")).unwrap();
    write_file(&staging.join("corrupt/metadata.json"), "{ not json");
    write_file(&staging.join("index.html"), "<html></html>");

    let entries = collect_metadata(staging).unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
}

#[test]
fn test_copy_to_pages_stages_outputs_and_metadata() {
    let temp = TempDir::new().unwrap();
    let layout = ProjectLayout::new(temp.path());
    write_file(&layout.html_index("alpha"), DECK_HTML);
    write_file(&layout.pdf_file("alpha"), "%PDF");
    let stale = layout.staged_presentation_dir("alpha").join("html/stale.html");
    write_file(&stale, "old");

    let ctx = context(temp.path(), FakeConverter::new());
    let staged = copy_to_pages(&ctx, "alpha").unwrap();

    assert!(staged.join("html/index.html").is_file());
    assert!(staged.join("pdf/index.pdf").is_file());
    assert!(!stale.exists());
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(staged.join("metadata.json")).unwrap()).unwrap();
    assert_eq!(json["date"], "2021-06-25");
    assert_eq!(json["title"], "alpha talk");
}

#[test]
fn test_copy_to_pages_tolerates_missing_outputs() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), FakeConverter::new());
    let staged = copy_to_pages(&ctx, "beta").unwrap();
    assert!(staged.join("metadata.json").is_file());
    assert!(staged.join("html").is_dir());
    assert!(staged.join("pdf").is_dir());
}

#[test]
fn test_build_pages_writes_index_and_front_page() {
    let temp = TempDir::new().unwrap();
    let converter = FakeConverter::new();
    let requests = converter.requests.clone();
    let ctx = context(temp.path(), converter);

    let report = build_pages(&ctx).unwrap();
    let names: Vec<&str> = report.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    assert_eq!(
        report.front_page,
        Some(ctx.layout.staging_dir().join("index.html"))
    );
    assert!(report.index_source.is_file());
    assert_eq!(requests.borrow().last().unwrap().backend, Backend::Html5);
}

#[test]
fn test_build_index_conversion_failure_keeps_staging() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), FakeConverter::failing());

    let report = build_pages(&ctx).unwrap();
    assert_eq!(report.front_page, None);
    assert_eq!(report.entries.len(), 2);
    assert!(ctx.layout.staged_metadata("alpha").is_file());
    assert!(!ctx.layout.staging_dir().join("index.html").exists());
}
