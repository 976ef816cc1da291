// ABOUTME: Main entry point for the slidedecks program.
// ABOUTME: Provides CLI interface and executes pipeline stages from the library.

use clap::{Args, Parser, Subcommand};
use slidedecks::{Config, Context, DeckError};
use std::process;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the shared theme stylesheets and asset bundle
    BuildStyles,

    /// Build a presentation's reveal.js HTML
    Build(NameArgs),

    /// Export a built presentation to PDF
    ExportPdf(NameArgs),

    /// Stage a presentation's HTML, PDF and metadata for the pages site
    CopyToPages(NameArgs),

    /// Regenerate the pages index from staged metadata
    BuildIndex,

    /// Stage every presentation and regenerate the index
    BuildPages,

    /// Run every stage for every presentation
    All,

    /// List registered presentations
    List,
}

#[derive(Args)]
struct NameArgs {
    /// Name of a registered presentation
    name: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let ctx = match Context::load(Config::from_env()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match &cli.command {
        Commands::BuildStyles => {
            println!("Executing build-styles command...");
            slidedecks::build_styles(&ctx).map(|report| {
                println!(
                    "Compiled {} stylesheets ({} failed)",
                    report.compiled.len(),
                    report.failed.len()
                );
            })
        }
        Commands::Build(args) => {
            let name = require_name(&ctx, "build", args);
            slidedecks::build_presentation(&ctx, &name).map(|dir| {
                println!("Built {}", name);
                println!("Open {} in your browser", dir.join("index.html").display());
            })
        }
        Commands::ExportPdf(args) => {
            let name = require_name(&ctx, "export-pdf", args);
            slidedecks::export_pdf(&ctx, &name)
                .map(|pdf| println!("PDF exported to: {}", pdf.display()))
        }
        Commands::CopyToPages(args) => {
            let name = require_name(&ctx, "copy-to-pages", args);
            slidedecks::copy_to_pages(&ctx, &name)
                .map(|dir| println!("Staged {} at {}", name, dir.display()))
        }
        Commands::BuildIndex => slidedecks::build_index(&ctx).map(|report| report_index(&report)),
        Commands::BuildPages => slidedecks::build_pages(&ctx).map(|report| report_index(&report)),
        Commands::All => slidedecks::run_all(&ctx),
        Commands::List => {
            for name in ctx.registry.names() {
                println!("{}", name);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if let DeckError::UnknownPresentation { available, .. } = &e {
            print_available(available);
        }
        process::exit(1);
    }
}

/// The positional name, or usage plus the available names and exit 1
fn require_name(ctx: &Context, command: &str, args: &NameArgs) -> String {
    match &args.name {
        Some(name) => name.clone(),
        None => {
            eprintln!("Usage: slidedecks {} <presentation-name>", command);
            print_available(&ctx.registry.names());
            process::exit(1);
        }
    }
}

fn print_available(names: &[String]) {
    eprintln!("Available presentations:");
    for name in names {
        eprintln!("  - {}", name);
    }
}

fn report_index(report: &slidedecks::pages::IndexReport) {
    println!("Indexed {} presentations", report.entries.len());
    match &report.front_page {
        Some(page) => println!("Open {} in your browser", page.display()),
        None => println!("Index HTML was not generated; see {}", report.index_source.display()),
    }
}
