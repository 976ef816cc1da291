// ABOUTME: Pipeline context and orchestration for the slidedecks application
// ABOUTME: Bundles configuration, registry and external tools, and runs every stage in order

use crate::config::Config;
use crate::converter::{Asciidoctor, DocumentConverter};
use crate::errors::Result;
use crate::framework::Framework;
use crate::layout::ProjectLayout;
use crate::pages;
use crate::presentation;
use crate::registry::Registry;
use crate::render;
use crate::styles::{self, SassCli, StylesheetCompiler};
use log::info;

/// Everything a stage needs, built once at startup and passed explicitly
pub struct Context {
    pub config: Config,
    pub layout: ProjectLayout,
    pub registry: Registry,
    pub converter: Box<dyn DocumentConverter>,
    pub compiler: Box<dyn StylesheetCompiler>,
}

impl Context {
    /// Load the registry from the configured root and use the CLI tools
    pub fn load(config: Config) -> Result<Self> {
        let registry = Registry::load(&config.root)?;
        let converter = Box::new(Asciidoctor::from_config(&config));
        let compiler = Box::new(SassCli::from_config(&config));
        Ok(Self::new(config, registry, converter, compiler))
    }

    pub fn new(
        config: Config,
        registry: Registry,
        converter: Box<dyn DocumentConverter>,
        compiler: Box<dyn StylesheetCompiler>,
    ) -> Self {
        Self {
            layout: ProjectLayout::new(config.root.clone()),
            config,
            registry,
            converter,
            compiler,
        }
    }

    pub fn framework(&self) -> Framework {
        Framework::new(&self.config, &self.layout)
    }
}

/// Build styles, every deck and its PDF, then the pages site
pub fn run_all(ctx: &Context) -> Result<()> {
    styles::build_styles(ctx)?;
    for config in ctx.registry.iter() {
        presentation::build_presentation(ctx, &config.name)?;
        render::export_pdf(ctx, &config.name)?;
    }
    pages::build_pages(ctx)?;
    info!("Built {} presentations", ctx.registry.len());
    Ok(())
}
