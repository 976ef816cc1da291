// ABOUTME: Presentation registry for the slidedecks application
// ABOUTME: Loads the immutable table of presentations and site settings from slidedecks.toml

use crate::errors::{DeckError, Result};
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const REGISTRY_FILE: &str = "slidedecks.toml";
pub const DEFAULT_THEME: &str = "netflix";

/// A single registered presentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationConfig {
    pub name: String,
    pub date: NaiveDate,
    pub title: String,
    pub venue: String,
    pub video: String,
    pub theme: String,
}

impl PresentationConfig {
    /// Project the config onto the metadata persisted for the index
    pub fn metadata(&self) -> PresentationMetadata {
        PresentationMetadata {
            name: self.name.clone(),
            date: self.date,
            title: self.title.clone(),
            venue: self.venue.clone(),
            video: self.video.clone(),
        }
    }
}

/// What the index needs to know about a staged presentation.
/// `name` is not stored in metadata.json; it is the staging directory name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationMetadata {
    #[serde(skip)]
    pub name: String,
    pub date: NaiveDate,
    pub title: String,
    pub venue: String,
    #[serde(default)]
    pub video: String,
}

/// Settings for the generated index page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    pub author: Option<String>,
    pub intro: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "slidedecks".to_string(),
            author: None,
            intro: "On HTML Slidedecks, hit kbd:[s] to open speaker notes in a new window.\n\
                    Hit kbd:[?] to see all shortcuts."
                .to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    site: SiteConfig,
    #[serde(default)]
    presentations: BTreeMap<String, PresentationEntry>,
}

#[derive(Deserialize)]
struct PresentationEntry {
    date: NaiveDate,
    title: String,
    venue: String,
    #[serde(default)]
    video: String,
    #[serde(default)]
    theme: Option<String>,
}

/// Immutable table of presentations keyed by name
#[derive(Debug, Clone, Default)]
pub struct Registry {
    site: SiteConfig,
    presentations: BTreeMap<String, PresentationConfig>,
}

impl Registry {
    /// Load the registry from `slidedecks.toml` in the project root
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(REGISTRY_FILE);
        if !path.exists() {
            return Err(DeckError::ConfigError(format!(
                "Registry file not found: {:?}",
                path
            )));
        }
        info!("Loading presentation registry from {:?}", path);
        let content = fs::read_to_string(&path).map_err(DeckError::FileReadError)?;
        Self::parse(&content)
    }

    /// Parse registry TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(content)?;

        let mut presentations = BTreeMap::new();
        for (name, entry) in file.presentations {
            validate_name(&name)?;
            let theme = entry
                .theme
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_THEME.to_string());
            presentations.insert(
                name.clone(),
                PresentationConfig {
                    name,
                    date: entry.date,
                    title: entry.title,
                    venue: entry.venue,
                    video: entry.video,
                    theme,
                },
            );
        }

        Ok(Self {
            site: file.site,
            presentations,
        })
    }

    /// Build a registry directly from configs
    pub fn from_presentations(
        site: SiteConfig,
        presentations: impl IntoIterator<Item = PresentationConfig>,
    ) -> Self {
        Self {
            site,
            presentations: presentations
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Look up a presentation, failing with the list of known names
    pub fn get(&self, name: &str) -> Result<&PresentationConfig> {
        self.presentations
            .get(name)
            .ok_or_else(|| DeckError::UnknownPresentation {
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn names(&self) -> Vec<String> {
        self.presentations.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PresentationConfig> {
        self.presentations.values()
    }

    pub fn len(&self) -> usize {
        self.presentations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presentations.is_empty()
    }
}

// Names become directory names under the project root and the staging tree
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(DeckError::ConfigError(format!(
            "Invalid presentation name: {:?}",
            name
        )));
    }
    Ok(())
}
