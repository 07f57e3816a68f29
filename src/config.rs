//! Redactr configuration management

use crate::detectors::address::DEFAULT_COUNTRIES;
use crate::detectors::phone::DEFAULT_REGIONS;
use crate::detectors::{Country, PhoneLeniency, Region};
use crate::error::{Error, Result};
use crate::redaction::{EntityKind, RedactionMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main Redactr configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedactrConfig {
    /// PDF extraction
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Detectors and rewrite mode
    #[serde(default)]
    pub redaction: RedactionConfig,

    /// Named-entity model
    #[serde(default)]
    pub model: ModelConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
}

impl RedactrConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(format!("Cannot serialize config: {}", e)))
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.extractor.max_bytes == 0 {
            return Err(Error::Config("extractor.max_bytes must be positive".to_string()));
        }
        let redaction = &self.redaction;
        if redaction.is_enabled(EntityKind::Phone) && redaction.phone_regions.is_empty() {
            return Err(Error::Config(
                "redaction.phone_regions is empty but phone redaction is enabled".to_string(),
            ));
        }
        if redaction.is_enabled(EntityKind::Address) && redaction.address_countries.is_empty() {
            return Err(Error::Config(
                "redaction.address_countries is empty but address redaction is enabled"
                    .to_string(),
            ));
        }
        if self.model.name.trim().is_empty() {
            return Err(Error::Config("model.name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// PDF extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Largest accepted PDF in bytes
    pub max_bytes: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Redaction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    /// Default rewrite mode
    pub mode: RedactionMode,

    /// Entity kinds to redact; passes always run in person, email, phone,
    /// address order
    pub enabled: Vec<EntityKind>,

    /// Regions used to interpret phone numbers
    pub phone_regions: Vec<Region>,

    /// Phone-number acceptance
    pub phone_leniency: PhoneLeniency,

    /// Countries whose address grammars are applied
    pub address_countries: Vec<Country>,

    /// Also parse a title-cased copy of the text for addresses
    pub title_case_variant: bool,
}

impl RedactionConfig {
    pub fn is_enabled(&self, kind: EntityKind) -> bool {
        self.enabled.contains(&kind)
    }
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            mode: RedactionMode::Replace,
            enabled: EntityKind::ALL.to_vec(),
            phone_regions: DEFAULT_REGIONS.to_vec(),
            phone_leniency: PhoneLeniency::Possible,
            address_countries: DEFAULT_COUNTRIES.to_vec(),
            title_case_variant: true,
        }
    }
}

/// Named-entity model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model name; files live in `<dir>/<name>/`
    pub name: String,

    /// Directory holding installed models
    pub dir: PathBuf,

    /// Base URL serving `model.toml`, `given_names.txt` and
    /// `stopwords.txt`. The bundled model is installed when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let base = dirs_next::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("redactr");

        Self {
            name: "en_names".to_string(),
            dir: base.join("models"),
            source_url: None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty allows any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}
