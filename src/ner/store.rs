//! Model directory management
//!
//! A model directory holds:
//!
//! ```text
//! <dir>/<name>/model.toml       manifest (name, version, lexicon checksum)
//! <dir>/<name>/given_names.txt  lexicon, one entry per line
//! <dir>/<name>/stopwords.txt    optional
//! ```
//!
//! Loading is synchronous and happens once at startup. When the model is
//! missing or unreadable, [`ModelStore::load_or_install`] installs it (from
//! `source_url` when configured, otherwise from the copy bundled in the
//! binary) and retries exactly once.

use super::LexiconModel;
use crate::config::ModelConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "model.toml";
pub const GIVEN_NAMES_FILE: &str = "given_names.txt";
pub const STOPWORDS_FILE: &str = "stopwords.txt";

const BUNDLED_MANIFEST: &str = include_str!("../../data/ner/model.toml");
const BUNDLED_GIVEN_NAMES: &str = include_str!("../../data/ner/given_names.txt");
const BUNDLED_STOPWORDS: &str = include_str!("../../data/ner/stopwords.txt");

/// Model manifest (`model.toml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Model name
    pub name: String,
    /// Model version
    pub version: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Hex SHA-256 of `given_names.txt`, verified on load when present
    #[serde(default)]
    pub lexicon_sha256: Option<String>,
}

/// Loads and installs the named-entity model
pub struct ModelStore {
    config: ModelConfig,
    client: reqwest::Client,
}

impl ModelStore {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Directory this store loads from and installs into
    pub fn model_dir(&self) -> PathBuf {
        self.config.dir.join(&self.config.name)
    }

    /// Whether the required model files exist locally
    pub fn is_installed(&self) -> bool {
        let dir = self.model_dir();
        dir.join(MANIFEST_FILE).is_file() && dir.join(GIVEN_NAMES_FILE).is_file()
    }

    /// Load the model from the model directory
    pub fn load(&self) -> Result<LexiconModel> {
        let dir = self.model_dir();

        let manifest_raw = read_model_file(&dir, MANIFEST_FILE)?;
        let manifest: ModelManifest = toml::from_str(&manifest_raw).map_err(|e| {
            Error::Model(format!("Invalid manifest in {}: {}", dir.display(), e))
        })?;

        let given_names = read_model_file(&dir, GIVEN_NAMES_FILE)?;
        if let Some(expected) = &manifest.lexicon_sha256 {
            let actual = sha256_hex(given_names.as_bytes());
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(Error::Model(format!(
                    "Lexicon checksum mismatch for model '{}': expected {}, got {}",
                    manifest.name, expected, actual
                )));
            }
        }

        let stopwords = match std::fs::read_to_string(dir.join(STOPWORDS_FILE)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(Error::Model(format!(
                    "Cannot read {} in {}: {}",
                    STOPWORDS_FILE,
                    dir.display(),
                    e
                )))
            }
        };

        let model = LexiconModel::from_lists(manifest.name.clone(), &given_names, &stopwords)?;
        tracing::info!(
            model = %manifest.name,
            version = %manifest.version,
            names = model.lexicon_size(),
            "NER model loaded"
        );
        Ok(model)
    }

    /// Install the model files into the model directory
    pub async fn install(&self) -> Result<PathBuf> {
        let dir = self.model_dir();
        tokio::fs::create_dir_all(&dir).await?;

        match &self.config.source_url {
            Some(base) => {
                tracing::info!(source = %base, dir = %dir.display(), "Downloading NER model");
                for (file, required) in [
                    (MANIFEST_FILE, true),
                    (GIVEN_NAMES_FILE, true),
                    (STOPWORDS_FILE, false),
                ] {
                    match self.fetch(base, file).await? {
                        Some(body) => tokio::fs::write(dir.join(file), body).await?,
                        None if required => {
                            return Err(Error::Model(format!(
                                "Model source {} has no {}",
                                base, file
                            )))
                        }
                        None => {}
                    }
                }
            }
            None => {
                tracing::info!(dir = %dir.display(), "Installing bundled NER model");
                tokio::fs::write(dir.join(MANIFEST_FILE), BUNDLED_MANIFEST).await?;
                tokio::fs::write(dir.join(GIVEN_NAMES_FILE), BUNDLED_GIVEN_NAMES).await?;
                tokio::fs::write(dir.join(STOPWORDS_FILE), BUNDLED_STOPWORDS).await?;
            }
        }

        Ok(dir)
    }

    /// Load the model, installing it and retrying once if it is unavailable.
    ///
    /// A failure after the install attempt is returned to the caller.
    pub async fn load_or_install(&self) -> Result<LexiconModel> {
        match self.load() {
            Ok(model) => Ok(model),
            Err(first) => {
                tracing::warn!(
                    error = %first,
                    dir = %self.model_dir().display(),
                    "NER model unavailable locally, installing"
                );
                self.install().await.map_err(|e| {
                    Error::Model(format!("Failed to install NER model: {}", e))
                })?;
                self.load().map_err(|e| {
                    Error::Model(format!("NER model unavailable after install: {}", e))
                })
            }
        }
    }

    async fn fetch(&self, base: &str, file: &str) -> Result<Option<String>> {
        let url = format!("{}/{}", base.trim_end_matches('/'), file);
        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.error_for_status()?.text().await?;
        Ok(Some(body))
    }
}

fn read_model_file(dir: &Path, file: &str) -> Result<String> {
    std::fs::read_to_string(dir.join(file))
        .map_err(|e| Error::Model(format!("Cannot read {} in {}: {}", file, dir.display(), e)))
}

fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
