// Profile file loaders

use crate::{ConfigError, ProfileDocument, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use verity_core::{TypeRegistry, Verifier};
use verity_log::{debug, info};

/// Environment variable naming the profile file for [`ProfileLoader::from_env`].
pub const PROFILE_ENV: &str = "VERITY_PROFILE";

/// Supported profile file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        Self::from_extension(ext)
            .ok_or_else(|| ConfigError::LoadError(format!("Unsupported format: {}", ext)))
    }
}

/// Turns profile documents into ready [`Verifier`]s.
#[derive(Debug, Clone)]
pub struct ProfileLoader {
    format: FileFormat,
    types: TypeRegistry,
}

impl ProfileLoader {
    pub fn new(format: FileFormat) -> Self {
        Self {
            format,
            types: TypeRegistry::new(),
        }
    }

    /// Detect the format from the file extension.
    pub fn auto(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(FileFormat::from_path(path.as_ref())?))
    }

    /// Load the profile named by `VERITY_PROFILE`.
    pub fn from_env() -> Result<Verifier> {
        let path = std::env::var(PROFILE_ENV)?;
        Self::auto(&path)?.load_file(&path)
    }

    /// Types the profile may reference; the verifier checks against the
    /// same registry.
    pub fn with_types(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Verifier> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let verifier = self.parse(&content)?;
        info!(
            target: "verity::config",
            "loaded profile {} ({} fields)",
            path.display(),
            verifier.profile().len()
        );
        Ok(verifier)
    }

    /// Parse a profile document and build a verifier from it.
    pub fn parse(&self, content: &str) -> Result<Verifier> {
        let document = self.parse_document(content)?;
        Ok(Verifier::new(document.profile)
            .with_filters(document.filters)
            .with_type_checker(self.types.clone()))
    }

    pub fn parse_document(&self, content: &str) -> Result<ProfileDocument> {
        let value = match self.format {
            FileFormat::Json => self.parse_json(content)?,
            FileFormat::Toml => self.parse_toml(content)?,
        };
        debug!(target: "verity::config", "parsed {:?} profile document", self.format);
        ProfileDocument::from_value(&value, &self.types)
    }

    fn parse_json(&self, content: &str) -> Result<Value> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))
    }

    fn parse_toml(&self, content: &str) -> Result<Value> {
        let toml_value: toml::Value = toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        serde_json::to_value(toml_value)
            .map_err(|e| ConfigError::ParseError(format!("TOML to JSON conversion error: {}", e)))
    }
}
