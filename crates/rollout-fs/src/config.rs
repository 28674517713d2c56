//! Format-agnostic document loading

use crate::{Error, NormalizedPath, Result, io};
use serde::de::DeserializeOwned;

/// Document formats understood by [`ConfigStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
    Yaml,
}

impl Format {
    /// Detect the format from a file extension.
    ///
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }
}

/// Format-agnostic document store.
///
/// Detects the format from the file extension and deserializes into any
/// `serde` type. Blank documents deserialize as an empty mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Load a document, detecting the format from its extension.
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let extension = path.extension().unwrap_or("");
        let format = Format::from_extension(extension).ok_or_else(|| Error::UnsupportedFormat {
            extension: extension.to_string(),
        })?;
        self.load_as(path, format)
    }

    /// Load a document with an explicit format, ignoring the extension.
    pub fn load_as<T: DeserializeOwned>(&self, path: &NormalizedPath, format: Format) -> Result<T> {
        let content = io::read_text(path)?;
        tracing::trace!(%path, format = format.name(), "Loading document");
        parse(&content, format).map_err(|message| Error::Parse {
            path: path.to_native(),
            format: format.name().into(),
            message,
        })
    }

    /// Load a document if the file exists, returning `None` otherwise.
    pub fn load_optional<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<Option<T>> {
        if !path.is_file() {
            tracing::debug!(%path, "Optional document not found");
            return Ok(None);
        }
        self.load(path).map(Some)
    }
}

fn parse<T: DeserializeOwned>(content: &str, format: Format) -> std::result::Result<T, String> {
    let content = if content.trim().is_empty() && format != Format::Toml {
        "{}"
    } else {
        content
    };

    match format {
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    }
}
