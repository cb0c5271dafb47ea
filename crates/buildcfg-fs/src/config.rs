//! JSON and TOML documents, with the format chosen by file extension

use crate::{Error, NormalizedPath, Result, io};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;

/// Document formats a project file can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Preset files, dependency manifests, registry pins.
    Json,
    /// Resolver settings.
    Toml,
}

impl DocumentFormat {
    pub fn from_path(path: &NormalizedPath) -> Result<Self> {
        let extension = path.extension().unwrap_or("");
        match extension.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Toml => write!(f, "TOML"),
        }
    }
}

/// Reads and renders documents in the format implied by their path.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let content = io::read_text(path)?;
        self.parse(path, &content)
    }

    /// Parse already-read content. Parse errors carry the path and format.
    pub fn parse<T: DeserializeOwned>(&self, path: &NormalizedPath, content: &str) -> Result<T> {
        let format = DocumentFormat::from_path(path)?;
        let parsed = match format {
            DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| Error::ConfigParse {
            path: path.to_native(),
            format: format.to_string(),
            message,
        })
    }

    /// Pretty-printed text for `path`, ending in a newline.
    ///
    /// Writing is left to the caller, which decides between keeping an
    /// existing file and replacing it.
    pub fn render<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<String> {
        let format = DocumentFormat::from_path(path)?;
        let rendered = match format {
            DocumentFormat::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            DocumentFormat::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
        };
        let mut content = rendered.map_err(|message| Error::ConfigSerialize {
            path: path.to_native(),
            format: format.to_string(),
            message,
        })?;
        if !content.ends_with('\n') {
            content.push('\n');
        }
        Ok(content)
    }
}
