use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{FilterError, Result};
use crate::locale::LocaleId;

/// Default encoding assumed when the caller declares none
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Input of a filter: raw bytes plus what the caller knows about them
#[derive(Debug, Clone)]
pub struct RawDocument {
    bytes: Vec<u8>,
    /// Declared encoding, overridden by a BOM
    pub encoding: String,
    pub source_locale: LocaleId,
    pub target_locale: Option<LocaleId>,
    /// Filter configuration the caller selected, if any
    pub filter_config_id: Option<String>,
    /// Where the bytes came from, for names and error messages
    pub input_path: Option<PathBuf>,
}

impl RawDocument {
    pub fn from_bytes(bytes: Vec<u8>, encoding: &str, source_locale: LocaleId) -> Self {
        Self {
            bytes,
            encoding: encoding.to_string(),
            source_locale,
            target_locale: None,
            filter_config_id: None,
            input_path: None,
        }
    }

    /// In-memory document, UTF-8 encoded
    pub fn from_text(text: &str, source_locale: LocaleId) -> Self {
        Self::from_bytes(text.as_bytes().to_vec(), DEFAULT_ENCODING, source_locale)
    }

    /// Read a document from disk
    pub fn from_path<P: AsRef<Path>>(path: P, encoding: &str, source_locale: LocaleId) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| FilterError::io(format!("reading {}", path.display()), e))?;
        let mut doc = Self::from_bytes(bytes, encoding, source_locale);
        doc.input_path = Some(path.to_path_buf());
        Ok(doc)
    }

    pub fn with_target_locale(mut self, locale: LocaleId) -> Self {
        self.target_locale = Some(locale);
        self
    }

    pub fn with_filter_config(mut self, config_id: &str) -> Self {
        self.filter_config_id = Some(config_id.to_string());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Document name: the input path when known
    pub fn name(&self) -> Option<String> {
        self.input_path
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }
}
