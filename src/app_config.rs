use anyhow::{Context, Result, anyhow};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::encoding::{Charset, NewlineType};
use crate::filters::FilterConfigurationMapper;
use crate::locale::LocaleId;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Locale of the documents' source content
    pub source_locale: String,

    /// Locale of targets written by `rewrite`
    pub target_locale: String,

    /// Encoding assumed for input without a BOM
    #[serde(default = "default_encoding")]
    pub default_encoding: String,

    /// Output encoding; the detected input encoding when unset
    #[serde(default)]
    pub output_encoding: Option<String>,

    /// Line break of written documents
    #[serde(default)]
    pub line_break: LineBreak,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Parameter overrides per filter configuration id
    #[serde(default)]
    pub filters: BTreeMap<String, serde_json::Value>,

    /// Extra extension to configuration id mappings
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

/// Line break written to output documents
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineBreak {
    // @variant: Keep the input document's line breaks
    #[default]
    Auto,
    Lf,
    CrLf,
    Cr,
}

impl LineBreak {
    // @returns: Forced line break, none for auto
    pub fn to_newline(self) -> Option<NewlineType> {
        match self {
            Self::Auto => None,
            Self::Lf => Some(NewlineType::Lf),
            Self::CrLf => Some(NewlineType::CrLf),
            Self::Cr => Some(NewlineType::Cr),
        }
    }
}

impl std::str::FromStr for LineBreak {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "lf" => Ok(Self::Lf),
            "crlf" => Ok(Self::CrLf),
            "cr" => Ok(Self::Cr),
            _ => Err(anyhow!("Invalid line break: {}", s)),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_encoding() -> String {
    crate::document::DEFAULT_ENCODING.to_string()
}

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "filterkit.json";

impl Config {
    /// Load the configuration from `path`, writing a default one first when
    /// the file does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    pub fn source_locale(&self) -> Result<LocaleId> {
        LocaleId::parse(&self.source_locale).context("Invalid source locale")
    }

    pub fn target_locale(&self) -> Result<LocaleId> {
        LocaleId::parse(&self.target_locale).context("Invalid target locale")
    }

    /// Registry with the built-in filters, this configuration's parameter
    /// overrides and extension mappings applied
    pub fn build_mapper(&self) -> Result<FilterConfigurationMapper> {
        let mut mapper = FilterConfigurationMapper::with_defaults();
        for (config_id, overrides) in &self.filters {
            mapper
                .apply_overrides(config_id, overrides)
                .with_context(|| format!("Invalid parameters for filter '{}'", config_id))?;
        }
        for (extension, config_id) in &self.extensions {
            mapper
                .map_extension(extension, config_id)
                .with_context(|| format!("Invalid mapping for extension '{}'", extension))?;
        }
        Ok(mapper)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.source_locale()?;
        self.target_locale()?;

        Charset::for_label(&self.default_encoding).context("Invalid default encoding")?;
        if let Some(output) = &self.output_encoding {
            Charset::for_label(output).context("Invalid output encoding")?;
        }

        // Overrides, extension targets and code finder rules
        let mapper = self.build_mapper()?;
        for configuration in mapper.configurations() {
            let params = &configuration.parameters;
            if params.use_code_finder {
                params
                    .code_finder
                    .clone()
                    .compile()
                    .with_context(|| format!("Invalid code finder in '{}'", configuration.config_id))?;
            }
            if let Some(subfilter) = &params.subfilter {
                if !mapper.contains(subfilter) {
                    return Err(anyhow!(
                        "Filter '{}' uses unknown subfilter '{}'",
                        configuration.config_id,
                        subfilter
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_locale: "en".to_string(),
            target_locale: "fr".to_string(),
            default_encoding: default_encoding(),
            output_encoding: None,
            line_break: LineBreak::default(),
            log_level: LogLevel::default(),
            filters: BTreeMap::new(),
            extensions: BTreeMap::new(),
        }
    }
}
