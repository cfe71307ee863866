/*!
 * Configuration id → filter factory registry.
 *
 * Filters are registered once at startup; each registration contributes the
 * configurations the filter offers. User overrides from the application
 * configuration are merged into a configuration's parameters, and file
 * extensions map to configuration ids for directory batches.
 */

use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::errors::{FilterError, Result};

use super::{
    DtdFilter, Filter, FilterConfiguration, MarkupFilter, PlainTextFilter, PropertiesFilter,
    TransTableFilter,
};

/// Creates a fresh, unconfigured filter
pub type FilterFactory = fn() -> Box<dyn Filter>;

struct Entry {
    configuration: FilterConfiguration,
    factory: FilterFactory,
}

#[derive(Default)]
pub struct FilterConfigurationMapper {
    entries: BTreeMap<String, Entry>,
    extensions: BTreeMap<String, String>,
}

impl std::fmt::Debug for FilterConfigurationMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterConfigurationMapper")
            .field("configurations", &self.entries.keys().collect::<Vec<_>>())
            .field("extensions", &self.extensions)
            .finish()
    }
}

/// Lowercase extension with its dot
fn normalize_extension(extension: &str) -> String {
    let ext = extension.trim().to_lowercase();
    if ext.starts_with('.') { ext } else { format!(".{}", ext) }
}

impl FilterConfigurationMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in filter
    pub fn with_defaults() -> Self {
        let mut mapper = Self::new();
        mapper.register(PropertiesFilter::create);
        mapper.register(PlainTextFilter::create);
        mapper.register(DtdFilter::create);
        mapper.register(TransTableFilter::create);
        mapper.register(MarkupFilter::create);
        mapper
    }

    /// Register every configuration a filter offers
    pub fn register(&mut self, factory: FilterFactory) {
        let prototype = factory();
        for configuration in prototype.configurations() {
            self.add_configuration(configuration, factory);
        }
    }

    /// Register one configuration; its extensions are mapped unless
    /// already taken
    pub fn add_configuration(&mut self, configuration: FilterConfiguration, factory: FilterFactory) {
        for extension in &configuration.extensions {
            self.extensions
                .entry(normalize_extension(extension))
                .or_insert_with(|| configuration.config_id.clone());
        }
        debug!("Registered filter configuration {}", configuration.config_id);
        self.entries.insert(
            configuration.config_id.clone(),
            Entry {
                configuration,
                factory,
            },
        );
    }

    pub fn configurations(&self) -> impl Iterator<Item = &FilterConfiguration> {
        self.entries.values().map(|e| &e.configuration)
    }

    pub fn configuration(&self, config_id: &str) -> Option<&FilterConfiguration> {
        self.entries.get(config_id).map(|e| &e.configuration)
    }

    pub fn contains(&self, config_id: &str) -> bool {
        self.entries.contains_key(config_id)
    }

    /// Merge a partial JSON object into a configuration's parameters
    pub fn apply_overrides(&mut self, config_id: &str, overrides: &serde_json::Value) -> Result<()> {
        let entry = self
            .entries
            .get_mut(config_id)
            .ok_or_else(|| FilterError::UnknownConfiguration(config_id.to_string()))?;
        let merged = entry
            .configuration
            .parameters
            .merged_with(overrides)
            .map_err(|e| {
                FilterError::InvalidState(format!("invalid parameters for {}: {}", config_id, e))
            })?;
        entry.configuration.parameters = merged;
        debug!("Applied parameter overrides to {}", config_id);
        Ok(())
    }

    /// Map a file extension to a configuration id
    pub fn map_extension(&mut self, extension: &str, config_id: &str) -> Result<()> {
        if !self.contains(config_id) {
            return Err(FilterError::UnknownConfiguration(config_id.to_string()));
        }
        let previous = self
            .extensions
            .insert(normalize_extension(extension), config_id.to_string());
        if let Some(previous) = previous.filter(|p| p != config_id) {
            warn!("Extension {} now maps to {} instead of {}", extension, config_id, previous);
        }
        Ok(())
    }

    pub fn extensions(&self) -> &BTreeMap<String, String> {
        &self.extensions
    }

    /// Configuration id for a file, by extension
    pub fn config_for_path(&self, path: &Path) -> Option<&str> {
        let extension = path.extension()?.to_str()?;
        self.extensions
            .get(&normalize_extension(extension))
            .map(String::as_str)
    }

    /// Create a filter for a configuration, with its parameters and this
    /// mapper for nested filters
    pub fn create_filter(self: &Arc<Self>, config_id: &str) -> Result<Box<dyn Filter>> {
        let entry = self
            .entries
            .get(config_id)
            .ok_or_else(|| FilterError::UnknownConfiguration(config_id.to_string()))?;
        let mut filter = (entry.factory)();
        filter.set_parameters(entry.configuration.parameters.clone());
        filter.set_configuration_id(config_id);
        filter.set_configuration_mapper(Arc::clone(self));
        Ok(filter)
    }
}
