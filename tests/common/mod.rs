/*!
 * Common test utilities for the filterkit test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use filterkit::filters::{FilterConfigurationMapper, extract_all};
use filterkit::writer::{WriterOptions, write_to_vec};
use filterkit::{Event, LocaleId, RawDocument, TextUnit};

/// Route library logs to the test output; RUST_LOG selects the level
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

pub fn en() -> LocaleId {
    LocaleId::parse("en").expect("valid locale")
}

pub fn fr() -> LocaleId {
    LocaleId::parse("fr").expect("valid locale")
}

pub fn mapper() -> Arc<FilterConfigurationMapper> {
    Arc::new(FilterConfigurationMapper::with_defaults())
}

/// Extract every event of `bytes` with the given configuration
pub fn extract_bytes(config_id: &str, bytes: &[u8]) -> Result<Vec<Event>> {
    let mapper = mapper();
    let mut filter = mapper.create_filter(config_id)?;
    let document = RawDocument::from_bytes(bytes.to_vec(), "UTF-8", en()).with_filter_config(config_id);
    Ok(extract_all(filter.as_mut(), document)?)
}

/// Extract every event of a UTF-8 text
pub fn extract(config_id: &str, text: &str) -> Result<Vec<Event>> {
    extract_bytes(config_id, text.as_bytes())
}

/// Text units of an event sequence, in order
pub fn text_units(events: &[Event]) -> Vec<&TextUnit> {
    events.iter().filter_map(Event::text_unit).collect()
}

/// Write `events` back with default options
pub fn write(events: &[Event]) -> Result<Vec<u8>> {
    Ok(write_to_vec(events, WriterOptions::default())?)
}

/// Extract then write back with default options
pub fn roundtrip(config_id: &str, text: &str) -> Result<String> {
    let events = extract(config_id, text)?;
    Ok(String::from_utf8(write(&events)?)?)
}
