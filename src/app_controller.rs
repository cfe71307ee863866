use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::document::RawDocument;
use crate::event::Event;
use crate::file_utils::FileManager;
use crate::filters::{FilterConfigurationMapper, extract_all};
use crate::locale::LocaleId;
use crate::resource::TextUnit;
use crate::roundtrip::RoundTripHarness;
use crate::writer::{FilterWriter, WriterOptions};

// @module: Application controller for batch document processing

/// What a batch does with each document
#[derive(Debug, Clone)]
pub enum Operation {
    /// Extract and write back, compare bytes
    RoundTrip,
    /// Extract and write to a new file
    Rewrite {
        // @field: Output directory; each input's own directory when unset
        output_dir: Option<PathBuf>,
        // @field: Fill missing targets with upper-cased source text
        pseudo: bool,
        force_overwrite: bool,
    },
}

/// Outcome of a batch
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Documents processed without error
    pub succeeded: Vec<PathBuf>,
    /// Round trips whose output differed, with the first difference
    pub mismatches: Vec<(PathBuf, String)>,
    /// Documents that failed, with the error
    pub failures: Vec<(PathBuf, String)>,
    /// Rewrites skipped because the output exists
    pub skipped: Vec<PathBuf>,
    pub duration: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.mismatches.len() + self.failures.len() + self.skipped.len()
    }

    pub fn is_success(&self) -> bool {
        self.mismatches.is_empty() && self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} document(s): {} ok, {} mismatched, {} failed, {} skipped in {}",
            self.total(),
            self.succeeded.len(),
            self.mismatches.len(),
            self.failures.len(),
            self.skipped.len(),
            format_duration(self.duration)
        )
    }
}

// Format duration in a human-readable format
fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}

/// Give `tu` a target for `locale` made of its upper-cased source, unless
/// it already has one
pub fn pseudo_translate(tu: &mut TextUnit, locale: &LocaleId) {
    if tu.targets.contains_key(locale) {
        return;
    }
    let mut target = tu.source.clone();
    for part in target.parts_mut() {
        part.content = part.content.map_text(|text| text.to_uppercase());
    }
    tu.set_target(locale.clone(), target);
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    mapper: Arc<FilterConfigurationMapper>,
    source_locale: LocaleId,
    target_locale: LocaleId,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let mapper = Arc::new(config.build_mapper()?);
        let source_locale = config.source_locale()?;
        let target_locale = config.target_locale()?;
        Ok(Self {
            config,
            mapper,
            source_locale,
            target_locale,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mapper(&self) -> &Arc<FilterConfigurationMapper> {
        &self.mapper
    }

    /// Configuration id for `path`: `requested` when given, otherwise by
    /// extension
    pub fn resolve_config(&self, path: &Path, requested: Option<&str>) -> Result<String> {
        match requested {
            Some(id) if self.mapper.contains(id) => Ok(id.to_string()),
            Some(id) => Err(anyhow!("Unknown filter configuration: '{}'", id)),
            None => self
                .mapper
                .config_for_path(path)
                .map(str::to_string)
                .ok_or_else(|| anyhow!("No filter configuration for {:?}", path)),
        }
    }

    /// Documents under `input` (a file or a directory) with their
    /// configuration ids
    pub fn collect_inputs(&self, input: &Path, requested: Option<&str>) -> Result<Vec<(PathBuf, String)>> {
        if FileManager::file_exists(input) {
            let config_id = self.resolve_config(input, requested)?;
            return Ok(vec![(input.to_path_buf(), config_id)]);
        }
        if !FileManager::dir_exists(input) {
            return Err(anyhow!("Input path does not exist: {:?}", input));
        }
        let mut inputs = FileManager::find_documents(input, &self.mapper)?;
        if let Some(id) = requested {
            let id = self.resolve_config(input, Some(id))?;
            for (_, config_id) in inputs.iter_mut() {
                config_id.clone_from(&id);
            }
        }
        Ok(inputs)
    }

    fn open_document(&self, path: &Path, config_id: &str) -> Result<RawDocument> {
        let document = RawDocument::from_path(path, &self.config.default_encoding, self.source_locale.clone())?
            .with_target_locale(self.target_locale.clone())
            .with_filter_config(config_id);
        Ok(document)
    }

    /// Extract every event of one document
    pub fn extract_file(&self, path: &Path, config_id: &str) -> Result<Vec<Event>> {
        let document = self.open_document(path, config_id)?;
        let mut filter = self.mapper.create_filter(config_id)?;
        let events = extract_all(filter.as_mut(), document)
            .with_context(|| format!("Failed to extract {:?}", path))?;
        debug!("Extracted {} events from {:?}", events.len(), path);
        Ok(events)
    }

    /// Write the events of one document as JSON lines
    pub fn dump_events(&self, path: &Path, config_id: &str, out: &mut dyn Write) -> Result<usize> {
        let events = self.extract_file(path, config_id)?;
        for event in &events {
            serde_json::to_writer(&mut *out, event)?;
            writeln!(out)?;
        }
        Ok(events.len())
    }

    /// Extract and write back one document; returns the first difference
    /// when the output is not identical
    pub fn roundtrip_file(&self, path: &Path, config_id: &str) -> Result<Option<String>> {
        let document = self.open_document(path, config_id)?;
        let report = RoundTripHarness::new(Arc::clone(&self.mapper)).run(config_id, document)?;
        Ok(report.mismatch.map(|m| m.to_string()))
    }

    /// Extract one document and write it to `output_path` in the target
    /// locale
    pub fn rewrite_file(&self, path: &Path, config_id: &str, output_path: &Path, pseudo: bool) -> Result<()> {
        let mut events = self.extract_file(path, config_id)?;
        if pseudo {
            for event in events.iter_mut() {
                if let Some(tu) = event.text_unit_mut() {
                    pseudo_translate(tu, &self.target_locale);
                }
            }
        }

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            FileManager::ensure_dir(parent)?;
        }
        let mut writer = FilterWriter::new();
        writer.set_options(WriterOptions {
            locale: Some(self.target_locale.clone()),
            encoding: self.config.output_encoding.clone(),
            line_break: self.config.line_break.to_newline(),
        });
        writer.set_output(output_path);
        for event in &events {
            writer
                .handle_event(event)
                .with_context(|| format!("Failed to write {:?}", output_path))?;
        }
        writer.close();
        Ok(())
    }

    /// Run `operation` over a file or every known document under a directory;
    /// a failing document does not stop the batch
    pub fn run_batch(&self, input: &Path, requested: Option<&str>, operation: &Operation) -> Result<BatchReport> {
        let start_time = Instant::now();
        let inputs = self.collect_inputs(input, requested)?;
        if inputs.is_empty() {
            return Err(anyhow!("No supported documents found in: {:?}", input));
        }

        let progress = ProgressBar::new(inputs.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress.set_style(style.progress_chars("█▓▒░"));

        let mut report = BatchReport::default();
        for (path, config_id) in &inputs {
            let file_name = path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            progress.set_message(format!("Processing: {}", file_name));

            match operation {
                Operation::RoundTrip => match self.roundtrip_file(path, config_id) {
                    Ok(None) => report.succeeded.push(path.clone()),
                    Ok(Some(detail)) => {
                        warn!("Round trip of {} differs: {}", file_name, detail);
                        report.mismatches.push((path.clone(), detail));
                    }
                    Err(e) => {
                        error!("Error processing file {}: {:#}", file_name, e);
                        report.failures.push((path.clone(), format!("{:#}", e)));
                    }
                },
                Operation::Rewrite {
                    output_dir,
                    pseudo,
                    force_overwrite,
                } => {
                    let dir = output_dir
                        .clone()
                        .or_else(|| path.parent().map(Path::to_path_buf))
                        .unwrap_or_else(|| PathBuf::from("."));
                    let output_path =
                        FileManager::generate_output_path(path, &dir, &self.target_locale.to_string());
                    if output_path.exists() && !force_overwrite {
                        warn!("Skipping {}, output already exists (use -f to force overwrite)", file_name);
                        report.skipped.push(path.clone());
                    } else {
                        match self.rewrite_file(path, config_id, &output_path, *pseudo) {
                            Ok(()) => {
                                info!("Success: {}", output_path.display());
                                report.succeeded.push(path.clone());
                            }
                            Err(e) => {
                                error!("Error processing file {}: {:#}", file_name, e);
                                report.failures.push((path.clone(), format!("{:#}", e)));
                            }
                        }
                    }
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        report.duration = start_time.elapsed();
        info!("{}", report.summary());
        Ok(report)
    }
}
