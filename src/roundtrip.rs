/*!
 * Extract-then-write check.
 *
 * A document read by a filter and written back without changes must come
 * out byte-identical. The harness runs both halves in memory and reports the
 * first differing byte with some context around it.
 */

use log::debug;
use std::fmt;
use std::sync::Arc;

use crate::document::RawDocument;
use crate::errors::Result;
use crate::event::{Event, NestingValidator};
use crate::filters::{FilterConfigurationMapper, extract_all};
use crate::writer::{WriterOptions, write_to_vec};

/// Bytes shown on each side of a difference
const CONTEXT_BYTES: usize = 24;

/// Where and how the output first differs from the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub offset: usize,
    /// Input around the offset
    pub expected: String,
    /// Output around the offset
    pub actual: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "first difference at byte {}: expected {:?}, got {:?}",
            self.offset, self.expected, self.actual
        )
    }
}

/// Outcome of one document's round trip
#[derive(Debug, Clone)]
pub struct RoundTripReport {
    pub name: String,
    pub config_id: String,
    pub events: usize,
    pub text_units: usize,
    pub input_len: usize,
    pub output_len: usize,
    pub mismatch: Option<Mismatch>,
}

impl RoundTripReport {
    pub fn is_identical(&self) -> bool {
        self.mismatch.is_none()
    }
}

/// Offset of the first differing byte, if any
pub fn first_difference(expected: &[u8], actual: &[u8]) -> Option<usize> {
    let common = expected.len().min(actual.len());
    expected
        .iter()
        .zip(actual)
        .position(|(a, b)| a != b)
        .or_else(|| (expected.len() != actual.len()).then_some(common))
}

fn context(bytes: &[u8], offset: usize) -> String {
    let start = offset.saturating_sub(CONTEXT_BYTES);
    let end = (offset + CONTEXT_BYTES).min(bytes.len());
    if start >= end {
        return String::new();
    }
    String::from_utf8_lossy(&bytes[start..end]).to_string()
}

/// Compare two byte strings
pub fn compare(expected: &[u8], actual: &[u8]) -> Option<Mismatch> {
    first_difference(expected, actual).map(|offset| Mismatch {
        offset,
        expected: context(expected, offset),
        actual: context(actual, offset),
    })
}

pub struct RoundTripHarness {
    mapper: Arc<FilterConfigurationMapper>,
    validate_nesting: bool,
}

impl RoundTripHarness {
    pub fn new(mapper: Arc<FilterConfigurationMapper>) -> Self {
        Self {
            mapper,
            validate_nesting: true,
        }
    }

    /// Whether the event sequence is checked with `NestingValidator`
    pub fn with_nesting_validation(mut self, enabled: bool) -> Self {
        self.validate_nesting = enabled;
        self
    }

    /// Extract every event of `document` with configuration `config_id`
    pub fn extract(&self, config_id: &str, document: RawDocument) -> Result<Vec<Event>> {
        let mut filter = self.mapper.create_filter(config_id)?;
        let events = extract_all(filter.as_mut(), document)?;
        if self.validate_nesting {
            NestingValidator::validate(&events)?;
        }
        Ok(events)
    }

    /// Extract, write back in the input encoding, and compare
    pub fn run(&self, config_id: &str, document: RawDocument) -> Result<RoundTripReport> {
        let name = document.name().unwrap_or_else(|| "<memory>".to_string());
        let input = document.bytes().to_vec();
        let events = self.extract(config_id, document)?;
        let output = write_to_vec(&events, WriterOptions::default())?;

        let report = RoundTripReport {
            name,
            config_id: config_id.to_string(),
            events: events.len(),
            text_units: events.iter().filter(|e| e.is_text_unit()).count(),
            input_len: input.len(),
            output_len: output.len(),
            mismatch: compare(&input, &output),
        };
        debug!(
            "Round trip of {} with {}: {} events, {} text units, {}",
            report.name,
            report.config_id,
            report.events,
            report.text_units,
            match &report.mismatch {
                None => "identical".to_string(),
                Some(m) => m.to_string(),
            }
        );
        Ok(report)
    }
}
