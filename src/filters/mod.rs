/*!
 * Format filters.
 *
 * Every format is one implementation of the `Filter` pull protocol:
 * `open` a `RawDocument`, call `next` while `has_next`, then `close`.
 * Filters are created by configuration id through the
 * `FilterConfigurationMapper`, which also hands them the mapper so they can
 * create the nested filters used for sub-filtering.
 */

pub mod core;
pub mod directives;
pub mod dtd;
pub mod lines;
pub mod markup;
pub mod parameters;
pub mod plaintext;
pub mod properties;
pub mod registry;
pub mod subfilter;
pub mod transtable;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::document::RawDocument;
use crate::encoder::EncoderKind;
use crate::errors::Result;
use crate::event::Event;

pub use dtd::DtdFilter;
pub use markup::MarkupFilter;
pub use parameters::FilterParameters;
pub use plaintext::PlainTextFilter;
pub use properties::PropertiesFilter;
pub use registry::FilterConfigurationMapper;
pub use subfilter::SubFilter;
pub use transtable::TransTableFilter;

/// Position of a filter in its document lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterState {
    #[default]
    Closed,
    /// Opened; START_DOCUMENT not yet emitted
    Start,
    /// Reading records
    Body,
    /// END_DOCUMENT emitted
    End,
}

/// A named set of parameters for one filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfiguration {
    /// Registry key, e.g. `okf_properties`
    pub config_id: String,
    /// Name of the filter implementing it
    pub filter_name: String,
    pub mime_type: String,
    pub name: String,
    pub description: String,
    /// Default file extensions, with the dot
    #[serde(default)]
    pub extensions: Vec<String>,
    pub parameters: FilterParameters,
}

/// The filter pull protocol
pub trait Filter {
    /// Filter name, e.g. `okf_properties`
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    fn mime_type(&self) -> &str;

    /// Configurations this filter offers
    fn configurations(&self) -> Vec<FilterConfiguration>;

    fn parameters(&self) -> &FilterParameters;

    fn set_parameters(&mut self, parameters: FilterParameters);

    /// Configuration id reported in START_DOCUMENT
    fn set_configuration_id(&mut self, config_id: &str);

    /// Mapper used to create nested filters
    fn set_configuration_mapper(&mut self, _mapper: Arc<FilterConfigurationMapper>) {}

    /// Encoder the writer needs for this filter's content
    fn encoder_kind(&self) -> EncoderKind;

    fn open(&mut self, document: RawDocument) -> Result<()>;

    fn has_next(&self) -> bool;

    fn next(&mut self) -> Result<Event>;

    /// Request cancellation; the next `next()` returns CANCELED
    fn cancel(&mut self);

    /// Release the document; safe to call more than once
    fn close(&mut self);
}

/// Iterator view over an open filter
///
/// Stops after END_DOCUMENT, CANCELED or the first error.
pub struct EventStream<'a> {
    filter: &'a mut dyn Filter,
    done: bool,
}

impl<'a> EventStream<'a> {
    pub fn new(filter: &'a mut dyn Filter) -> Self {
        Self {
            filter,
            done: false,
        }
    }
}

impl Iterator for EventStream<'_> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || !self.filter.has_next() {
            return None;
        }
        let result = self.filter.next();
        match &result {
            Ok(event) if event.is_terminal() => self.done = true,
            Err(_) => self.done = true,
            _ => {}
        }
        Some(result)
    }
}

/// Open `document`, collect every event, and close the filter on all paths
pub fn extract_all(filter: &mut dyn Filter, document: RawDocument) -> Result<Vec<Event>> {
    let result = match filter.open(document) {
        Ok(()) => EventStream::new(&mut *filter).collect::<Result<Vec<_>>>(),
        Err(e) => Err(e),
    };
    filter.close();
    result
}
