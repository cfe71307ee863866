use log::trace;
use std::sync::Arc;

use crate::code_finder::InlineCodeFinder;
use crate::document::RawDocument;
use crate::encoder::EncoderKind;
use crate::errors::{FilterError, Result};
use crate::event::Event;
use crate::resource::{CodeSimplifier, TextFragment, TextUnit};
use crate::skeleton::Skeleton;

use super::core::{FilterCore, split_whitespace_edges};
use super::lines::LineReader;
use super::{
    Filter, FilterConfiguration, FilterConfigurationMapper, FilterParameters, FilterState,
    SubFilter,
};

pub const FILTER_NAME: &str = "okf_plaintext";
pub const CONFIG_TRIM_TRAIL: &str = "okf_plaintext_trim_trail";
pub const CONFIG_TRIM_ALL: &str = "okf_plaintext_trim_all";
pub const MIME_TYPE: &str = "text/plain";

/// One line, one text unit
///
/// Blank lines stay in the skeleton; trimmed whitespace goes around the
/// content placeholder so it is written back unchanged.
pub struct PlainTextFilter {
    core: FilterCore,
    params: FilterParameters,
    mapper: Option<Arc<FilterConfigurationMapper>>,
    reader: LineReader,
    skeleton: Skeleton,
    finder: Option<InlineCodeFinder>,
    subfilter_count: usize,
}

impl Default for PlainTextFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl PlainTextFilter {
    pub fn new() -> Self {
        Self {
            core: FilterCore::new(FILTER_NAME),
            params: FilterParameters::plain_text(),
            mapper: None,
            reader: LineReader::default(),
            skeleton: Skeleton::new(),
            finder: None,
            subfilter_count: 0,
        }
    }

    pub fn create() -> Box<dyn Filter> {
        Box::new(Self::new())
    }

    fn read_line(&mut self) -> Result<()> {
        let Some(line) = self.reader.next_line() else {
            return Ok(());
        };
        if line.content.trim().is_empty() {
            self.skeleton.append(&line.raw());
            return Ok(());
        }

        let (lead, value, trail) = split_whitespace_edges(
            &line.content,
            self.params.trim_leading,
            self.params.trim_trailing,
        );
        let mut prefix = std::mem::take(&mut self.skeleton);
        prefix.append(lead);
        let after = format!("{}{}", trail, line.terminator);
        let text = if self.params.unescape_source {
            unescape(value)
        } else {
            value.to_string()
        };
        trace!("Line {}: {} char(s) of text", line.number, text.chars().count());

        if let Some(config_id) = self.params.subfilter.clone() {
            let mapper = self.mapper.as_ref().ok_or_else(|| {
                FilterError::InvalidState(format!(
                    "sub-filter '{}' configured without a filter registry",
                    config_id
                ))
            })?;
            let nested = mapper.create_filter(&config_id)?;
            self.subfilter_count += 1;
            let parent = format!("line{}", line.number);
            let mut subfilter = SubFilter::new(nested, &parent, &parent, self.subfilter_count);
            if let Some(finder) = &self.finder {
                subfilter = subfilter.with_code_finder(finder.clone());
            }
            let locale = self.core.info()?.source_locale.clone();
            let events = subfilter.process(&text, &locale)?;
            self.core.queue.extend(events);
            let part = subfilter.reference_part(prefix, &after);
            self.core.queue.push_back(Event::DocumentPart(part));
            return Ok(());
        }

        let mut fragment = TextFragment::from_text(&text);
        if let Some(finder) = self.finder.as_mut() {
            finder.process(&mut fragment)?;
        }
        let id = self.core.tu_ids.create_id();
        let mut tu = TextUnit::new(&id, fragment);
        tu.mime_type = Some(MIME_TYPE.to_string());
        tu.preserve_whitespace = self.params.preserve_whitespace;

        let mut skeleton = prefix;
        skeleton.add_content_placeholder(&id);
        skeleton.append(&after);
        tu.skeleton = Some(skeleton);

        if let Some(policy) = self.params.simplifier.clone() {
            CodeSimplifier::new(policy).simplify_unit(&mut tu);
        }
        self.core.queue.push_back(Event::TextUnit(tu));
        Ok(())
    }
}

/// Decode `\n`, `\t`, `\\` and `\uHHHH`; anything else stays as found
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('t') => {
                chars.next();
                out.push('\t');
            }
            Some('\\') => {
                chars.next();
                out.push('\\');
            }
            Some('u') => {
                let hex: String = chars.clone().skip(1).take(4).collect();
                let valid = hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit());
                let decoded = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32);
                match decoded.filter(|_| valid) {
                    Some(ch) => {
                        for _ in 0..5 {
                            chars.next();
                        }
                        out.push(ch);
                    }
                    None => out.push('\\'),
                }
            }
            _ => out.push('\\'),
        }
    }
    out
}

fn configuration(config_id: &str, name: &str, parameters: FilterParameters) -> FilterConfiguration {
    FilterConfiguration {
        config_id: config_id.to_string(),
        filter_name: FILTER_NAME.to_string(),
        mime_type: MIME_TYPE.to_string(),
        name: name.to_string(),
        description: format!("Plain text, one text unit per line ({})", name.to_lowercase()),
        extensions: if config_id == FILTER_NAME {
            vec![".txt".to_string()]
        } else {
            Vec::new()
        },
        parameters,
    }
}

impl Filter for PlainTextFilter {
    fn name(&self) -> &str {
        FILTER_NAME
    }

    fn display_name(&self) -> &str {
        "Plain Text Filter"
    }

    fn mime_type(&self) -> &str {
        MIME_TYPE
    }

    fn configurations(&self) -> Vec<FilterConfiguration> {
        let base = FilterParameters::plain_text();
        vec![
            configuration(FILTER_NAME, "Lines as found", base.clone()),
            configuration(
                CONFIG_TRIM_TRAIL,
                "Trailing whitespace trimmed",
                FilterParameters {
                    trim_trailing: true,
                    ..base.clone()
                },
            ),
            configuration(
                CONFIG_TRIM_ALL,
                "Leading and trailing whitespace trimmed",
                FilterParameters {
                    trim_leading: true,
                    trim_trailing: true,
                    ..base
                },
            ),
        ]
    }

    fn parameters(&self) -> &FilterParameters {
        &self.params
    }

    fn set_parameters(&mut self, parameters: FilterParameters) {
        self.params = parameters;
    }

    fn set_configuration_id(&mut self, config_id: &str) {
        self.core.config_id = config_id.to_string();
    }

    fn set_configuration_mapper(&mut self, mapper: Arc<FilterConfigurationMapper>) {
        self.mapper = Some(mapper);
    }

    fn encoder_kind(&self) -> EncoderKind {
        if self.params.unescape_source {
            EncoderKind::Escaped
        } else {
            EncoderKind::Plain
        }
    }

    fn open(&mut self, document: RawDocument) -> Result<()> {
        let text = self.core.open(&document)?;
        self.reader = LineReader::new(text);
        self.skeleton = Skeleton::new();
        self.subfilter_count = 0;
        self.finder = if self.params.use_code_finder {
            let mut finder = self.params.code_finder.clone();
            finder.compile()?;
            Some(finder)
        } else {
            None
        };
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.core.has_next()
    }

    fn next(&mut self) -> Result<Event> {
        if let Some(event) = self.core.poll()? {
            return Ok(event);
        }
        if self.core.state == FilterState::Start {
            let encoder = self.encoder_kind();
            return self.core.start_document(MIME_TYPE, encoder, false, Skeleton::new());
        }
        while self.core.queue.is_empty() {
            if self.reader.is_eof() {
                let skeleton = std::mem::take(&mut self.skeleton);
                return Ok(self.core.end_document(skeleton));
            }
            self.read_line()?;
        }
        self.core
            .queue
            .pop_front()
            .ok_or_else(|| FilterError::InvalidState("event queue drained".to_string()))
    }

    fn cancel(&mut self) {
        self.core.cancel();
    }

    fn close(&mut self) {
        self.core.close();
        self.reader = LineReader::default();
        self.skeleton = Skeleton::new();
    }
}
