/*!
 * Java properties filter.
 *
 * One logical record per `next()` round: blank lines and comments go to the
 * pending skeleton, `key=value` entries become text units whose skeleton
 * holds the key, the separator and the line break exactly as read.
 * Continuation lines (odd number of trailing backslashes) are joined into
 * one value; the rewritten entry is emitted on a single line.
 */

use log::{trace, warn};
use regex::Regex;
use std::sync::Arc;

use crate::code_finder::InlineCodeFinder;
use crate::document::RawDocument;
use crate::encoder::EncoderKind;
use crate::errors::{FilterError, Result};
use crate::event::Event;
use crate::resource::unit::PROP_START;
use crate::resource::{CodeSimplifier, TextFragment, TextUnit};
use crate::skeleton::Skeleton;

use super::core::{FilterCore, split_whitespace_edges};
use super::directives::LocalizationDirectives;
use super::lines::{Line, LineReader};
use super::{
    Filter, FilterConfiguration, FilterConfigurationMapper, FilterParameters, FilterState,
    SubFilter,
};

pub const FILTER_NAME: &str = "okf_properties";
pub const CONFIG_HTML_SUBFILTER: &str = "okf_properties-html-subfilter";
pub const MIME_TYPE: &str = "text/x-properties";

const LEADING_WHITESPACE: &[char] = &['\t', '\r', '\n', ' ', '\u{c}'];

pub struct PropertiesFilter {
    core: FilterCore,
    params: FilterParameters,
    mapper: Option<Arc<FilterConfigurationMapper>>,
    reader: LineReader,
    skeleton: Skeleton,
    notes: Vec<String>,
    directives: LocalizationDirectives,
    key_condition: Option<Regex>,
    finder: Option<InlineCodeFinder>,
    subfilter_count: usize,
}

impl Default for PropertiesFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertiesFilter {
    pub fn new() -> Self {
        Self {
            core: FilterCore::new(FILTER_NAME),
            params: FilterParameters::properties(),
            mapper: None,
            reader: LineReader::default(),
            skeleton: Skeleton::new(),
            notes: Vec::new(),
            directives: LocalizationDirectives::default(),
            key_condition: None,
            finder: None,
            subfilter_count: 0,
        }
    }

    /// Boxed instance for the registry
    pub fn create() -> Box<dyn Filter> {
        Box::new(Self::new())
    }

    fn comment_marker_len(&self, trimmed: &str) -> Option<usize> {
        if trimmed.starts_with('#') || trimmed.starts_with('!') {
            Some(1)
        } else if self.params.extra_comments && trimmed.starts_with(';') {
            Some(1)
        } else if self.params.extra_comments && trimmed.starts_with("//") {
            Some(2)
        } else {
            None
        }
    }

    /// Read one logical record; extracted entries are queued
    fn read_item(&mut self) -> Result<()> {
        let Some(line) = self.reader.next_line() else {
            return Ok(());
        };
        let trimmed = line.content.trim_start_matches(LEADING_WHITESPACE);

        if trimmed.is_empty() {
            self.skeleton.append(&line.raw());
            return Ok(());
        }

        if let Some(marker_len) = self.comment_marker_len(trimmed) {
            let comment = &trimmed[marker_len..];
            self.directives.process(comment);
            if self.params.comments_are_notes {
                self.notes.push(comment.trim().to_string());
            }
            self.skeleton.append(&line.raw());
            return Ok(());
        }

        let indent = line.content.len() - trimmed.len();
        let (key_end, value_start) = split_entry(trimmed);
        let key = trimmed[..key_end].to_string();
        let value_start = indent + value_start;
        trace!("Line {}: key '{}'", line.number, key);

        // Join continuation lines
        let mut value = line.content[value_start..].to_string();
        let mut raw = line.raw();
        let mut terminator = line.terminator;
        while ends_with_odd_backslashes(&value) && !terminator.is_empty() {
            let Some(next) = self.reader.next_line() else {
                break;
            };
            value.pop();
            value.push_str(next.content.trim_start_matches(LEADING_WHITESPACE));
            raw.push_str(&next.raw());
            terminator = next.terminator;
        }

        let extract = if self.directives.is_within_scope() {
            self.directives.is_localizable(true)
        } else if let Some(condition) = &self.key_condition {
            condition.is_match(&key) == self.params.extract_only_matching_key
        } else {
            self.directives.localize_outside()
        };

        // An empty value is still a unit so ids line up with the entries;
        // only a sub-filter has nothing to parse in it
        if !extract || (value.is_empty() && self.params.subfilter.is_some()) {
            self.skeleton.append(&raw);
            self.notes.clear();
            return Ok(());
        }

        let (lead, core_value, trail) =
            split_whitespace_edges(&value, self.params.trim_leading, self.params.trim_trailing);
        let mut prefix = Skeleton::new();
        std::mem::swap(&mut prefix, &mut self.skeleton);
        prefix.append(&line.content[..value_start]);
        prefix.append(lead);

        let content = self.unescape(core_value, &line);

        if let Some(config_id) = self.params.subfilter.clone() {
            return self.queue_subfilter(&config_id, &key, &content, prefix, trail, terminator);
        }

        let mut fragment = TextFragment::from_text(&content);
        if let Some(finder) = self.finder.as_mut() {
            finder.process(&mut fragment)?;
        }

        let id = if self.params.id_like_resname {
            key.clone()
        } else {
            self.core.tu_ids.create_id()
        };
        let mut tu = TextUnit::new(&id, fragment).with_name(&key);
        tu.mime_type = Some(MIME_TYPE.to_string());
        tu.preserve_whitespace = self.params.preserve_whitespace;
        let start = line.char_offset + line.content[..value_start].chars().count();
        tu.set_property(PROP_START, &start.to_string());
        if !self.notes.is_empty() {
            tu.note = Some(self.notes.join("\n"));
            self.notes.clear();
        }

        let mut skeleton = prefix;
        skeleton.add_content_placeholder(&id);
        skeleton.append(trail);
        skeleton.append(terminator);
        tu.skeleton = Some(skeleton);

        if let Some(policy) = self.params.simplifier.clone() {
            CodeSimplifier::new(policy).simplify_unit(&mut tu);
        }

        self.core.queue.push_back(Event::TextUnit(tu));
        Ok(())
    }

    fn queue_subfilter(
        &mut self,
        config_id: &str,
        key: &str,
        content: &str,
        prefix: Skeleton,
        trail: &str,
        terminator: &str,
    ) -> Result<()> {
        let mapper = self.mapper.as_ref().ok_or_else(|| {
            FilterError::InvalidState(format!(
                "sub-filter '{}' configured without a filter registry",
                config_id
            ))
        })?;
        let nested = mapper.create_filter(config_id)?;
        self.subfilter_count += 1;
        let mut subfilter = SubFilter::new(nested, key, key, self.subfilter_count);
        if let Some(finder) = &self.finder {
            subfilter = subfilter.with_code_finder(finder.clone());
        }

        let locale = self.core.info()?.source_locale.clone();
        let events = subfilter.process(content, &locale)?;
        self.core.queue.extend(events);
        self.notes.clear();

        let after = format!("{}{}", trail, terminator);
        let part = subfilter.reference_part(prefix, &after);
        self.core.queue.push_back(Event::DocumentPart(part));
        Ok(())
    }

    /// Decode `\uHHHH` and, when configured, `\n` and `\t`; other escapes
    /// stay as found
    fn unescape(&self, value: &str, line: &Line) -> String {
        if !value.contains('\\') {
            return value.to_string();
        }
        let chars: Vec<char> = value.chars().collect();
        let mut out = String::with_capacity(value.len());
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c != '\\' || i + 1 >= chars.len() {
                out.push(c);
                i += 1;
                continue;
            }
            let next = chars[i + 1];
            match next {
                'u' => match read_unicode_escape(&chars, i) {
                    // A decoded backslash would start a new escape on output
                    Some(('\\', consumed)) => {
                        out.extend(&chars[i..i + consumed]);
                        i += consumed;
                    }
                    Some((ch, consumed)) => {
                        out.push(ch);
                        i += consumed;
                    }
                    None => {
                        warn!("Line {}: invalid Unicode escape kept as found", line.number);
                        out.push_str("\\u");
                        i += 2;
                    }
                },
                'n' if self.params.convert_lf_and_tab => {
                    out.push('\n');
                    i += 2;
                }
                't' if self.params.convert_lf_and_tab => {
                    out.push('\t');
                    i += 2;
                }
                other => {
                    out.push('\\');
                    out.push(other);
                    i += 2;
                }
            }
        }
        out
    }
}

/// End of the key and start of the value in a line without indentation
fn split_entry(line: &str) -> (usize, usize) {
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ':' | '=' | ' ' | '\t' | '\u{c}' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let rest = &line[key_end..];
    let mut value_start = key_end + (rest.len() - rest.trim_start_matches([' ', '\t', '\u{c}']).len());
    if line[value_start..].starts_with([':', '=']) {
        value_start += 1;
        let rest = &line[value_start..];
        value_start += rest.len() - rest.trim_start_matches([' ', '\t', '\u{c}']).len();
    }
    (key_end, value_start)
}

fn ends_with_odd_backslashes(value: &str) -> bool {
    value.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

fn hex_unit(chars: &[char], start: usize) -> Option<u16> {
    if start + 4 > chars.len() {
        return None;
    }
    let hex = &chars[start..start + 4];
    if !hex.iter().all(char::is_ascii_hexdigit) {
        return None;
    }
    u16::from_str_radix(&hex.iter().collect::<String>(), 16).ok()
}

/// Decode `\uHHHH` (or a surrogate pair of them) at `i`; returns the char and
/// the number of chars consumed
fn read_unicode_escape(chars: &[char], i: usize) -> Option<(char, usize)> {
    let unit = hex_unit(chars, i + 2)?;
    if let Some(ch) = char::from_u32(unit as u32) {
        return Some((ch, 6));
    }
    // High surrogate: needs a following \uDCxx
    if chars.get(i + 6) == Some(&'\\') && chars.get(i + 7) == Some(&'u') {
        let low = hex_unit(chars, i + 8)?;
        let mut decoded = char::decode_utf16([unit, low]);
        if let Some(Ok(ch)) = decoded.next() {
            return Some((ch, 12));
        }
    }
    None
}

impl Filter for PropertiesFilter {
    fn name(&self) -> &str {
        FILTER_NAME
    }

    fn display_name(&self) -> &str {
        "Properties Filter"
    }

    fn mime_type(&self) -> &str {
        MIME_TYPE
    }

    fn configurations(&self) -> Vec<FilterConfiguration> {
        let base = FilterParameters::properties();
        vec![
            FilterConfiguration {
                config_id: FILTER_NAME.to_string(),
                filter_name: FILTER_NAME.to_string(),
                mime_type: MIME_TYPE.to_string(),
                name: "Java Properties".to_string(),
                description: "Java properties files (Output used \\uHHHH escapes)".to_string(),
                extensions: vec![".properties".to_string()],
                parameters: base.clone(),
            },
            FilterConfiguration {
                config_id: CONFIG_HTML_SUBFILTER.to_string(),
                filter_name: FILTER_NAME.to_string(),
                mime_type: MIME_TYPE.to_string(),
                name: "Java Properties with HTML".to_string(),
                description: "Java properties files with HTML content in the values".to_string(),
                extensions: Vec::new(),
                parameters: FilterParameters {
                    subfilter: Some(super::markup::FILTER_NAME.to_string()),
                    ..base
                },
            },
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
        EncoderKind::Properties {
            escape_extended: self.params.escape_extended_chars,
            convert_lf_and_tab: self.params.convert_lf_and_tab,
        }
    }

    fn open(&mut self, document: RawDocument) -> Result<()> {
        let text = self.core.open(&document)?;
        self.reader = LineReader::new(text);
        self.skeleton = Skeleton::new();
        self.notes.clear();
        self.subfilter_count = 0;
        self.directives = LocalizationDirectives::new(
            self.params.use_localization_directives,
            self.params.extract_outside_directives,
        );

        self.key_condition = if self.params.use_key_condition {
            let pattern = format!("^(?:{})$", self.params.key_condition);
            Some(Regex::new(&pattern).map_err(|e| FilterError::InvalidRule {
                rule: self.params.key_condition.clone(),
                message: e.to_string(),
            })?)
        } else {
            None
        };

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
            self.read_item()?;
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
        self.notes.clear();
    }
}
