/*!
 * DTD filter: general entity values are the translatable content.
 *
 * Everything else in the DTD (parameter and external entities, element and
 * attribute-list declarations, processing instructions, whitespace) is
 * skeleton. Comments are also attached to the next entity as a note.
 */

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::code_finder::InlineCodeFinder;
use crate::document::RawDocument;
use crate::encoder::EncoderKind;
use crate::errors::{FilterError, Result};
use crate::event::Event;
use crate::resource::code::TYPE_REFERENCE;
use crate::resource::{CodeSimplifier, TagType, TextFragment, TextUnit};
use crate::skeleton::Skeleton;

use super::core::FilterCore;
use super::{Filter, FilterConfiguration, FilterParameters, FilterState};

pub const FILTER_NAME: &str = "okf_dtd";
pub const MIME_TYPE: &str = "application/xml-dtd";

/// Start of a general entity with a literal value, up to the opening quote
static ENTITY_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^<!ENTITY\s+([^\s%"'>]+)\s+(["'])"#).expect("Invalid entity regex")
});

/// References inside an entity value
static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&#[xX]([0-9A-Fa-f]+);|&#([0-9]+);|&(amp|lt|gt);|[&%][A-Za-z_:][\w.:-]*;")
        .expect("Invalid reference regex")
});

pub struct DtdFilter {
    core: FilterCore,
    params: FilterParameters,
    text: String,
    pos: usize,
    skeleton: Skeleton,
    notes: Vec<String>,
    finder: Option<InlineCodeFinder>,
}

impl Default for DtdFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl DtdFilter {
    pub fn new() -> Self {
        Self {
            core: FilterCore::new(FILTER_NAME),
            params: FilterParameters::default(),
            text: String::new(),
            pos: 0,
            skeleton: Skeleton::new(),
            notes: Vec::new(),
            finder: None,
        }
    }

    pub fn create() -> Box<dyn Filter> {
        Box::new(Self::new())
    }

    /// 1-based line of a byte offset
    fn line_at(&self, offset: usize) -> usize {
        let before = &self.text[..offset];
        before.matches('\n').count() + before.matches('\r').count()
            - before.matches("\r\n").count()
            + 1
    }

    fn unterminated(&self, what: &str) -> FilterError {
        FilterError::grammar(self.line_at(self.pos), format!("unterminated {}", what))
    }

    /// Consume `len` bytes into the pending skeleton
    fn skip(&mut self, len: usize) {
        let end = self.pos + len;
        self.skeleton.append(&self.text[self.pos..end]);
        self.pos = end;
    }

    fn read_item(&mut self) -> Result<()> {
        let rest = &self.text[self.pos..];
        if rest.starts_with("<!--") {
            let end = rest[4..].find("-->").ok_or_else(|| self.unterminated("comment"))? + 7;
            let note = rest[4..end - 3].trim().to_string();
            if !note.is_empty() {
                self.notes.push(note);
            }
            self.skip(end);
        } else if rest.starts_with("<?") {
            let end = rest.find("?>").ok_or_else(|| self.unterminated("processing instruction"))?;
            self.skip(end + 2);
        } else if rest.starts_with("<![") {
            let end = rest.find("]]>").ok_or_else(|| self.unterminated("conditional section"))?;
            self.skip(end + 3);
        } else if rest.starts_with("<!") {
            let end = declaration_end(rest).ok_or_else(|| self.unterminated("declaration"))?;
            if rest.starts_with("<!ENTITY") {
                self.read_entity(end)?;
            } else {
                self.skip(end);
            }
        } else {
            let end = rest
                .char_indices()
                .skip(1)
                .find(|&(_, c)| c == '<')
                .map_or(rest.len(), |(i, _)| i);
            self.skip(end);
        }
        Ok(())
    }

    /// Entity declaration of `len` bytes at the cursor
    fn read_entity(&mut self, len: usize) -> Result<()> {
        let decl = self.text[self.pos..self.pos + len].to_string();
        let Some(caps) = ENTITY_HEAD.captures(&decl) else {
            // Parameter or external entity
            self.notes.clear();
            self.skip(len);
            return Ok(());
        };
        let name = caps[1].to_string();
        let quote = &caps[2];
        let value_start = caps.get(0).map_or(0, |m| m.end());
        let value_end = decl[value_start..]
            .find(quote)
            .map(|i| i + value_start)
            .ok_or_else(|| self.unterminated("entity value"))?;
        let value = &decl[value_start..value_end];
        trace!("Line {}: entity '{}'", self.line_at(self.pos), name);

        let mut fragment = decode_value(value);
        if let Some(finder) = self.finder.as_mut() {
            finder.process(&mut fragment)?;
        }
        if !fragment.has_text() {
            self.notes.clear();
            self.skip(len);
            return Ok(());
        }

        let id = self.core.tu_ids.create_id();
        let mut tu = TextUnit::new(&id, fragment).with_name(&name);
        tu.mime_type = Some(MIME_TYPE.to_string());
        tu.preserve_whitespace = self.params.preserve_whitespace;
        if !self.notes.is_empty() {
            tu.note = Some(self.notes.join("\n"));
            self.notes.clear();
        }

        let mut skeleton = std::mem::take(&mut self.skeleton);
        skeleton.append(&decl[..value_start]);
        skeleton.add_content_placeholder(&id);
        skeleton.append(&decl[value_end..]);
        tu.skeleton = Some(skeleton);
        if let Some(policy) = self.params.simplifier.clone() {
            CodeSimplifier::new(policy).simplify_unit(&mut tu);
        }

        self.pos += len;
        self.core.queue.push_back(Event::TextUnit(tu));
        Ok(())
    }
}

/// Length of the `<!...>` declaration at the start of `s`, quotes respected
fn declaration_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(2) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i + 1),
            _ => {}
        }
    }
    None
}

/// Decode character references and `&amp;`/`&lt;`/`&gt;`; other references
/// become placeholder codes, and so does any reference to a quote character
/// (`&quot;`, `&#34;`, `&#x27;`...) since the value delimiter must survive
fn decode_value(value: &str) -> TextFragment {
    let mut fragment = TextFragment::new();
    let mut last = 0;
    for caps in REFERENCE.captures_iter(value) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        fragment.append_text(&value[last..whole.start()]);
        last = whole.end();

        let decoded = if let Some(hex) = caps.get(1) {
            u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
        } else if let Some(dec) = caps.get(2) {
            dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
        } else {
            match caps.get(3).map(|m| m.as_str()) {
                Some("amp") => Some('&'),
                Some("lt") => Some('<'),
                Some("gt") => Some('>'),
                _ => None,
            }
        };
        match decoded.filter(|ch| !matches!(ch, '"' | '\'')) {
            Some(ch) => fragment.append_char(ch),
            None => {
                fragment.append_code(TagType::Placeholder, TYPE_REFERENCE, whole.as_str());
            }
        }
    }
    fragment.append_text(&value[last..]);
    fragment
}

impl Filter for DtdFilter {
    fn name(&self) -> &str {
        FILTER_NAME
    }

    fn display_name(&self) -> &str {
        "DTD Filter"
    }

    fn mime_type(&self) -> &str {
        MIME_TYPE
    }

    fn configurations(&self) -> Vec<FilterConfiguration> {
        vec![FilterConfiguration {
            config_id: FILTER_NAME.to_string(),
            filter_name: FILTER_NAME.to_string(),
            mime_type: MIME_TYPE.to_string(),
            name: "DTD".to_string(),
            description: "Entity values of Document Type Definition files".to_string(),
            extensions: vec![".dtd".to_string()],
            parameters: FilterParameters::default(),
        }]
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

    fn encoder_kind(&self) -> EncoderKind {
        EncoderKind::Dtd
    }

    fn open(&mut self, document: RawDocument) -> Result<()> {
        self.text = self.core.open(&document)?;
        self.pos = 0;
        self.skeleton = Skeleton::new();
        self.notes.clear();
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
            return self
                .core
                .start_document(MIME_TYPE, EncoderKind::Dtd, false, Skeleton::new());
        }
        while self.core.queue.is_empty() {
            if self.pos >= self.text.len() {
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
        self.text.clear();
        self.pos = 0;
        self.skeleton = Skeleton::new();
        self.notes.clear();
    }
}
