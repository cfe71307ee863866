/*!
 * Minimal HTML fragment filter, mostly used on sub-filtered values.
 *
 * Inline tags become codes inside the text unit; block tags, comments and
 * `script`/`style` elements are skeleton and end the current unit. The
 * predefined entities and numeric character references are decoded; other
 * entities stay as placeholder codes.
 */

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::code_finder::InlineCodeFinder;
use crate::document::RawDocument;
use crate::encoder::EncoderKind;
use crate::errors::{FilterError, Result};
use crate::event::Event;
use crate::resource::code::{
    TYPE_BOLD, TYPE_IMAGE, TYPE_ITALIC, TYPE_LB, TYPE_LINK, TYPE_REFERENCE, TYPE_UNDERLINED,
};
use crate::resource::{CodeSimplifier, IdGenerator, TagType, TextFragment, TextUnit};
use crate::skeleton::Skeleton;

use super::core::FilterCore;
use super::{Filter, FilterConfiguration, FilterParameters, FilterState};

pub const FILTER_NAME: &str = "okf_html";
pub const MIME_TYPE: &str = "text/html";

const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "big", "br", "code", "em", "font", "i", "img", "kbd", "q", "s", "samp",
    "small", "span", "strike", "strong", "sub", "sup", "tt", "u", "var",
];
const EMPTY_TAGS: &[&str] = &["br", "img", "hr", "input", "meta", "link"];
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

static TAG_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^</?([A-Za-z][A-Za-z0-9]*)").expect("Invalid tag regex"));

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:&#[xX]([0-9A-Fa-f]+);|&#([0-9]+);|&(amp|lt|gt|quot|apos);|&[A-Za-z][A-Za-z0-9]*;)")
        .expect("Invalid entity regex")
});

fn code_type(tag: &str) -> String {
    match tag {
        "b" | "strong" => TYPE_BOLD.to_string(),
        "i" | "em" => TYPE_ITALIC.to_string(),
        "u" => TYPE_UNDERLINED.to_string(),
        "a" => TYPE_LINK.to_string(),
        "img" => TYPE_IMAGE.to_string(),
        "br" => TYPE_LB.to_string(),
        other => other.to_string(),
    }
}

/// Length of the tag at the start of `s`, quoted attribute values respected
fn tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i + 1),
            (None, '<') => return None,
            _ => {}
        }
    }
    None
}

pub struct MarkupFilter {
    core: FilterCore,
    params: FilterParameters,
    text: String,
    pos: usize,
    skeleton: Skeleton,
    /// Text unit being built and the raw text it came from
    run: TextFragment,
    run_raw: String,
    finder: Option<InlineCodeFinder>,
}

impl Default for MarkupFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupFilter {
    pub fn new() -> Self {
        let mut core = FilterCore::new(FILTER_NAME);
        core.tu_ids = IdGenerator::new("tu");
        Self {
            core,
            params: FilterParameters::default(),
            text: String::new(),
            pos: 0,
            skeleton: Skeleton::new(),
            run: TextFragment::new(),
            run_raw: String::new(),
            finder: None,
        }
    }

    pub fn create() -> Box<dyn Filter> {
        Box::new(Self::new())
    }

    /// End the current run: a text unit when it holds text, skeleton
    /// otherwise
    fn flush_run(&mut self) -> Result<()> {
        let mut fragment = std::mem::take(&mut self.run);
        let raw = std::mem::take(&mut self.run_raw);
        if !fragment.has_text() {
            self.skeleton.append(&raw);
            return Ok(());
        }
        if let Some(finder) = self.finder.as_mut() {
            finder.process(&mut fragment)?;
        }

        let id = self.core.tu_ids.create_id();
        let mut tu = TextUnit::new(&id, fragment);
        tu.mime_type = Some(MIME_TYPE.to_string());
        tu.preserve_whitespace = self.params.preserve_whitespace;
        let mut skeleton = std::mem::take(&mut self.skeleton);
        skeleton.add_content_placeholder(&id);
        tu.skeleton = Some(skeleton);
        if let Some(policy) = self.params.simplifier.clone() {
            CodeSimplifier::new(policy).simplify_unit(&mut tu);
        }
        trace!("Text unit {}: '{}'", id, tu.source_fragment().text());
        self.core.queue.push_back(Event::TextUnit(tu));
        Ok(())
    }

    /// Skeleton that also ends the current run
    fn structural(&mut self, raw_len: usize) -> Result<()> {
        self.flush_run()?;
        let end = self.pos + raw_len;
        self.skeleton.append(&self.text[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    fn read_token(&mut self) -> Result<()> {
        let rest = &self.text[self.pos..];

        if rest.starts_with("<!--") {
            let len = rest[4..].find("-->").map_or(rest.len(), |i| i + 7);
            return self.structural(len);
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            let len = tag_end(rest).unwrap_or(rest.len());
            return self.structural(len);
        }

        if rest.starts_with('<') {
            if let (Some(caps), Some(len)) = (TAG_NAME.captures(rest), tag_end(rest)) {
                let name = caps[1].to_ascii_lowercase();
                let tag = &rest[..len];
                let closing = tag.starts_with("</");

                if RAW_TEXT_TAGS.contains(&name.as_str()) && !closing {
                    let close = format!("</{}", name);
                    let body_end = rest[len..]
                        .to_ascii_lowercase()
                        .find(&close)
                        .map(|i| len + i)
                        .unwrap_or(rest.len());
                    return self.structural(body_end);
                }

                if INLINE_TAGS.contains(&name.as_str()) {
                    let tag_type = if closing {
                        TagType::Closing
                    } else if tag.ends_with("/>") || EMPTY_TAGS.contains(&name.as_str()) {
                        TagType::Placeholder
                    } else {
                        TagType::Opening
                    };
                    let tag = tag.to_string();
                    self.run.append_code(tag_type, &code_type(&name), &tag);
                    self.run_raw.push_str(&tag);
                    self.pos += len;
                    return Ok(());
                }
                return self.structural(len);
            }
        }

        if rest.starts_with('&') {
            if let Some(caps) = ENTITY.captures(rest) {
                let whole = caps.get(0).map_or("", |m| m.as_str()).to_string();
                let decoded = if let Some(hex) = caps.get(1) {
                    u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32)
                } else if let Some(dec) = caps.get(2) {
                    dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
                } else {
                    match caps.get(3).map(|m| m.as_str()) {
                        Some("amp") => Some('&'),
                        Some("lt") => Some('<'),
                        Some("gt") => Some('>'),
                        Some("quot") => Some('"'),
                        Some("apos") => Some('\''),
                        _ => None,
                    }
                };
                match decoded {
                    Some(ch) => self.run.append_char(ch),
                    None => {
                        self.run.append_code(TagType::Placeholder, TYPE_REFERENCE, &whole);
                    }
                }
                self.run_raw.push_str(&whole);
                self.pos += whole.len();
                return Ok(());
            }
        }

        // Plain text up to the next markup character
        let len = rest
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '<' || c == '&')
            .map_or(rest.len(), |(i, _)| i);
        let chunk = rest[..len].to_string();
        self.run.append_text(&chunk);
        self.run_raw.push_str(&chunk);
        self.pos += len;
        Ok(())
    }
}

impl Filter for MarkupFilter {
    fn name(&self) -> &str {
        FILTER_NAME
    }

    fn display_name(&self) -> &str {
        "HTML Fragment Filter"
    }

    fn mime_type(&self) -> &str {
        MIME_TYPE
    }

    fn configurations(&self) -> Vec<FilterConfiguration> {
        vec![FilterConfiguration {
            config_id: FILTER_NAME.to_string(),
            filter_name: FILTER_NAME.to_string(),
            mime_type: MIME_TYPE.to_string(),
            name: "HTML fragments".to_string(),
            description: "HTML snippets: inline tags as codes, block tags as structure".to_string(),
            extensions: vec![".html".to_string(), ".htm".to_string()],
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
        EncoderKind::Markup
    }

    fn open(&mut self, document: RawDocument) -> Result<()> {
        self.text = self.core.open(&document)?;
        self.pos = 0;
        self.skeleton = Skeleton::new();
        self.run = TextFragment::new();
        self.run_raw.clear();
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
                .start_document(MIME_TYPE, EncoderKind::Markup, false, Skeleton::new());
        }
        while self.core.queue.is_empty() {
            if self.pos >= self.text.len() {
                self.flush_run()?;
                if !self.core.queue.is_empty() {
                    break;
                }
                let skeleton = std::mem::take(&mut self.skeleton);
                return Ok(self.core.end_document(skeleton));
            }
            self.read_token()?;
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
        self.run = TextFragment::new();
        self.run_raw.clear();
    }
}
