/*!
 * TransTable filter: a tab-separated bilingual table.
 *
 * ```text
 * TransTableV1<TAB>en<TAB>fr
 * "okpCtx:tu=1"<TAB>"source"<TAB>"target"
 * "okpCtx:tu=2:s=0"<TAB>"first <g1>segment</g1>"
 * ```
 *
 * Consecutive rows with the same `tu=` crumb are the segments of one text
 * unit. Source and target cells are letter-coded; `\t` and `\n` are the only
 * escapes. Each row keeps its crumb, quotes and line break in the skeleton so
 * an unedited table is written back unchanged.
 */

use log::{trace, warn};

use crate::document::RawDocument;
use crate::encoder::EncoderKind;
use crate::errors::{FilterError, Result};
use crate::event::Event;
use crate::locale::LocaleId;
use crate::resource::container::DEFAULT_SEGMENT_ID;
use crate::resource::letter_coded::from_letter_coded;
use crate::resource::{TextContainer, TextFragment, TextUnit};
use crate::skeleton::Skeleton;

use super::core::FilterCore;
use super::lines::{Line, LineReader};
use super::{Filter, FilterConfiguration, FilterParameters, FilterState};

pub const FILTER_NAME: &str = "okf_transtable";
pub const MIME_TYPE: &str = "text/x-transtable";
pub const SIGNATURE: &str = "TransTableV1";
pub const CRUMBS_PREFIX: &str = "okpCtx";
pub const TEXTUNIT_CRUMB: &str = "tu=";
pub const SEGMENT_CRUMB: &str = "s=";

pub struct TransTableFilter {
    core: FilterCore,
    params: FilterParameters,
    reader: LineReader,
    skeleton: Skeleton,
    target_locale: Option<LocaleId>,
    current: Option<TextUnit>,
}

impl Default for TransTableFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Cell without its quotes, with `\t` and `\n` decoded
fn unescape(cell: &str) -> String {
    let (_, inner, _) = split_quotes(cell);
    inner.replace("\\t", "\t").replace("\\n", "\n")
}

/// Opening quote, content, closing quote
fn split_quotes(cell: &str) -> (&str, &str, &str) {
    let open = if cell.starts_with('"') { 1 } else { 0 };
    let rest = &cell[open..];
    let close = if rest.ends_with('"') { 1 } else { 0 };
    (&cell[..open], &rest[..rest.len() - close], &rest[rest.len() - close..])
}

/// Text unit id and optional segment id from a crumb cell
fn parse_crumbs(text: &str, line: usize) -> Result<(String, Option<String>)> {
    let bad = || FilterError::grammar(line, format!("Error in ID pattern ('{}')", text));
    if !text.starts_with(CRUMBS_PREFIX) {
        return Err(bad());
    }
    let start = text.find(TEXTUNIT_CRUMB).ok_or_else(bad)?;
    let rest = text[start + TEXTUNIT_CRUMB.len()..].trim();
    if rest.is_empty() {
        return Err(bad());
    }
    match rest.split_once(':') {
        None => Ok((rest.to_string(), None)),
        Some((id, segment)) => {
            let segment = segment.strip_prefix(SEGMENT_CRUMB).ok_or_else(bad)?;
            Ok((id.to_string(), Some(segment.to_string())))
        }
    }
}

impl TransTableFilter {
    pub fn new() -> Self {
        Self {
            core: FilterCore::new(FILTER_NAME),
            params: FilterParameters::default(),
            reader: LineReader::default(),
            skeleton: Skeleton::new(),
            target_locale: None,
            current: None,
        }
    }

    pub fn create() -> Box<dyn Filter> {
        Box::new(Self::new())
    }

    /// Check the header line and settle the locales
    fn read_header(&mut self) -> Result<Line> {
        let line = self
            .reader
            .next_line()
            .filter(|l| !l.content.is_empty())
            .ok_or_else(|| FilterError::grammar(1, "Empty header line"))?;
        let fields: Vec<&str> = line.content.split('\t').collect();
        if fields.len() != 3 {
            return Err(FilterError::grammar(1, "Unexpected header"));
        }
        if !unescape(fields[0]).starts_with(SIGNATURE) {
            return Err(FilterError::grammar(
                1,
                "Invalid signature. This may not be a TransTable file",
            ));
        }

        let info = self.core.info()?.clone();
        let declared_source = unescape(fields[1]);
        match LocaleId::parse(&declared_source) {
            Ok(source) if source == info.source_locale => {}
            _ => warn!(
                "The source locale declared in the file ('{}') is not the expected one ('{}'); {} will be used",
                declared_source, info.source_locale, info.source_locale
            ),
        }

        let declared_target = unescape(fields[2]);
        let declared = LocaleId::parse(&declared_target).ok();
        self.target_locale = match (&info.target_locale, declared) {
            (Some(expected), Some(found)) if *expected == found => Some(found),
            (Some(expected), _) => {
                warn!(
                    "The target locale declared in the file ('{}') is not the expected one ('{}'); {} will be used",
                    declared_target, expected, expected
                );
                Some(expected.clone())
            }
            (None, found) => found,
        };
        Ok(line)
    }

    /// Read rows until a text unit is complete or the table ends
    fn read_rows(&mut self) -> Result<()> {
        while let Some(line) = self.reader.next_line() {
            if line.content.trim().is_empty() {
                self.skeleton.append(&line.raw());
                continue;
            }
            let fields: Vec<&str> = line.content.split('\t').collect();
            if fields.len() < 2 {
                return Err(FilterError::grammar(
                    line.number,
                    format!("Not enough fields in line {}", line.number),
                ));
            }
            let (tu_id, segment) = parse_crumbs(&unescape(fields[0]), line.number)?;
            let segment = segment.unwrap_or_else(|| DEFAULT_SEGMENT_ID.to_string());
            trace!("Line {}: tu={} s={}", line.number, tu_id, segment);

            // A new id closes the unit being built; the row's skeleton is
            // only started after that so it lands in the new unit
            if self.current.as_ref().is_some_and(|tu| tu.id != tu_id) {
                self.flush_unit();
            }
            self.add_row(&line, &fields, &tu_id, &segment)?;
            if !self.core.queue.is_empty() {
                return Ok(());
            }
        }
        self.flush_unit();
        Ok(())
    }

    fn add_row(&mut self, line: &Line, fields: &[&str], tu_id: &str, segment: &str) -> Result<()> {
        let source_locale = self.core.info()?.source_locale.clone();
        let tu = self.current.get_or_insert_with(|| {
            let mut tu = TextUnit::new(tu_id, TextFragment::new());
            tu.source = TextContainer::empty();
            tu.mime_type = Some(MIME_TYPE.to_string());
            tu
        });
        // Each row of a unit must fill its own segment
        if tu.source.segment(segment).is_some() {
            return Err(FilterError::grammar(
                line.number,
                format!(
                    "Segment '{}' of text unit '{}' is repeated in line {}; the table is out of sync",
                    segment, tu_id, line.number
                ),
            ));
        }

        let source = from_letter_coded(&unescape(fields[1]));
        tu.source.append_segment(segment, source.clone());

        self.skeleton.append(fields[0]);
        self.skeleton.append("\t");
        let (open, _, close) = split_quotes(fields[1]);
        self.skeleton.append(open);
        self.skeleton.add_segment_placeholder_for(tu_id, segment, &source_locale);
        self.skeleton.append(close);

        if fields.len() > 2 {
            let target_locale = self.target_locale.clone().ok_or_else(|| {
                FilterError::grammar(line.number, "Target cell without a target locale")
            })?;
            let mut target = from_letter_coded(&unescape(fields[2]));
            target.align_code_ids(&source);
            tu.targets
                .entry(target_locale.clone())
                .or_insert_with(TextContainer::empty)
                .append_segment(segment, target);

            let (open, _, close) = split_quotes(fields[2]);
            self.skeleton.append("\t");
            self.skeleton.append(open);
            self.skeleton.add_segment_placeholder_for(tu_id, segment, &target_locale);
            self.skeleton.append(close);
        }
        // Extra cells are kept as found
        for extra in fields.iter().skip(3) {
            self.skeleton.append("\t");
            self.skeleton.append(extra);
        }
        self.skeleton.append(line.terminator);
        Ok(())
    }

    /// Queue the unit being built with the skeleton gathered so far
    fn flush_unit(&mut self) {
        if let Some(mut tu) = self.current.take() {
            tu.skeleton = Some(std::mem::take(&mut self.skeleton));
            self.core.queue.push_back(Event::TextUnit(tu));
        }
    }
}

impl Filter for TransTableFilter {
    fn name(&self) -> &str {
        FILTER_NAME
    }

    fn display_name(&self) -> &str {
        "TransTable Filter"
    }

    fn mime_type(&self) -> &str {
        MIME_TYPE
    }

    fn configurations(&self) -> Vec<FilterConfiguration> {
        vec![FilterConfiguration {
            config_id: FILTER_NAME.to_string(),
            filter_name: FILTER_NAME.to_string(),
            mime_type: MIME_TYPE.to_string(),
            name: "Translation Table Default".to_string(),
            description: "Default TransTable configuration.".to_string(),
            extensions: vec![".tbl".to_string(), ".transtable".to_string()],
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
        EncoderKind::TransTable
    }

    fn open(&mut self, document: RawDocument) -> Result<()> {
        let text = self.core.open(&document)?;
        self.reader = LineReader::new(text);
        self.skeleton = Skeleton::new();
        self.current = None;
        self.target_locale = None;
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
            let header = self.read_header()?;
            return self.core.start_document(
                MIME_TYPE,
                EncoderKind::TransTable,
                true,
                Skeleton::from_text(&header.raw()),
            );
        }
        if self.core.queue.is_empty() {
            self.read_rows()?;
        }
        match self.core.queue.pop_front() {
            Some(event) => Ok(event),
            None => {
                let skeleton = std::mem::take(&mut self.skeleton);
                Ok(self.core.end_document(skeleton))
            }
        }
    }

    fn cancel(&mut self) {
        self.core.cancel();
    }

    fn close(&mut self) {
        self.core.close();
        self.reader = LineReader::default();
        self.skeleton = Skeleton::new();
        self.current = None;
    }
}
