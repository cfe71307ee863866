use log::debug;
use std::collections::VecDeque;

use crate::document::RawDocument;
use crate::encoder::EncoderKind;
use crate::encoding::{BomNewlineEncodingDetector, NewlineType};
use crate::errors::{FilterError, Result};
use crate::event::Event;
use crate::locale::LocaleId;
use crate::resource::{Ending, IdGenerator, StartDocument};
use crate::skeleton::Skeleton;

use super::FilterState;

/// What a filter learned about the document at `open()`
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub name: Option<String>,
    pub source_locale: LocaleId,
    pub target_locale: Option<LocaleId>,
    pub encoding: String,
    pub has_bom: bool,
    pub has_utf8_bom: bool,
    pub line_break: NewlineType,
}

/// State shared by every filter: the pull-protocol bookkeeping, the event
/// queue and the id generators
#[derive(Debug)]
pub struct FilterCore {
    pub config_id: String,
    pub state: FilterState,
    pub queue: VecDeque<Event>,
    pub tu_ids: IdGenerator,
    pub other_ids: IdGenerator,
    pub info: Option<DocumentInfo>,
    canceled: bool,
}

impl FilterCore {
    pub fn new(config_id: &str) -> Self {
        Self {
            config_id: config_id.to_string(),
            state: FilterState::Closed,
            queue: VecDeque::new(),
            tu_ids: IdGenerator::new(""),
            other_ids: IdGenerator::new("o"),
            info: None,
            canceled: false,
        }
    }

    /// Detect encoding, BOM and newline, decode, and reset per-document state.
    /// Returns the decoded text without its BOM.
    pub fn open(&mut self, document: &RawDocument) -> Result<String> {
        if self.state != FilterState::Closed {
            self.close();
        }
        let detector = BomNewlineEncodingDetector::new(document.bytes(), &document.encoding);
        let (detection, text) = detector.detect_and_decode()?;

        self.queue.clear();
        self.tu_ids.reset();
        self.other_ids.reset();
        self.canceled = false;
        self.info = Some(DocumentInfo {
            name: document.name(),
            source_locale: document.source_locale.clone(),
            target_locale: document.target_locale.clone(),
            encoding: detection.charset.name().to_string(),
            has_bom: detection.has_bom,
            has_utf8_bom: detection.has_utf8_bom,
            line_break: detection.newline,
        });
        self.state = FilterState::Start;
        debug!(
            "Opened {} with {} ({} chars)",
            document.name().unwrap_or_else(|| "<memory>".to_string()),
            self.config_id,
            text.chars().count()
        );
        Ok(text)
    }

    pub fn info(&self) -> Result<&DocumentInfo> {
        self.info
            .as_ref()
            .ok_or_else(|| FilterError::InvalidState("no open document".to_string()))
    }

    pub fn source_locale(&self) -> Option<&LocaleId> {
        self.info.as_ref().map(|i| &i.source_locale)
    }

    /// START_DOCUMENT for the open document; moves to BODY
    pub fn start_document(
        &mut self,
        mime_type: &str,
        encoder: EncoderKind,
        is_multilingual: bool,
        skeleton: Skeleton,
    ) -> Result<Event> {
        let info = self.info()?.clone();
        self.state = FilterState::Body;
        Ok(Event::StartDocument(StartDocument {
            id: self.other_ids.create_id(),
            name: info.name,
            locale: info.source_locale,
            encoding: info.encoding,
            has_bom: info.has_bom,
            has_utf8_bom: info.has_utf8_bom,
            line_break: info.line_break,
            mime_type: mime_type.to_string(),
            is_multilingual,
            filter_id: self.config_id.clone(),
            encoder,
            skeleton: if skeleton.is_empty() { None } else { Some(skeleton) },
        }))
    }

    /// END_DOCUMENT carrying the pending skeleton; moves to END
    pub fn end_document(&mut self, skeleton: Skeleton) -> Event {
        self.state = FilterState::End;
        debug!("End of document ({} text unit(s))", self.tu_ids.count());
        Event::EndDocument(Ending::with_skeleton(&self.other_ids.create_id(), skeleton))
    }

    /// Common head of `next()`: cancellation, protocol checks and queued
    /// events. `None` means the filter must produce a new event.
    pub fn poll(&mut self) -> Result<Option<Event>> {
        if self.canceled {
            self.canceled = false;
            self.queue.clear();
            self.state = FilterState::Closed;
            debug!("Filter {} canceled", self.config_id);
            return Ok(Some(Event::Canceled));
        }
        match self.state {
            FilterState::Closed => {
                return Err(FilterError::InvalidState(
                    "next() called on a closed filter".to_string(),
                ));
            }
            FilterState::End if self.queue.is_empty() => {
                return Err(FilterError::InvalidState(
                    "next() called after END_DOCUMENT".to_string(),
                ));
            }
            _ => {}
        }
        Ok(self.queue.pop_front())
    }

    pub fn has_next(&self) -> bool {
        self.canceled
            || !self.queue.is_empty()
            || matches!(self.state, FilterState::Start | FilterState::Body)
    }

    pub fn cancel(&mut self) {
        self.canceled = true;
    }

    pub fn close(&mut self) {
        if self.state != FilterState::Closed {
            debug!("Closing filter {}", self.config_id);
        }
        self.state = FilterState::Closed;
        self.queue.clear();
        self.canceled = false;
        self.info = None;
    }
}

/// Split `value` into leading whitespace, core and trailing whitespace,
/// each edge only when its flag is set
pub fn split_whitespace_edges(value: &str, leading: bool, trailing: bool) -> (&str, &str, &str) {
    let start = if leading {
        value.len() - value.trim_start().len()
    } else {
        0
    };
    let end = if trailing {
        start + value[start..].trim_end().len()
    } else {
        value.len()
    };
    (&value[..start], &value[start..end], &value[end..])
}
