/*!
 * Events produced by filters and consumed by writers.
 *
 * A document is a well-nested event sequence: START_DOCUMENT first,
 * END_DOCUMENT last (or a single CANCELED), groups, sub-documents and
 * subfilters closed in order. `NestingValidator` checks this incrementally.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{FilterError, Result};
use crate::resource::{
    DocumentPart, Ending, StartDocument, StartGroup, StartSubfilter, TextUnit,
};

/// Event tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    StartDocument,
    StartSubDocument,
    StartGroup,
    TextUnit,
    DocumentPart,
    EndGroup,
    EndSubDocument,
    EndDocument,
    Canceled,
    StartSubfilter,
    EndSubfilter,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StartDocument => "START_DOCUMENT",
            Self::StartSubDocument => "START_SUBDOCUMENT",
            Self::StartGroup => "START_GROUP",
            Self::TextUnit => "TEXT_UNIT",
            Self::DocumentPart => "DOCUMENT_PART",
            Self::EndGroup => "END_GROUP",
            Self::EndSubDocument => "END_SUBDOCUMENT",
            Self::EndDocument => "END_DOCUMENT",
            Self::Canceled => "CANCELED",
            Self::StartSubfilter => "START_SUBFILTER",
            Self::EndSubfilter => "END_SUBFILTER",
        };
        write!(f, "{}", name)
    }
}

/// One event with its resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "resource", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    StartDocument(StartDocument),
    StartSubDocument(StartGroup),
    StartGroup(StartGroup),
    TextUnit(TextUnit),
    DocumentPart(DocumentPart),
    EndGroup(Ending),
    EndSubDocument(Ending),
    EndDocument(Ending),
    Canceled,
    StartSubfilter(StartSubfilter),
    EndSubfilter(Ending),
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::StartDocument(_) => EventType::StartDocument,
            Self::StartSubDocument(_) => EventType::StartSubDocument,
            Self::StartGroup(_) => EventType::StartGroup,
            Self::TextUnit(_) => EventType::TextUnit,
            Self::DocumentPart(_) => EventType::DocumentPart,
            Self::EndGroup(_) => EventType::EndGroup,
            Self::EndSubDocument(_) => EventType::EndSubDocument,
            Self::EndDocument(_) => EventType::EndDocument,
            Self::Canceled => EventType::Canceled,
            Self::StartSubfilter(_) => EventType::StartSubfilter,
            Self::EndSubfilter(_) => EventType::EndSubfilter,
        }
    }

    /// Id of the event's resource
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Self::StartDocument(r) => Some(&r.id),
            Self::StartSubDocument(r) | Self::StartGroup(r) => Some(&r.id),
            Self::TextUnit(r) => Some(&r.id),
            Self::DocumentPart(r) => Some(&r.id),
            Self::EndGroup(r) | Self::EndSubDocument(r) | Self::EndDocument(r) | Self::EndSubfilter(r) => {
                Some(&r.id)
            }
            Self::StartSubfilter(r) => Some(&r.id),
            Self::Canceled => None,
        }
    }

    pub fn text_unit(&self) -> Option<&TextUnit> {
        match self {
            Self::TextUnit(tu) => Some(tu),
            _ => None,
        }
    }

    pub fn text_unit_mut(&mut self) -> Option<&mut TextUnit> {
        match self {
            Self::TextUnit(tu) => Some(tu),
            _ => None,
        }
    }

    pub fn is_text_unit(&self) -> bool {
        matches!(self, Self::TextUnit(_))
    }

    /// Events that end an event sequence
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::EndDocument(_) | Self::Canceled)
    }
}

/// Checks that an event sequence is well nested
#[derive(Debug, Default)]
pub struct NestingValidator {
    stack: Vec<EventType>,
    started: bool,
    finished: bool,
    count: usize,
}

impl NestingValidator {
    pub fn new() -> Self {
        Self::default()
    }

    fn mismatch(&self, message: String) -> FilterError {
        FilterError::StructuralMismatch(format!("event #{}: {}", self.count, message))
    }

    fn close(&mut self, opening: EventType, closing: EventType) -> Result<()> {
        match self.stack.pop() {
            Some(open) if open == opening => Ok(()),
            Some(open) => Err(self.mismatch(format!("{} closes {}", closing, open))),
            None => Err(self.mismatch(format!("{} without {}", closing, opening))),
        }
    }

    /// Feed the next event
    pub fn check(&mut self, event: &Event) -> Result<()> {
        self.count += 1;
        let kind = event.event_type();
        if self.finished {
            return Err(self.mismatch(format!("{} after the end of the document", kind)));
        }
        if kind == EventType::Canceled {
            self.finished = true;
            return Ok(());
        }
        if !self.started {
            if kind != EventType::StartDocument {
                return Err(self.mismatch(format!("{} before START_DOCUMENT", kind)));
            }
            self.started = true;
            self.stack.push(kind);
            return Ok(());
        }

        match kind {
            EventType::StartDocument => {
                Err(self.mismatch("second START_DOCUMENT".to_string()))
            }
            EventType::StartSubDocument | EventType::StartGroup | EventType::StartSubfilter => {
                self.stack.push(kind);
                Ok(())
            }
            EventType::EndGroup => self.close(EventType::StartGroup, kind),
            EventType::EndSubDocument => self.close(EventType::StartSubDocument, kind),
            EventType::EndSubfilter => self.close(EventType::StartSubfilter, kind),
            EventType::EndDocument => {
                self.close(EventType::StartDocument, kind)?;
                self.finished = true;
                Ok(())
            }
            EventType::TextUnit | EventType::DocumentPart | EventType::Canceled => Ok(()),
        }
    }

    /// Check that the sequence ended properly
    pub fn finish(&self) -> Result<()> {
        if self.finished {
            Ok(())
        } else {
            Err(self.mismatch(format!(
                "sequence ended with {} unclosed event(s)",
                self.stack.len().max(1)
            )))
        }
    }

    /// Validate a complete sequence
    pub fn validate(events: &[Event]) -> Result<()> {
        let mut validator = Self::new();
        for event in events {
            validator.check(event)?;
        }
        validator.finish()
    }
}
