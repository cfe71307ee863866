/*!
 * Runs a nested filter over one extracted value.
 *
 * The nested document's START_DOCUMENT/END_DOCUMENT become
 * START_SUBFILTER/END_SUBFILTER and every id it produced is re-homed under
 * the parent resource, so ids stay unique in the parent's event stream:
 * - START_SUBFILTER: `{parent}_ssf{n}`, named `sub-filter:{parent name}`
 * - END_SUBFILTER: `{parent}_esf{n}`
 * - everything else: `{parent}_sf{n}_{nested id}`
 *
 * The parent then emits a DOCUMENT_PART whose skeleton references the
 * START_SUBFILTER id; the writer resolves it to the nested output.
 */

use log::debug;

use crate::code_finder::InlineCodeFinder;
use crate::document::RawDocument;
use crate::errors::{FilterError, Result};
use crate::event::Event;
use crate::locale::LocaleId;
use crate::resource::{DocumentPart, Ending, StartSubfilter};
use crate::skeleton::Skeleton;

use super::{Filter, extract_all};

pub struct SubFilter {
    filter: Box<dyn Filter>,
    parent_id: String,
    parent_name: String,
    index: usize,
    code_finder: Option<InlineCodeFinder>,
}

impl SubFilter {
    /// `index` is the 1-based count of sub-filtered values in the parent
    pub fn new(filter: Box<dyn Filter>, parent_id: &str, parent_name: &str, index: usize) -> Self {
        Self {
            filter,
            parent_id: parent_id.to_string(),
            parent_name: parent_name.to_string(),
            index,
            code_finder: None,
        }
    }

    /// Apply the parent's code finder to nested text units
    pub fn with_code_finder(mut self, finder: InlineCodeFinder) -> Self {
        self.code_finder = Some(finder);
        self
    }

    pub fn start_id(&self) -> String {
        format!("{}_ssf{}", self.parent_id, self.index)
    }

    pub fn end_id(&self) -> String {
        format!("{}_esf{}", self.parent_id, self.index)
    }

    /// Id of the parent's DOCUMENT_PART that references the nested output
    pub fn reference_part_id(&self) -> String {
        format!("ref-sub-filter:{}-{}", self.parent_id, self.index)
    }

    fn rehome(&self, id: &str) -> String {
        format!("{}_sf{}_{}", self.parent_id, self.index, id)
    }

    fn rehome_skeleton(&self, skeleton: Option<Skeleton>) -> Option<Skeleton> {
        skeleton.map(|mut skel| {
            skel.rename_units(|id| self.rehome(id));
            skel.rename_references(|id| self.rehome(id));
            skel
        })
    }

    /// Filter `text` and return the wrapped, re-homed events
    pub fn process(&mut self, text: &str, locale: &LocaleId) -> Result<Vec<Event>> {
        let document = RawDocument::from_text(text, locale.clone());
        let events = extract_all(self.filter.as_mut(), document)?;

        match (events.first(), events.last()) {
            (Some(Event::StartDocument(_)), Some(Event::EndDocument(_))) => {}
            _ => {
                return Err(FilterError::StructuralMismatch(format!(
                    "nested {} stream for '{}' is incomplete",
                    self.filter.name(),
                    self.parent_id
                )));
            }
        }

        let mut unit_count = 0;
        let mut out = Vec::with_capacity(events.len());
        for event in events {
            let converted = match event {
                Event::StartDocument(sd) => Event::StartSubfilter(StartSubfilter {
                    id: self.start_id(),
                    name: format!("sub-filter:{}", self.parent_name),
                    parent_id: self.parent_id.clone(),
                    mime_type: sd.mime_type,
                    encoder: sd.encoder,
                    skeleton: self.rehome_skeleton(sd.skeleton),
                }),
                Event::EndDocument(ending) => Event::EndSubfilter(Ending {
                    id: self.end_id(),
                    skeleton: self.rehome_skeleton(ending.skeleton),
                }),
                Event::TextUnit(mut tu) => {
                    unit_count += 1;
                    tu.id = self.rehome(&tu.id);
                    tu.skeleton = self.rehome_skeleton(tu.skeleton.take());
                    if tu.name.is_none() {
                        tu.name = Some(format!("{}_{}", self.parent_name, unit_count));
                    }
                    if let Some(finder) = self.code_finder.as_mut() {
                        for part in tu.source.parts_mut() {
                            finder.process(&mut part.content)?;
                        }
                    }
                    Event::TextUnit(tu)
                }
                Event::DocumentPart(mut dp) => {
                    dp.id = self.rehome(&dp.id);
                    dp.skeleton = self.rehome_skeleton(dp.skeleton.take());
                    Event::DocumentPart(dp)
                }
                Event::StartGroup(mut group) => {
                    group.id = self.rehome(&group.id);
                    group.skeleton = self.rehome_skeleton(group.skeleton.take());
                    Event::StartGroup(group)
                }
                Event::StartSubDocument(mut group) => {
                    group.id = self.rehome(&group.id);
                    group.skeleton = self.rehome_skeleton(group.skeleton.take());
                    Event::StartSubDocument(group)
                }
                Event::StartSubfilter(mut start) => {
                    start.id = self.rehome(&start.id);
                    start.parent_id = self.rehome(&start.parent_id);
                    start.skeleton = self.rehome_skeleton(start.skeleton.take());
                    Event::StartSubfilter(start)
                }
                Event::EndGroup(ending) => Event::EndGroup(self.rehome_ending(ending)),
                Event::EndSubDocument(ending) => Event::EndSubDocument(self.rehome_ending(ending)),
                Event::EndSubfilter(ending) => Event::EndSubfilter(self.rehome_ending(ending)),
                Event::Canceled => {
                    return Err(FilterError::StructuralMismatch(format!(
                        "nested filter for '{}' was canceled",
                        self.parent_id
                    )));
                }
            };
            out.push(converted);
        }

        debug!(
            "Sub-filtered '{}' with {}: {} text unit(s)",
            self.parent_id,
            self.filter.name(),
            unit_count
        );
        Ok(out)
    }

    fn rehome_ending(&self, ending: Ending) -> Ending {
        Ending {
            id: self.rehome(&ending.id),
            skeleton: self.rehome_skeleton(ending.skeleton),
        }
    }

    /// DOCUMENT_PART placing the nested output between `before` and `after`
    pub fn reference_part(&self, mut before: Skeleton, after: &str) -> DocumentPart {
        before.add_reference(&self.start_id());
        before.append(after);
        DocumentPart::new(&self.reference_part_id(), before)
    }
}
