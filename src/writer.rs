/*!
 * Writes an event stream back into a document.
 *
 * Skeleton literals are written verbatim; content placeholders are replaced
 * by the unit's content for the output locale (the source when there is no
 * target), with text re-escaped by the document's encoder and code data
 * written as-is. Output for a sub-filtered section is collected in its own
 * frame, re-escaped for the enclosing format, and written where the parent's
 * reference part points to it.
 *
 * The document is assembled in memory and written on END_DOCUMENT, to a
 * temporary file next to the target that replaces it only on success.
 */

use log::{debug, warn};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::encoder::Encoder;
use crate::encoding::{Charset, NewlineType};
use crate::errors::{FilterError, Result};
use crate::event::Event;
use crate::locale::LocaleId;
use crate::resource::{TextContainer, TextUnit};
use crate::skeleton::{Skeleton, SkeletonResolver};

/// Output options; everything unset follows the input document
#[derive(Debug, Clone, Default)]
pub struct WriterOptions {
    /// Locale whose targets are written; `None` writes the source
    pub locale: Option<LocaleId>,
    /// Output encoding label
    pub encoding: Option<String>,
    /// Line break replacing the ones in skeleton literals
    pub line_break: Option<NewlineType>,
}

enum Output {
    Path(PathBuf),
    Sink(Box<dyn Write>),
}

/// Output of one format: the root document or a sub-filtered section
struct Frame {
    id: String,
    encoder: Box<dyn Encoder>,
    out: String,
}

/// Resolves placeholders against what the writer has seen so far
struct Resolver<'a> {
    units: &'a HashMap<String, TextUnit>,
    references: &'a HashMap<String, String>,
    referents: &'a HashMap<String, Skeleton>,
    encoder: &'a dyn Encoder,
    locale: Option<&'a LocaleId>,
    line_break: Option<NewlineType>,
}

impl Resolver<'_> {
    fn render_container(&self, container: &TextContainer, segment: Option<&str>) -> Result<String> {
        let encode = |text: &str| self.encoder.encode(text);
        match segment {
            Some(id) => container
                .segment(id)
                .map(|f| f.to_output(encode))
                .ok_or_else(|| FilterError::MissingReference(format!("segment {}", id))),
            None => Ok(container
                .parts()
                .iter()
                .map(|p| p.content.to_output(encode))
                .collect()),
        }
    }
}

impl SkeletonResolver for Resolver<'_> {
    fn content(&mut self, unit_id: &str, locale: Option<&LocaleId>, segment: Option<&str>) -> Result<String> {
        let unit = self
            .units
            .get(unit_id)
            .ok_or_else(|| FilterError::MissingReference(unit_id.to_string()))?;
        let container = unit.content_for(locale.or(self.locale));
        self.render_container(container, segment)
            .map_err(|_| FilterError::MissingReference(format!("{} (segment {:?})", unit_id, segment)))
    }

    fn reference(&mut self, id: &str) -> Result<String> {
        if let Some(output) = self.references.get(id) {
            return Ok(output.clone());
        }
        if let Some(skeleton) = self.referents.get(id) {
            return skeleton.clone().render(self);
        }
        if let Some(unit) = self.units.get(id) {
            return self.render_container(unit.content_for(self.locale), None);
        }
        Err(FilterError::MissingReference(id.to_string()))
    }

    fn literal(&mut self, text: &str) -> String {
        match self.line_break {
            Some(lb) => normalize_line_breaks(text, lb.as_str()),
            None => text.to_string(),
        }
    }
}

/// Replace every CR, LF or CRLF with `line_break`
fn normalize_line_breaks(text: &str, line_break: &str) -> String {
    if !text.contains(['\r', '\n']) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str(line_break);
            }
            '\n' => out.push_str(line_break),
            c => out.push(c),
        }
    }
    out
}

/// Writes the events of one document
pub struct FilterWriter {
    options: WriterOptions,
    output: Option<Output>,
    charset: Option<Charset>,
    bom: bool,
    frames: Vec<Frame>,
    units: HashMap<String, TextUnit>,
    references: HashMap<String, String>,
    referents: HashMap<String, Skeleton>,
    closed: bool,
}

impl Default for FilterWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterWriter {
    pub fn new() -> Self {
        Self {
            options: WriterOptions::default(),
            output: None,
            charset: None,
            bom: false,
            frames: Vec::new(),
            units: HashMap::new(),
            references: HashMap::new(),
            referents: HashMap::new(),
            closed: false,
        }
    }

    pub fn set_options(&mut self, options: WriterOptions) {
        self.options = options;
    }

    /// Output locale and encoding
    pub fn set_locale_and_encoding(&mut self, locale: Option<LocaleId>, encoding: Option<&str>) {
        self.options.locale = locale;
        self.options.encoding = encoding.map(str::to_string);
    }

    pub fn set_output<P: AsRef<Path>>(&mut self, path: P) {
        self.output = Some(Output::Path(path.as_ref().to_path_buf()));
        self.closed = false;
    }

    pub fn set_output_sink(&mut self, sink: Box<dyn Write>) {
        self.output = Some(Output::Sink(sink));
        self.closed = false;
    }

    fn frame(&mut self) -> Result<&mut Frame> {
        self.frames
            .last_mut()
            .ok_or_else(|| FilterError::StructuralMismatch("event before START_DOCUMENT".to_string()))
    }

    /// Render `skeleton` into the innermost frame
    fn render(&mut self, skeleton: &Skeleton) -> Result<()> {
        let frame = self
            .frames
            .last()
            .ok_or_else(|| FilterError::StructuralMismatch("event before START_DOCUMENT".to_string()))?;
        let mut resolver = Resolver {
            units: &self.units,
            references: &self.references,
            referents: &self.referents,
            encoder: frame.encoder.as_ref(),
            locale: self.options.locale.as_ref(),
            line_break: self.options.line_break,
        };
        let text = skeleton.render(&mut resolver)?;
        self.frame()?.out.push_str(&text);
        Ok(())
    }

    fn render_optional(&mut self, skeleton: Option<&Skeleton>) -> Result<()> {
        match skeleton {
            Some(skel) => self.render(skel),
            None => Ok(()),
        }
    }

    pub fn handle_event(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::StartDocument(sd) => {
                let label = self.options.encoding.clone().unwrap_or_else(|| sd.encoding.clone());
                let charset = Charset::for_label(&label)?;
                let line_break = self.options.line_break.unwrap_or(sd.line_break);
                self.bom = if charset.is_utf8() { sd.has_utf8_bom } else { sd.has_bom };
                self.frames.clear();
                self.units.clear();
                self.references.clear();
                self.referents.clear();
                self.frames.push(Frame {
                    id: sd.id.clone(),
                    encoder: sd.encoder.build(charset, line_break),
                    out: String::new(),
                });
                self.charset = Some(charset);
                debug!(
                    "Writing {} as {} (bom: {}, line break: {})",
                    sd.name.as_deref().unwrap_or("<memory>"),
                    charset.name(),
                    self.bom,
                    line_break
                );
                self.render_optional(sd.skeleton.as_ref())
            }
            Event::TextUnit(tu) => {
                self.units.insert(tu.id.clone(), tu.clone());
                if tu.is_referent {
                    return Ok(());
                }
                self.render_optional(tu.skeleton.as_ref())
            }
            Event::DocumentPart(dp) => {
                if dp.is_referent {
                    if let Some(skel) = &dp.skeleton {
                        self.referents.insert(dp.id.clone(), skel.clone());
                    }
                    return Ok(());
                }
                self.render_optional(dp.skeleton.as_ref())
            }
            Event::StartGroup(group) | Event::StartSubDocument(group) => {
                self.render_optional(group.skeleton.as_ref())
            }
            Event::EndGroup(ending) | Event::EndSubDocument(ending) => {
                self.render_optional(ending.skeleton.as_ref())
            }
            Event::StartSubfilter(start) => {
                let charset = self
                    .charset
                    .ok_or_else(|| FilterError::StructuralMismatch("START_SUBFILTER before START_DOCUMENT".to_string()))?;
                let line_break = NewlineType::from_literal(self.frame()?.encoder.line_break())
                    .unwrap_or_default();
                self.frames.push(Frame {
                    id: start.id.clone(),
                    encoder: start.encoder.build(charset, line_break),
                    out: String::new(),
                });
                self.render_optional(start.skeleton.as_ref())
            }
            Event::EndSubfilter(ending) => {
                self.render_optional(ending.skeleton.as_ref())?;
                if self.frames.len() < 2 {
                    return Err(FilterError::StructuralMismatch(
                        "END_SUBFILTER without START_SUBFILTER".to_string(),
                    ));
                }
                let Some(frame) = self.frames.pop() else {
                    return Ok(());
                };
                // The whole nested output, code data included, is parent text:
                // with extended escaping a non-ASCII attribute value inside a
                // tag comes out as `\uhhhh` too, which the parent reads back
                let encoded = self.frame()?.encoder.encode(&frame.out);
                self.references.insert(frame.id, encoded);
                Ok(())
            }
            Event::EndDocument(ending) => {
                self.render_optional(ending.skeleton.as_ref())?;
                self.flush()
            }
            Event::Canceled => {
                debug!("Document canceled, output discarded");
                self.frames.clear();
                self.close();
                Ok(())
            }
        }
    }

    /// Encode the root frame and write it out
    fn flush(&mut self) -> Result<()> {
        if self.frames.len() != 1 {
            return Err(FilterError::StructuralMismatch(format!(
                "END_DOCUMENT with {} unclosed sub-filter section(s)",
                self.frames.len().saturating_sub(1)
            )));
        }
        let charset = self
            .charset
            .ok_or_else(|| FilterError::StructuralMismatch("END_DOCUMENT before START_DOCUMENT".to_string()))?;
        let Some(root) = self.frames.pop() else {
            return Ok(());
        };
        let mut bytes = Vec::with_capacity(root.out.len() + 4);
        if self.bom {
            bytes.extend_from_slice(charset.bom());
        }
        bytes.extend(charset.encode(&root.out)?);

        match self.output.take() {
            Some(Output::Path(path)) => write_atomically(&path, &bytes)?,
            Some(Output::Sink(mut sink)) => {
                sink.write_all(&bytes)
                    .and_then(|_| sink.flush())
                    .map_err(|e| FilterError::io("writing output", e))?;
            }
            None => {
                return Err(FilterError::InvalidState("no output set for the writer".to_string()));
            }
        }
        debug!("Wrote document {} ({} bytes)", root.id, bytes.len());
        self.close();
        Ok(())
    }

    /// Release the output; pending, unfinished output is discarded
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if !self.frames.is_empty() {
            warn!("Writer closed before END_DOCUMENT; output discarded");
        }
        self.frames.clear();
        self.units.clear();
        self.references.clear();
        self.referents.clear();
        self.output = None;
        self.charset = None;
        self.closed = true;
    }
}

impl Drop for FilterWriter {
    fn drop(&mut self) {
        self.close();
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let context = || format!("writing {}", path.display());
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| FilterError::io(context(), e))?;
    temp.write_all(bytes).map_err(|e| FilterError::io(context(), e))?;
    temp.persist(path)
        .map_err(|e| FilterError::io(context(), e.error))?;
    Ok(())
}

/// Write a whole event sequence into a byte vector
pub fn write_to_vec(events: &[Event], options: WriterOptions) -> Result<Vec<u8>> {
    let buffer = SharedBuffer::default();
    let mut writer = FilterWriter::new();
    writer.set_options(options);
    writer.set_output_sink(Box::new(buffer.clone()));
    for event in events {
        writer.handle_event(event)?;
    }
    writer.close();
    Ok(buffer.take())
}

/// In-memory sink that stays readable after the writer consumed it
#[derive(Clone, Default)]
struct SharedBuffer(std::rc::Rc<std::cell::RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
