/*!
 * Coded text: a string where each inline code is a two-character marker.
 *
 * The first character of a marker tells whether the code opens, closes or
 * stands alone; the second one is the index of the code in the side table,
 * offset from `CHARBASE`. Codes are kept in the order their markers appear.
 */

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::{FilterError, Result};
use crate::resource::code::{Code, TagType};

/// Marker of an opening code paired with a closing one
pub const MARKER_OPENING: char = '\u{E101}';
/// Marker of a closing code paired with an opening one
pub const MARKER_CLOSING: char = '\u{E102}';
/// Marker of a placeholder or an unpaired opening/closing code
pub const MARKER_ISOLATED: char = '\u{E103}';
/// Base of the index character following each marker
pub const CHARBASE: u32 = 0xE110;

pub fn is_marker(c: char) -> bool {
    matches!(c, MARKER_OPENING | MARKER_CLOSING | MARKER_ISOLATED)
}

/// Index character for a code index
pub fn to_char(index: usize) -> char {
    char::from_u32(CHARBASE + index as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Code index from an index character
pub fn to_index(c: char) -> usize {
    (c as u32).saturating_sub(CHARBASE) as usize
}

/// Text with inline codes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextFragment {
    coded_text: String,
    codes: Vec<Code>,
    last_code_id: i32,
}

impl TextFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            coded_text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn coded_text(&self) -> &str {
        &self.coded_text
    }

    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    /// Codes can be edited in place; adding or removing goes through the
    /// fragment so markers stay in sync
    pub fn codes_mut(&mut self) -> &mut [Code] {
        &mut self.codes
    }

    pub fn last_code_id(&self) -> i32 {
        self.last_code_id
    }

    pub fn is_empty(&self) -> bool {
        self.coded_text.is_empty()
    }

    pub fn has_code(&self) -> bool {
        !self.codes.is_empty()
    }

    /// True when there is at least one non-whitespace character outside codes
    pub fn has_text(&self) -> bool {
        self.text().chars().any(|c| !c.is_whitespace())
    }

    pub fn append_text(&mut self, text: &str) {
        self.coded_text.push_str(text);
    }

    pub fn append_char(&mut self, c: char) {
        self.coded_text.push(c);
    }

    /// Append a new code; opening and placeholder codes get the next id,
    /// closing codes take the id of the opening code they balance
    pub fn append_code(&mut self, tag_type: TagType, code_type: &str, data: &str) -> i32 {
        self.append_code_object(Code::new(tag_type, code_type, data))
    }

    /// Append a prepared code, keeping its id if it has one
    pub fn append_code_object(&mut self, mut code: Code) -> i32 {
        if code.id <= 0 && code.tag_type != TagType::Closing {
            self.last_code_id += 1;
            code.id = self.last_code_id;
        } else if code.id > self.last_code_id {
            self.last_code_id = code.id;
        }
        let marker = match code.tag_type {
            TagType::Opening => MARKER_OPENING,
            TagType::Closing => MARKER_CLOSING,
            TagType::Placeholder => MARKER_ISOLATED,
        };
        self.coded_text.push(marker);
        self.coded_text.push(to_char(self.codes.len()));
        self.codes.push(code);
        self.balance_markers();
        self.codes.last().map(|c| c.id).unwrap_or(-1)
    }

    /// Append another fragment; its code ids are kept as they are
    pub fn append_fragment(&mut self, other: &TextFragment) {
        let mut chars = other.coded_text.chars();
        while let Some(c) = chars.next() {
            if is_marker(c) {
                let Some(index_char) = chars.next() else { break };
                let code = other.codes[to_index(index_char)].clone();
                self.last_code_id = self.last_code_id.max(code.id);
                self.coded_text.push(c);
                self.coded_text.push(to_char(self.codes.len()));
                self.codes.push(code);
            } else {
                self.coded_text.push(c);
            }
        }
        self.balance_markers();
    }

    /// Plain text, codes elided
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.coded_text.len());
        let mut chars = self.coded_text.chars();
        while let Some(c) = chars.next() {
            if is_marker(c) {
                chars.next();
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Text with every code expanded to its original data
    pub fn to_original(&self) -> String {
        self.to_output(|text| text.to_string())
    }

    /// Expand codes to their output data and pass text runs through
    /// `encode_text`
    pub fn to_output<F: Fn(&str) -> String>(&self, encode_text: F) -> String {
        let mut out = String::with_capacity(self.coded_text.len());
        let mut run_start = 0;
        let mut iter = self.coded_text.char_indices();
        while let Some((pos, c)) = iter.next() {
            if !is_marker(c) {
                continue;
            }
            if run_start < pos {
                out.push_str(&encode_text(&self.coded_text[run_start..pos]));
            }
            run_start = pos + c.len_utf8();
            if let Some((index_pos, index_char)) = iter.next() {
                if let Some(code) = self.codes.get(to_index(index_char)) {
                    out.push_str(code.output_data());
                }
                run_start = index_pos + index_char.len_utf8();
            }
        }
        if run_start < self.coded_text.len() {
            out.push_str(&encode_text(&self.coded_text[run_start..]));
        }
        out
    }

    /// Copy of the fragment with every text run passed through `f`; codes
    /// are kept as they are
    pub fn map_text<F: Fn(&str) -> String>(&self, f: F) -> TextFragment {
        let mut coded_text = String::with_capacity(self.coded_text.len());
        let mut run = String::new();
        let mut chars = self.coded_text.chars();
        while let Some(c) = chars.next() {
            if is_marker(c) {
                coded_text.push_str(&f(&std::mem::take(&mut run)));
                coded_text.push(c);
                if let Some(index_char) = chars.next() {
                    coded_text.push(index_char);
                }
            } else {
                run.push(c);
            }
        }
        coded_text.push_str(&f(&run));
        TextFragment {
            coded_text,
            codes: self.codes.clone(),
            last_code_id: self.last_code_id,
        }
    }

    /// Byte ranges of each code's marker pair, in code order
    pub fn code_spans(&self) -> Vec<(usize, usize)> {
        let mut spans = Vec::with_capacity(self.codes.len());
        let mut iter = self.coded_text.char_indices();
        while let Some((pos, c)) = iter.next() {
            if is_marker(c) {
                let end = iter
                    .next()
                    .map(|(i, ic)| i + ic.len_utf8())
                    .unwrap_or(pos + c.len_utf8());
                spans.push((pos, end));
            }
        }
        spans
    }

    /// Pair opening and closing codes and set the markers accordingly
    ///
    /// Closing codes with a known id pair with the opening of the same id,
    /// others with the nearest open code of the same type. Whatever stays
    /// unpaired gets an isolated marker; unpaired closing codes without an
    /// id receive a fresh one.
    pub fn balance_markers(&mut self) {
        let mut markers = vec![MARKER_ISOLATED; self.codes.len()];
        let mut open: Vec<usize> = Vec::new();

        for i in 0..self.codes.len() {
            match self.codes[i].tag_type {
                TagType::Placeholder => {}
                TagType::Opening => open.push(i),
                TagType::Closing => {
                    let id = self.codes[i].id;
                    let found = if id > 0 {
                        open.iter().rposition(|&o| self.codes[o].id == id)
                    } else {
                        let code_type = &self.codes[i].code_type;
                        open.iter().rposition(|&o| &self.codes[o].code_type == code_type)
                    };
                    match found {
                        Some(p) => {
                            let o = open.remove(p);
                            markers[o] = MARKER_OPENING;
                            markers[i] = MARKER_CLOSING;
                            self.codes[i].id = self.codes[o].id;
                        }
                        None if id <= 0 => {
                            self.last_code_id += 1;
                            self.codes[i].id = self.last_code_id;
                        }
                        None => {}
                    }
                }
            }
        }
        self.rebuild_markers(&markers);
    }

    /// Rewrite marker and index characters in appearance order
    fn rebuild_markers(&mut self, markers: &[char]) {
        let mut out = String::with_capacity(self.coded_text.len());
        let mut index = 0;
        let mut chars = self.coded_text.chars();
        while let Some(c) = chars.next() {
            if is_marker(c) {
                chars.next();
                out.push(markers.get(index).copied().unwrap_or(MARKER_ISOLATED));
                out.push(to_char(index));
                index += 1;
            } else {
                out.push(c);
            }
        }
        self.coded_text = out;
    }

    /// Turn the coded-text range `start..end` into a single code
    ///
    /// Codes fully inside the range are absorbed into the new code's data;
    /// a range that cuts through a marker is rejected.
    pub fn change_to_code(
        &mut self,
        start: usize,
        end: usize,
        tag_type: TagType,
        code_type: &str,
    ) -> Result<i32> {
        if start >= end
            || end > self.coded_text.len()
            || !self.coded_text.is_char_boundary(start)
            || !self.coded_text.is_char_boundary(end)
        {
            return Err(FilterError::InvalidState(format!(
                "Invalid code range {}..{}",
                start, end
            )));
        }

        let spans = self.code_spans();
        if spans
            .iter()
            .any(|&(s, e)| (s < start && start < e) || (s < end && end < e))
        {
            return Err(FilterError::InvalidState(format!(
                "Range {}..{} cuts through an inline code",
                start, end
            )));
        }
        let first = spans.iter().filter(|&&(_, e)| e <= start).count();
        let inner = spans.iter().filter(|&&(s, e)| s >= start && e <= end).count();

        let mut data = String::new();
        let mut chars = self.coded_text[start..end].chars();
        let mut k = 0;
        while let Some(c) = chars.next() {
            if is_marker(c) {
                chars.next();
                data.push_str(&self.codes[first + k].data);
                k += 1;
            } else {
                data.push(c);
            }
        }

        self.codes.drain(first..first + inner);
        let mut code = Code::new(tag_type, code_type, &data);
        if tag_type != TagType::Closing {
            self.last_code_id += 1;
            code.id = self.last_code_id;
        }
        self.codes.insert(first, code);

        let mut text = String::with_capacity(self.coded_text.len());
        text.push_str(&self.coded_text[..start]);
        text.push(MARKER_ISOLATED);
        text.push(to_char(first));
        text.push_str(&self.coded_text[end..]);
        self.coded_text = text;
        self.balance_markers();
        Ok(self.codes[first].id)
    }

    /// Give codes ids in left-to-right order, keeping pairs together
    pub fn renumber_codes(&mut self) {
        let mut mapping: HashMap<i32, i32> = HashMap::new();
        let mut next = 0;
        for code in self.codes.iter_mut() {
            match code.tag_type {
                TagType::Closing => match mapping.remove(&code.id) {
                    Some(id) => code.id = id,
                    None => {
                        next += 1;
                        code.id = next;
                    }
                },
                TagType::Opening => {
                    next += 1;
                    mapping.insert(code.id, next);
                    code.id = next;
                }
                TagType::Placeholder => {
                    next += 1;
                    code.id = next;
                }
            }
        }
        self.last_code_id = next;
        self.balance_markers();
    }

    /// Reuse the ids of `source` for codes with the same type and data
    pub fn align_code_ids(&mut self, source: &TextFragment) {
        let mut used = vec![false; source.codes.len()];
        for code in self.codes.iter_mut() {
            let found = source.codes.iter().enumerate().position(|(i, c)| {
                !used[i] && c.tag_type == code.tag_type && c.data == code.data
            });
            if let Some(i) = found {
                used[i] = true;
                code.id = source.codes[i].id;
            }
        }
        self.last_code_id = self
            .codes
            .iter()
            .map(|c| c.id)
            .max()
            .unwrap_or(0)
            .max(self.last_code_id);
        self.balance_markers();
    }

    /// Marker character currently used for code `index`
    pub fn marker_of(&self, index: usize) -> Option<char> {
        self.coded_text
            .chars()
            .filter(|c| is_marker(*c))
            .nth(index)
    }

    /// Replace coded text and codes wholesale; used by the simplifier
    pub(crate) fn replace_contents(&mut self, coded_text: String, codes: Vec<Code>) {
        self.coded_text = coded_text;
        self.last_code_id = codes.iter().map(|c| c.id).max().unwrap_or(0);
        self.codes = codes;
        self.balance_markers();
    }
}

impl From<&str> for TextFragment {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl fmt::Display for TextFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_original())
    }
}
