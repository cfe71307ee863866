/*!
 * Per-format re-escaping of extracted text on output.
 *
 * Filters decode escapes when they build text fragments; encoders put them
 * back when the writer renders the fragments. Only text runs go through an
 * encoder: inline code data and skeleton literals are written verbatim.
 */

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::encoding::{Charset, NewlineType};

/// Which encoder a document (or a sub-filtered section) needs
///
/// Carried by start-document and start-subfilter events so the writer can
/// build the matching encoder without knowing the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EncoderKind {
    /// Text is written as-is
    #[default]
    Plain,
    /// Backslash escapes for `\n`, `\t`, `\\` and `\uHHHH`
    Escaped,
    /// Java properties
    Properties {
        escape_extended: bool,
        convert_lf_and_tab: bool,
    },
    /// DTD entity values
    Dtd,
    /// HTML/XML text
    Markup,
    /// TransTable cells
    TransTable,
}

impl EncoderKind {
    /// Build the encoder for an output charset and line break
    pub fn build(&self, charset: Charset, line_break: NewlineType) -> Box<dyn Encoder> {
        match self {
            Self::Plain => Box::new(PlainEncoder { line_break }),
            Self::Escaped => Box::new(EscapedEncoder { charset, line_break }),
            Self::Properties {
                escape_extended,
                convert_lf_and_tab,
            } => Box::new(PropertiesEncoder {
                charset,
                line_break,
                escape_extended: *escape_extended,
                convert_lf_and_tab: *convert_lf_and_tab,
            }),
            Self::Dtd => Box::new(DtdEncoder { charset, line_break }),
            Self::Markup => Box::new(MarkupEncoder { charset, line_break }),
            Self::TransTable => Box::new(TransTableEncoder { line_break }),
        }
    }
}

/// Re-escapes text for one output format
pub trait Encoder {
    /// Encode a run of text (never code data)
    fn encode(&self, text: &str) -> String;

    /// Line break of the output document
    fn line_break(&self) -> &str;
}

pub struct PlainEncoder {
    line_break: NewlineType,
}

impl Encoder for PlainEncoder {
    fn encode(&self, text: &str) -> String {
        text.to_string()
    }

    fn line_break(&self) -> &str {
        self.line_break.as_str()
    }
}

/// Writes `\uhhhh` (UTF-16 units, lowercase) for `ch`
fn push_unicode_escape(out: &mut String, ch: char) {
    let mut units = [0u16; 2];
    for unit in ch.encode_utf16(&mut units) {
        let _ = write!(out, "\\u{:04x}", unit);
    }
}

pub struct EscapedEncoder {
    charset: Charset,
    line_break: NewlineType,
}

impl Encoder for EscapedEncoder {
    fn encode(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                c if !self.charset.can_encode(c) => push_unicode_escape(&mut out, c),
                c => out.push(c),
            }
        }
        out
    }

    fn line_break(&self) -> &str {
        self.line_break.as_str()
    }
}

/// Properties values: backslashes are kept as found since the filter keeps
/// unknown escapes verbatim
pub struct PropertiesEncoder {
    charset: Charset,
    line_break: NewlineType,
    escape_extended: bool,
    convert_lf_and_tab: bool,
}

impl Encoder for PropertiesEncoder {
    fn encode(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '\n' if self.convert_lf_and_tab => out.push_str("\\n"),
                '\t' if self.convert_lf_and_tab => out.push_str("\\t"),
                '\n' => out.push_str(self.line_break.as_str()),
                c if !c.is_ascii() && (self.escape_extended || !self.charset.can_encode(c)) => {
                    push_unicode_escape(&mut out, c)
                }
                c => out.push(c),
            }
        }
        out
    }

    fn line_break(&self) -> &str {
        self.line_break.as_str()
    }
}

/// Entity values: quotes are left alone since the filter keeps every quote
/// reference (named or numeric) as a code
pub struct DtdEncoder {
    charset: Charset,
    line_break: NewlineType,
}

impl Encoder for DtdEncoder {
    fn encode(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '%' => out.push_str("&#37;"),
                c if !self.charset.can_encode(c) => {
                    let _ = write!(out, "&#x{:04X};", c as u32);
                }
                c => out.push(c),
            }
        }
        out
    }

    fn line_break(&self) -> &str {
        self.line_break.as_str()
    }
}

pub struct MarkupEncoder {
    charset: Charset,
    line_break: NewlineType,
}

impl Encoder for MarkupEncoder {
    fn encode(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                c if !self.charset.can_encode(c) => {
                    let _ = write!(out, "&#x{:04X};", c as u32);
                }
                c => out.push(c),
            }
        }
        out
    }

    fn line_break(&self) -> &str {
        self.line_break.as_str()
    }
}

pub struct TransTableEncoder {
    line_break: NewlineType,
}

impl Encoder for TransTableEncoder {
    fn encode(&self, text: &str) -> String {
        text.replace('\t', "\\t").replace('\n', "\\n")
    }

    fn line_break(&self) -> &str {
        self.line_break.as_str()
    }
}
