/*!
 * Byte-order-mark, newline and charset handling.
 *
 * The detector trusts the caller-declared encoding unless a BOM says
 * otherwise; no statistical sniffing is done. Newline detection looks at the
 * first `NEWLINE_LOOKAHEAD` characters of the decoded text.
 */

use encoding_rs::{DecoderResult, EncoderResult, Encoding};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{FilterError, Result};

/// Number of decoded characters scanned for the first line break
pub const NEWLINE_LOOKAHEAD: usize = 8192;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Line-ending convention of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NewlineType {
    Cr,
    #[default]
    Lf,
    CrLf,
}

impl NewlineType {
    /// The literal line break
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cr => "\r",
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// Convention of the running platform
    pub fn platform() -> Self {
        if cfg!(windows) { Self::CrLf } else { Self::Lf }
    }

    /// Maps a literal break back to its type
    pub fn from_literal(value: &str) -> Option<Self> {
        match value {
            "\r" => Some(Self::Cr),
            "\n" => Some(Self::Lf),
            "\r\n" => Some(Self::CrLf),
            _ => None,
        }
    }
}

impl fmt::Display for NewlineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cr => "CR",
            Self::Lf => "LF",
            Self::CrLf => "CRLF",
        };
        write!(f, "{}", name)
    }
}

/// A character set the library can read and write
///
/// `encoding_rs` covers the WHATWG encodings; UTF-32 and UTF-16 output are
/// handled here because `encoding_rs` only decodes those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Whatwg(&'static Encoding),
    Utf32Le,
    Utf32Be,
}

impl Charset {
    /// Resolve an encoding label such as `UTF-8`, `ISO-8859-1`, `UTF-32LE`
    pub fn for_label(label: &str) -> Result<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "utf-32" | "utf-32be" | "utf32" => return Ok(Self::Utf32Be),
            "utf-32le" => return Ok(Self::Utf32Le),
            _ => {}
        }
        Encoding::for_label(normalized.as_bytes())
            .map(Self::Whatwg)
            .ok_or_else(|| FilterError::UnsupportedEncoding(label.to_string()))
    }

    /// UTF-8
    pub fn utf8() -> Self {
        Self::Whatwg(encoding_rs::UTF_8)
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Whatwg(enc) => enc.name(),
            Self::Utf32Le => "UTF-32LE",
            Self::Utf32Be => "UTF-32BE",
        }
    }

    pub fn is_utf8(&self) -> bool {
        matches!(self, Self::Whatwg(enc) if *enc == encoding_rs::UTF_8)
    }

    /// Whether every Unicode scalar value can be written
    pub fn is_unicode(&self) -> bool {
        match self {
            Self::Whatwg(enc) => {
                *enc == encoding_rs::UTF_8
                    || *enc == encoding_rs::UTF_16LE
                    || *enc == encoding_rs::UTF_16BE
                    || *enc == encoding_rs::GB18030
            }
            _ => true,
        }
    }

    /// Whether `ch` can be represented in this charset
    pub fn can_encode(&self, ch: char) -> bool {
        if ch.is_ascii() || self.is_unicode() {
            return true;
        }
        let mut buf = [0u8; 4];
        self.encode(ch.encode_utf8(&mut buf)).is_ok()
    }

    /// Decode bytes (BOM already removed) into a string
    pub fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self {
            Self::Whatwg(enc) => decode_whatwg(enc, bytes),
            Self::Utf32Le => decode_utf32(bytes, u32::from_le_bytes, self.name()),
            Self::Utf32Be => decode_utf32(bytes, u32::from_be_bytes, self.name()),
        }
    }

    /// Encode a string, failing on the first unmappable character
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        match self {
            Self::Whatwg(enc) if *enc == encoding_rs::UTF_16LE => {
                Ok(text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect())
            }
            Self::Whatwg(enc) if *enc == encoding_rs::UTF_16BE => {
                Ok(text.encode_utf16().flat_map(|u| u.to_be_bytes()).collect())
            }
            Self::Whatwg(enc) => encode_whatwg(enc, text),
            Self::Utf32Le => Ok(text.chars().flat_map(|c| (c as u32).to_le_bytes()).collect()),
            Self::Utf32Be => Ok(text.chars().flat_map(|c| (c as u32).to_be_bytes()).collect()),
        }
    }

    /// BOM bytes for this charset, used when a document had one
    pub fn bom(&self) -> &'static [u8] {
        match self {
            Self::Whatwg(enc) if *enc == encoding_rs::UTF_8 => UTF8_BOM,
            Self::Whatwg(enc) if *enc == encoding_rs::UTF_16LE => &[0xFF, 0xFE],
            Self::Whatwg(enc) if *enc == encoding_rs::UTF_16BE => &[0xFE, 0xFF],
            Self::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
            Self::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
            _ => &[],
        }
    }
}

fn decode_whatwg(enc: &'static Encoding, bytes: &[u8]) -> Result<String> {
    let mut decoder = enc.new_decoder_without_bom_handling();
    let capacity = decoder
        .max_utf8_buffer_length_without_replacement(bytes.len())
        .unwrap_or(bytes.len() * 3);
    let mut out = String::with_capacity(capacity);
    let mut consumed = 0;
    loop {
        let (result, read) =
            decoder.decode_to_string_without_replacement(&bytes[consumed..], &mut out, true);
        consumed += read;
        match result {
            DecoderResult::InputEmpty => return Ok(out),
            DecoderResult::OutputFull => out.reserve(capacity.max(16)),
            DecoderResult::Malformed(bad, after) => {
                return Err(FilterError::Decode {
                    encoding: enc.name().to_string(),
                    offset: consumed.saturating_sub(bad as usize + after as usize),
                });
            }
        }
    }
}

fn encode_whatwg(enc: &'static Encoding, text: &str) -> Result<Vec<u8>> {
    let mut encoder = enc.new_encoder();
    let capacity = encoder
        .max_buffer_length_from_utf8_without_replacement(text.len())
        .unwrap_or(text.len() * 4);
    let mut out = Vec::with_capacity(capacity);
    let mut consumed = 0;
    loop {
        let (result, read) =
            encoder.encode_from_utf8_to_vec_without_replacement(&text[consumed..], &mut out, true);
        consumed += read;
        match result {
            EncoderResult::InputEmpty => return Ok(out),
            EncoderResult::OutputFull => out.reserve(capacity.max(16)),
            EncoderResult::Unmappable(ch) => {
                return Err(FilterError::Unencodable {
                    encoding: enc.name().to_string(),
                    ch,
                });
            }
        }
    }
}

fn decode_utf32(bytes: &[u8], read: fn([u8; 4]) -> u32, name: &str) -> Result<String> {
    if bytes.len() % 4 != 0 {
        return Err(FilterError::Decode {
            encoding: name.to_string(),
            offset: bytes.len() - bytes.len() % 4,
        });
    }
    bytes
        .chunks_exact(4)
        .enumerate()
        .map(|(i, chunk)| {
            let value = read([chunk[0], chunk[1], chunk[2], chunk[3]]);
            char::from_u32(value).ok_or_else(|| FilterError::Decode {
                encoding: name.to_string(),
                offset: i * 4,
            })
        })
        .collect()
}

/// What the detector found
#[derive(Debug, Clone)]
pub struct Detection {
    /// Encoding to decode with
    pub charset: Charset,
    /// A BOM was present (any Unicode form)
    pub has_bom: bool,
    /// The BOM was the UTF-8 one
    pub has_utf8_bom: bool,
    /// Number of BOM bytes to skip
    pub bom_length: usize,
    /// Dominant line-break convention
    pub newline: NewlineType,
    /// Encoding came from a BOM rather than the declared default
    pub auto_detected: bool,
}

/// Sniffs BOM and newline convention from raw bytes
pub struct BomNewlineEncodingDetector<'a> {
    bytes: &'a [u8],
    default_encoding: String,
}

impl<'a> BomNewlineEncodingDetector<'a> {
    pub fn new(bytes: &'a [u8], default_encoding: &str) -> Self {
        Self {
            bytes,
            default_encoding: default_encoding.to_string(),
        }
    }

    /// Detect the BOM, if any; returns the charset it implies and its length
    pub fn detect_bom(&self) -> Option<(Charset, usize)> {
        let b = self.bytes;
        // UTF-32LE must be tested before UTF-16LE since they share a prefix
        if b.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
            Some((Charset::Utf32Le, 4))
        } else if b.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
            Some((Charset::Utf32Be, 4))
        } else if b.starts_with(UTF8_BOM) {
            Some((Charset::utf8(), 3))
        } else if b.starts_with(&[0xFF, 0xFE]) {
            Some((Charset::Whatwg(encoding_rs::UTF_16LE), 2))
        } else if b.starts_with(&[0xFE, 0xFF]) {
            Some((Charset::Whatwg(encoding_rs::UTF_16BE), 2))
        } else {
            None
        }
    }

    /// Run the detection; fails only when the declared default is unknown
    /// and no BOM overrides it
    pub fn detect(&self) -> Result<Detection> {
        let (charset, bom_length, auto_detected) = match self.detect_bom() {
            Some((charset, len)) => (charset, len, true),
            None => (Charset::for_label(&self.default_encoding)?, 0, false),
        };
        let has_utf8_bom = bom_length == 3 && charset.is_utf8();

        // Only the lookahead window is decoded for newline detection; a
        // malformed tail is reported later by the full decode
        let window_end = self.bytes.len().min(bom_length + NEWLINE_LOOKAHEAD * 4);
        let window = &self.bytes[bom_length..window_end];
        let newline = match charset.decode(window) {
            Ok(text) => detect_newline(&text),
            Err(_) => detect_newline(&String::from_utf8_lossy(window)),
        };

        debug!(
            "Detected encoding {} (bom: {}, auto: {}), newline {}",
            charset.name(),
            bom_length > 0,
            auto_detected,
            newline
        );

        Ok(Detection {
            charset,
            has_bom: bom_length > 0,
            has_utf8_bom,
            bom_length,
            newline,
            auto_detected,
        })
    }

    /// Detect, then decode the whole stream without its BOM
    pub fn detect_and_decode(&self) -> Result<(Detection, String)> {
        let detection = self.detect()?;
        let text = detection.charset.decode(&self.bytes[detection.bom_length..])?;
        Ok((detection, text))
    }
}

/// First line break in the lookahead window decides the convention
pub fn detect_newline(text: &str) -> NewlineType {
    let mut chars = text.chars().take(NEWLINE_LOOKAHEAD).peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' => return NewlineType::Lf,
            '\r' => {
                return if chars.peek() == Some(&'\n') {
                    NewlineType::CrLf
                } else {
                    NewlineType::Cr
                };
            }
            _ => {}
        }
    }
    NewlineType::platform()
}
