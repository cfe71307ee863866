//! Letter-coded representation of a fragment: `<g1>..</g1>` for paired
//! codes, `<x2/>` for placeholders, `<b3/>`/`<e4/>` for unpaired openings
//! and closings.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::resource::code::{Code, TYPE_NULL, TagType};
use crate::resource::fragment::{
    MARKER_CLOSING, MARKER_ISOLATED, MARKER_OPENING, TextFragment, is_marker, to_index,
};

static LETTER_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)g(\d+)>|<([xbe])(\d+)/>").expect("Invalid letter-code regex")
});

/// Render a fragment with letter codes instead of markers
pub fn to_letter_coded(fragment: &TextFragment) -> String {
    let coded = fragment.coded_text();
    let codes = fragment.codes();
    let mut out = String::with_capacity(coded.len());
    let mut chars = coded.chars();
    while let Some(c) = chars.next() {
        if !is_marker(c) {
            out.push(c);
            continue;
        }
        let Some(code) = chars.next().and_then(|ic| codes.get(to_index(ic))) else {
            continue;
        };
        let tag = match (c, code.tag_type) {
            (MARKER_OPENING, _) => format!("<g{}>", code.id),
            (MARKER_CLOSING, _) => format!("</g{}>", code.id),
            (MARKER_ISOLATED, TagType::Opening) => format!("<b{}/>", code.id),
            (MARKER_ISOLATED, TagType::Closing) => format!("<e{}/>", code.id),
            _ => format!("<x{}/>", code.id),
        };
        out.push_str(&tag);
    }
    out
}

/// Parse letter-coded text; each code keeps its tag as data so the
/// fragment renders back to the same string
pub fn from_letter_coded(text: &str) -> TextFragment {
    let mut fragment = TextFragment::new();
    let mut last = 0;
    for caps in LETTER_CODE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let (tag_type, number) = if let Some(n) = caps.get(2) {
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let tag_type = if closing { TagType::Closing } else { TagType::Opening };
            (tag_type, n.as_str())
        } else {
            let tag_type = match caps.get(3).map(|m| m.as_str()) {
                Some("b") => TagType::Opening,
                Some("e") => TagType::Closing,
                _ => TagType::Placeholder,
            };
            (tag_type, caps.get(4).map(|m| m.as_str()).unwrap_or_default())
        };
        let Ok(id) = number.parse::<i32>() else { continue };

        fragment.append_text(&text[last..whole.start()]);
        fragment.append_code_object(Code::new(tag_type, TYPE_NULL, whole.as_str()).with_id(id));
        last = whole.end();
    }
    fragment.append_text(&text[last..]);
    fragment
}
