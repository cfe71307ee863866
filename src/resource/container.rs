use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::resource::fragment::TextFragment;

/// Id of the segment a single-segment container starts with
pub const DEFAULT_SEGMENT_ID: &str = "0";

static EMPTY: Lazy<TextFragment> = Lazy::new(TextFragment::new);

/// One part of a container: a segment when it has an id, otherwise the
/// inter-segment content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    pub content: TextFragment,
}

impl TextPart {
    pub fn is_segment(&self) -> bool {
        self.segment_id.is_some()
    }
}

/// Content of a text unit for one locale, possibly segmented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContainer {
    parts: Vec<TextPart>,
}

impl Default for TextContainer {
    fn default() -> Self {
        Self::new(TextFragment::new())
    }
}

impl TextContainer {
    /// Container holding one segment
    pub fn new(content: TextFragment) -> Self {
        Self {
            parts: vec![TextPart {
                segment_id: Some(DEFAULT_SEGMENT_ID.to_string()),
                content,
            }],
        }
    }

    /// Container without any part, to be filled segment by segment
    pub fn empty() -> Self {
        Self { parts: Vec::new() }
    }

    pub fn parts(&self) -> &[TextPart] {
        &self.parts
    }

    pub fn segments(&self) -> impl Iterator<Item = &TextPart> {
        self.parts.iter().filter(|p| p.is_segment())
    }

    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    pub fn segment(&self, id: &str) -> Option<&TextFragment> {
        self.parts
            .iter()
            .find(|p| p.segment_id.as_deref() == Some(id))
            .map(|p| &p.content)
    }

    pub fn segment_mut(&mut self, id: &str) -> Option<&mut TextFragment> {
        self.parts
            .iter_mut()
            .find(|p| p.segment_id.as_deref() == Some(id))
            .map(|p| &mut p.content)
    }

    pub fn append_segment(&mut self, id: &str, content: TextFragment) {
        self.parts.push(TextPart {
            segment_id: Some(id.to_string()),
            content,
        });
    }

    /// Append content that is not a segment
    pub fn append_part(&mut self, content: TextFragment) {
        self.parts.push(TextPart { segment_id: None, content });
    }

    /// Content of the first part
    pub fn first_content(&self) -> &TextFragment {
        self.parts.first().map(|p| &p.content).unwrap_or(&*EMPTY)
    }

    pub fn first_content_mut(&mut self) -> &mut TextFragment {
        if self.parts.is_empty() {
            self.parts.push(TextPart {
                segment_id: Some(DEFAULT_SEGMENT_ID.to_string()),
                content: TextFragment::new(),
            });
        }
        &mut self.parts[0].content
    }

    pub fn parts_mut(&mut self) -> &mut [TextPart] {
        &mut self.parts
    }

    /// All parts concatenated into one fragment
    pub fn joined(&self) -> TextFragment {
        let mut tf = TextFragment::new();
        for part in &self.parts {
            tf.append_fragment(&part.content);
        }
        tf
    }

    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(|p| p.content.is_empty())
    }

    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.content.text()).collect()
    }
}

impl fmt::Display for TextContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            write!(f, "{}", part.content)?;
        }
        Ok(())
    }
}
