use serde::{Deserialize, Serialize};

/// Kind of inline code relative to the text around it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Opening,
    Closing,
    Placeholder,
}

/// Code type for codes the filters cannot classify
pub const TYPE_NULL: &str = "null";
/// Code type for entity or parameter references kept as codes
pub const TYPE_REFERENCE: &str = "x-ref";
/// Code type for code-finder matches
pub const TYPE_CODE_FINDER: &str = "x-ph";
/// Code type for line breaks inside inline markup
pub const TYPE_LB: &str = "lb";
/// Code type for bold markup
pub const TYPE_BOLD: &str = "bold";
/// Code type for italic markup
pub const TYPE_ITALIC: &str = "italic";
/// Code type for underline markup
pub const TYPE_UNDERLINED: &str = "underlined";
/// Code type for links
pub const TYPE_LINK: &str = "link";
/// Code type for images
pub const TYPE_IMAGE: &str = "image";

/// An inline code: markup protected from translation
///
/// `data` is the literal markup as found. `outer_data`, when present, is what
/// the writer emits instead (used when the raw form wraps the data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub tag_type: TagType,
    /// Stable id within the fragment; closing codes share the id of their
    /// opening code. `-1` until assigned.
    pub id: i32,
    pub code_type: String,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_data: Option<String>,
    #[serde(default = "default_true")]
    pub deletable: bool,
    #[serde(default = "default_true")]
    pub cloneable: bool,
    /// Code was added during translation
    #[serde(default)]
    pub added: bool,
}

fn default_true() -> bool {
    true
}

impl Code {
    pub fn new(tag_type: TagType, code_type: &str, data: &str) -> Self {
        Self {
            tag_type,
            id: -1,
            code_type: code_type.to_string(),
            data: data.to_string(),
            outer_data: None,
            deletable: true,
            cloneable: true,
            added: false,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    /// What the writer emits for this code
    pub fn output_data(&self) -> &str {
        self.outer_data.as_deref().unwrap_or(&self.data)
    }
}
