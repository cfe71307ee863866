use serde::{Deserialize, Serialize};

use crate::code_finder::{InlineCodeFinder, RULE_MESSAGE_FORMAT};
use crate::resource::SimplifierPolicy;

/// Filter parameters
///
/// The first group is the format-agnostic surface every filter honours; the
/// rest are format knobs ignored by filters they do not apply to. Every field
/// has a default so partial JSON overrides deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterParameters {
    // @field: Run the inline code finder over extracted text
    #[serde(default)]
    pub use_code_finder: bool,

    // @field: Ordered code finder rules
    #[serde(default)]
    pub code_finder: InlineCodeFinder,

    // @field: Move leading whitespace of a unit into the skeleton
    #[serde(default)]
    pub trim_leading: bool,

    // @field: Move trailing whitespace of a unit into the skeleton
    #[serde(default)]
    pub trim_trailing: bool,

    // @field: Flag units as whitespace-preserving
    #[serde(default)]
    pub preserve_whitespace: bool,

    // @field: Configuration id of the filter applied to extracted values
    #[serde(default)]
    pub subfilter: Option<String>,

    // @field: Also treat `;` and `//` lines as comments (properties)
    #[serde(default)]
    pub extra_comments: bool,

    // @field: Attach preceding comments to the unit as a note (properties)
    #[serde(default = "default_true")]
    pub comments_are_notes: bool,

    // @field: Filter entries by key (properties)
    #[serde(default)]
    pub use_key_condition: bool,

    // @field: Key regex, matched against the whole key (properties)
    #[serde(default = "default_key_condition")]
    pub key_condition: String,

    // @field: Extract only matching keys, or all but matching keys (properties)
    #[serde(default = "default_true")]
    pub extract_only_matching_key: bool,

    // @field: Use the key as the unit id (properties)
    #[serde(default)]
    pub id_like_resname: bool,

    // @field: Write non-ASCII characters as \uHHHH (properties)
    #[serde(default = "default_true")]
    pub escape_extended_chars: bool,

    // @field: Decode \n and \t escapes into real characters (properties)
    #[serde(default = "default_true")]
    pub convert_lf_and_tab: bool,

    // @field: Honour #_skip/#_text style comments (properties)
    #[serde(default = "default_true")]
    pub use_localization_directives: bool,

    // @field: Extract entries outside any directive scope (properties)
    #[serde(default = "default_true")]
    pub extract_outside_directives: bool,

    // @field: Decode backslash escapes in plain text lines
    #[serde(default)]
    pub unescape_source: bool,

    // @field: Optional code simplification after extraction
    #[serde(default)]
    pub simplifier: Option<SimplifierPolicy>,
}

fn default_true() -> bool {
    true
}

fn default_key_condition() -> String {
    ".*text.*".to_string()
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            use_code_finder: false,
            code_finder: InlineCodeFinder::default(),
            trim_leading: false,
            trim_trailing: false,
            preserve_whitespace: false,
            subfilter: None,
            extra_comments: false,
            comments_are_notes: true,
            use_key_condition: false,
            key_condition: default_key_condition(),
            extract_only_matching_key: true,
            id_like_resname: false,
            escape_extended_chars: true,
            convert_lf_and_tab: true,
            use_localization_directives: true,
            extract_outside_directives: true,
            unescape_source: false,
            simplifier: None,
        }
    }
}

impl FilterParameters {
    /// Defaults of the properties filter: message-format placeholders are codes
    pub fn properties() -> Self {
        Self {
            use_code_finder: true,
            code_finder: InlineCodeFinder::with_rules([RULE_MESSAGE_FORMAT]),
            preserve_whitespace: true,
            ..Self::default()
        }
    }

    /// Defaults of the plain text filter
    pub fn plain_text() -> Self {
        Self {
            preserve_whitespace: true,
            ..Self::default()
        }
    }

    /// Apply a partial JSON override on top of these parameters
    pub fn merged_with(&self, overrides: &serde_json::Value) -> serde_json::Result<Self> {
        let mut base = serde_json::to_value(self)?;
        if let (Some(base_map), Some(over_map)) = (base.as_object_mut(), overrides.as_object()) {
            for (key, value) in over_map {
                base_map.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(base)
    }
}
