use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::encoder::EncoderKind;
use crate::encoding::NewlineType;
use crate::locale::LocaleId;
use crate::resource::container::TextContainer;
use crate::resource::fragment::TextFragment;
use crate::skeleton::Skeleton;

/// Property holding the character offset where a unit's value starts
pub const PROP_START: &str = "start";

/// One extracted, independently translatable piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Referent units are only written where another resource references them
    #[serde(default)]
    pub is_referent: bool,
    #[serde(default)]
    pub preserve_whitespace: bool,
    pub source: TextContainer,
    #[serde(default)]
    pub targets: BTreeMap<LocaleId, TextContainer>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Skeleton>,
}

impl TextUnit {
    pub fn new(id: &str, source: TextFragment) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            mime_type: None,
            is_referent: false,
            preserve_whitespace: false,
            source: TextContainer::new(source),
            targets: BTreeMap::new(),
            properties: BTreeMap::new(),
            note: None,
            skeleton: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn source_fragment(&self) -> &TextFragment {
        self.source.first_content()
    }

    pub fn source_fragment_mut(&mut self) -> &mut TextFragment {
        self.source.first_content_mut()
    }

    pub fn target(&self, locale: &LocaleId) -> Option<&TextContainer> {
        self.targets.get(locale)
    }

    pub fn set_target(&mut self, locale: LocaleId, content: TextContainer) {
        self.targets.insert(locale, content);
    }

    /// Target for `locale` when there is one, otherwise the source
    pub fn content_for(&self, locale: Option<&LocaleId>) -> &TextContainer {
        locale
            .and_then(|l| self.targets.get(l))
            .unwrap_or(&self.source)
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn set_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_string(), value.to_string());
    }
}

/// A non-translatable part of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPart {
    pub id: String,
    #[serde(default)]
    pub is_referent: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Skeleton>,
}

impl DocumentPart {
    pub fn new(id: &str, skeleton: Skeleton) -> Self {
        Self {
            id: id.to_string(),
            is_referent: false,
            properties: BTreeMap::new(),
            skeleton: Some(skeleton),
        }
    }
}

/// Document-level information, sent first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub locale: LocaleId,
    pub encoding: String,
    /// Any Unicode BOM was present
    #[serde(default)]
    pub has_bom: bool,
    pub has_utf8_bom: bool,
    pub line_break: NewlineType,
    pub mime_type: String,
    #[serde(default)]
    pub is_multilingual: bool,
    /// Filter configuration the document was read with
    pub filter_id: String,
    pub encoder: EncoderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Skeleton>,
}

/// Start of a group or of a sub-document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartGroup {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Skeleton>,
}

/// Start of a section produced by a nested filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartSubfilter {
    pub id: String,
    pub name: String,
    /// Id of the resource whose value was sub-filtered
    pub parent_id: String,
    pub mime_type: String,
    /// Encoder for the nested format
    pub encoder: EncoderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Skeleton>,
}

/// Closes a document, group, sub-document or subfilter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ending {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skeleton: Option<Skeleton>,
}

impl Ending {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            skeleton: None,
        }
    }

    /// Ending carrying some skeleton, or none when the skeleton is empty
    pub fn with_skeleton(id: &str, skeleton: Skeleton) -> Self {
        Self {
            id: id.to_string(),
            skeleton: if skeleton.is_empty() { None } else { Some(skeleton) },
        }
    }
}
