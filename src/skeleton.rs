/*!
 * Skeleton: the non-translatable residue of a document.
 *
 * A skeleton is an ordered list of literal strings, content placeholders
 * (resolved to a text unit's rendered content) and references (resolved to
 * the output of another resource, e.g. a sub-filtered value). The skeleton
 * itself never resolves anything: the writer passes a `SkeletonResolver`.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::Result;
use crate::locale::LocaleId;

/// One piece of a skeleton
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkeletonPart {
    /// Literal text, written as-is
    Text { text: String },
    /// Rendered content of a text unit; `locale` forces a variant,
    /// `segment` limits the output to one segment
    Content {
        unit_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        locale: Option<LocaleId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        segment: Option<String>,
    },
    /// Output of another resource, by id
    Reference { id: String },
}

/// Resolves placeholders while a skeleton is rendered
pub trait SkeletonResolver {
    /// Rendered content of a text unit
    fn content(&mut self, unit_id: &str, locale: Option<&LocaleId>, segment: Option<&str>)
    -> Result<String>;

    /// Output of a referenced resource
    fn reference(&mut self, id: &str) -> Result<String>;

    /// Literal skeleton text; the default writes it unchanged
    fn literal(&mut self, text: &str) -> String {
        text.to_string()
    }
}

/// Ordered literal/placeholder parts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Skeleton {
    parts: Vec<SkeletonPart>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        let mut skel = Self::new();
        skel.append(text);
        skel
    }

    pub fn parts(&self) -> &[SkeletonPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Append literal text, merged with a trailing literal part
    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(SkeletonPart::Text { text: last }) = self.parts.last_mut() {
            last.push_str(text);
        } else {
            self.parts.push(SkeletonPart::Text { text: text.to_string() });
        }
    }

    /// Placeholder for the content of unit `unit_id` in the output locale
    pub fn add_content_placeholder(&mut self, unit_id: &str) {
        self.parts.push(SkeletonPart::Content {
            unit_id: unit_id.to_string(),
            locale: None,
            segment: None,
        });
    }

    /// Placeholder for a given locale's variant of a unit
    pub fn add_content_placeholder_for(&mut self, unit_id: &str, locale: &LocaleId) {
        self.parts.push(SkeletonPart::Content {
            unit_id: unit_id.to_string(),
            locale: Some(locale.clone()),
            segment: None,
        });
    }

    /// Placeholder for one segment of a unit
    pub fn add_segment_placeholder(&mut self, unit_id: &str, segment: &str) {
        self.parts.push(SkeletonPart::Content {
            unit_id: unit_id.to_string(),
            locale: None,
            segment: Some(segment.to_string()),
        });
    }

    /// Placeholder for one segment of a given locale's variant
    pub fn add_segment_placeholder_for(&mut self, unit_id: &str, segment: &str, locale: &LocaleId) {
        self.parts.push(SkeletonPart::Content {
            unit_id: unit_id.to_string(),
            locale: Some(locale.clone()),
            segment: Some(segment.to_string()),
        });
    }

    pub fn add_reference(&mut self, id: &str) {
        self.parts.push(SkeletonPart::Reference { id: id.to_string() });
    }

    /// Concatenate another skeleton
    pub fn add(&mut self, other: &Skeleton) {
        for part in &other.parts {
            match part {
                SkeletonPart::Text { text } => self.append(text),
                _ => self.parts.push(part.clone()),
            }
        }
    }

    /// Whether the skeleton has at least one content placeholder
    pub fn has_content_placeholder(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, SkeletonPart::Content { .. }))
    }

    /// Put literal text around the first content placeholder of `unit_id`;
    /// returns false when there is no such placeholder
    pub fn wrap_content(&mut self, unit_id: &str, before: &str, after: &str) -> bool {
        let Some(pos) = self.parts.iter().position(
            |p| matches!(p, SkeletonPart::Content { unit_id: id, .. } if id == unit_id),
        ) else {
            return false;
        };
        let tail = self.parts.split_off(pos + 1);
        let placeholder = self.parts.pop();
        self.append(before);
        self.parts.extend(placeholder);
        self.append(after);
        self.add(&Skeleton { parts: tail });
        true
    }

    /// Rewrite every content placeholder's unit id through `f`
    pub fn rename_units<F: Fn(&str) -> String>(&mut self, f: F) {
        for part in self.parts.iter_mut() {
            if let SkeletonPart::Content { unit_id, .. } = part {
                *unit_id = f(unit_id);
            }
        }
    }

    /// Rewrite every reference id through `f`
    pub fn rename_references<F: Fn(&str) -> String>(&mut self, f: F) {
        for part in self.parts.iter_mut() {
            if let SkeletonPart::Reference { id } = part {
                *id = f(id);
            }
        }
    }

    /// Resolve the skeleton in one pass
    pub fn render<R: SkeletonResolver + ?Sized>(&self, resolver: &mut R) -> Result<String> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                SkeletonPart::Text { text } => out.push_str(&resolver.literal(text)),
                SkeletonPart::Content {
                    unit_id,
                    locale,
                    segment,
                } => out.push_str(&resolver.content(unit_id, locale.as_ref(), segment.as_deref())?),
                SkeletonPart::Reference { id } => out.push_str(&resolver.reference(id)?),
            }
        }
        Ok(out)
    }
}

/// Debug view: literals as-is, placeholders as `[#$id]`
impl fmt::Display for Skeleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                SkeletonPart::Text { text } => write!(f, "{}", text)?,
                SkeletonPart::Content { unit_id, .. } => write!(f, "[#${}]", unit_id)?,
                SkeletonPart::Reference { id } => write!(f, "[#${}]", id)?,
            }
        }
        Ok(())
    }
}
