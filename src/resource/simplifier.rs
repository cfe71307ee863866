/*!
 * Optional post-process over extracted fragments: merges adjacent codes and
 * moves codes at the edges of a unit into its skeleton.
 *
 * Whether edge codes may leave the fragment depends on the unit having a
 * skeleton to receive them; `BoundaryPolicy` makes that choice explicit.
 */

use serde::{Deserialize, Serialize};

use crate::resource::code::{Code, TagType};
use crate::resource::fragment::{
    MARKER_CLOSING, MARKER_ISOLATED, MARKER_OPENING, TextFragment, is_marker, to_char, to_index,
};
use crate::resource::unit::TextUnit;

/// How edge codes are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Edge codes move to the skeleton when the unit has one
    #[default]
    SkeletonAware,
    /// Edge codes are merged but always stay in the fragment
    FragmentOnly,
}

/// Simplifier settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifierPolicy {
    #[serde(default = "default_true")]
    pub merge_adjacent: bool,
    /// Codes separated only by spaces are merged too, spaces included
    #[serde(default)]
    pub merge_across_whitespace: bool,
    #[serde(default)]
    pub remove_leading_trailing: bool,
    #[serde(default)]
    pub boundary: BoundaryPolicy,
}

fn default_true() -> bool {
    true
}

impl Default for SimplifierPolicy {
    fn default() -> Self {
        Self {
            merge_adjacent: true,
            merge_across_whitespace: false,
            remove_leading_trailing: false,
            boundary: BoundaryPolicy::default(),
        }
    }
}

/// Data taken out of a fragment's edges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeData {
    pub leading: String,
    pub trailing: String,
}

impl EdgeData {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.trailing.is_empty()
    }
}

/// Token of a fragment: a text run or one code
enum Token {
    Text(String),
    Code(Code),
}

fn tokenize(fragment: &TextFragment) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut chars = fragment.coded_text().chars();
    while let Some(c) = chars.next() {
        if is_marker(c) {
            if !text.is_empty() {
                tokens.push(Token::Text(std::mem::take(&mut text)));
            }
            if let Some(code) = chars.next().and_then(|ic| fragment.codes().get(to_index(ic))) {
                tokens.push(Token::Code(code.clone()));
            }
        } else {
            text.push(c);
        }
    }
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

fn merge(first: &Code, data: &str) -> Code {
    let mut merged = Code::new(TagType::Placeholder, &first.code_type, data);
    merged.id = first.id;
    merged.deletable = first.deletable;
    merged.cloneable = first.cloneable;
    merged
}

pub struct CodeSimplifier {
    policy: SimplifierPolicy,
}

impl CodeSimplifier {
    pub fn new(policy: SimplifierPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SimplifierPolicy {
        &self.policy
    }

    /// Simplify one fragment; edge codes are removed only when
    /// `allow_edge_removal` and returned as data
    pub fn simplify(&self, fragment: &mut TextFragment, allow_edge_removal: bool) -> EdgeData {
        let mut tokens = tokenize(fragment);
        if self.policy.merge_adjacent {
            tokens = self.merge_tokens(tokens);
        }

        let mut edges = EdgeData::default();
        if allow_edge_removal && self.policy.remove_leading_trailing {
            while let Some(Token::Code(code)) = tokens.first() {
                edges.leading.push_str(code.output_data());
                tokens.remove(0);
            }
            let mut trailing = Vec::new();
            while let Some(Token::Code(code)) = tokens.last() {
                trailing.push(code.output_data().to_string());
                tokens.pop();
            }
            trailing.reverse();
            edges.trailing = trailing.concat();
        }

        let mut coded = String::new();
        let mut codes = Vec::new();
        for token in tokens {
            match token {
                Token::Text(text) => coded.push_str(&text),
                Token::Code(code) => {
                    let marker = match code.tag_type {
                        TagType::Opening => MARKER_OPENING,
                        TagType::Closing => MARKER_CLOSING,
                        TagType::Placeholder => MARKER_ISOLATED,
                    };
                    coded.push(marker);
                    coded.push(to_char(codes.len()));
                    codes.push(code);
                }
            }
        }
        fragment.replace_contents(coded, codes);
        edges
    }

    fn merge_tokens(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
        // Spaces seen after a code, waiting to see whether another code follows
        let mut pending_spaces: Option<String> = None;

        for token in tokens {
            match token {
                Token::Code(code) => {
                    let spaces = pending_spaces.take();
                    if let Some(Token::Code(prev)) = out.last_mut() {
                        let data = format!(
                            "{}{}{}",
                            prev.output_data(),
                            spaces.unwrap_or_default(),
                            code.output_data()
                        );
                        *prev = merge(prev, &data);
                        continue;
                    }
                    if let Some(spaces) = spaces {
                        out.push(Token::Text(spaces));
                    }
                    out.push(Token::Code(code));
                }
                Token::Text(text) => {
                    if let Some(spaces) = pending_spaces.take() {
                        out.push(Token::Text(spaces));
                    }
                    let only_spaces = text.chars().all(|c| c == ' ');
                    if self.policy.merge_across_whitespace
                        && only_spaces
                        && matches!(out.last(), Some(Token::Code(_)))
                    {
                        pending_spaces = Some(text);
                    } else {
                        out.push(Token::Text(text));
                    }
                }
            }
        }
        if let Some(spaces) = pending_spaces {
            out.push(Token::Text(spaces));
        }
        out
    }

    /// Simplify a unit's source; edge data goes into the unit's skeleton
    /// around its content placeholder
    pub fn simplify_unit(&self, unit: &mut TextUnit) {
        let can_move = self.policy.boundary == BoundaryPolicy::SkeletonAware
            && unit
                .skeleton
                .as_ref()
                .is_some_and(|s| s.has_content_placeholder());
        let unit_id = unit.id.clone();
        let edges = self.simplify(unit.source_fragment_mut(), can_move);
        if edges.is_empty() {
            return;
        }
        if let Some(skeleton) = unit.skeleton.as_mut() {
            skeleton.wrap_content(&unit_id, &edges.leading, &edges.trailing);
        }
    }
}
