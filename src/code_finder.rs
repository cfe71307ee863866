/*!
 * Regex-driven inline code finder.
 *
 * Rules run in list order over the coded text of a fragment. Each match
 * becomes a placeholder code; a region turned into a code is never scanned
 * again, so a later rule only sees what earlier rules left exposed. Matches
 * that are empty or that overlap an existing code are skipped. When new codes
 * were added, ids are renumbered left to right.
 */

use log::{debug, trace};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{FilterError, Result};
use crate::resource::code::{TYPE_CODE_FINDER, TagType};
use crate::resource::fragment::TextFragment;

/// Java message-format placeholders: `{0}`, `{1,number}`; escaped braces
/// are left alone
pub const RULE_MESSAGE_FORMAT: &str = r"\{\d[^\\]*?\}";
/// printf-style conversions
pub const RULE_PRINTF: &str = r"%(\d+\$)?[-+ #0]*\d*(\.\d+)?[hlLqjzt]*[diouxXeEfFgGaAcspn%]";
/// XML/HTML tags
pub const RULE_XML_TAG: &str = r"</?[A-Za-z][^>]*>";

/// Ordered rule list plus the compiled expressions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineCodeFinder {
    #[serde(default)]
    pub rules: Vec<String>,
    /// Text used by `test_sample`
    #[serde(default)]
    pub sample: String,
    #[serde(default)]
    pub use_all_rules_when_testing: bool,
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
    #[serde(skip)]
    compiled: Option<Vec<Regex>>,
}

fn default_true() -> bool {
    true
}

impl Default for InlineCodeFinder {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            sample: String::new(),
            use_all_rules_when_testing: false,
            case_sensitive: true,
            compiled: None,
        }
    }
}

impl PartialEq for InlineCodeFinder {
    fn eq(&self, other: &Self) -> bool {
        self.rules == other.rules
            && self.sample == other.sample
            && self.use_all_rules_when_testing == other.use_all_rules_when_testing
            && self.case_sensitive == other.case_sensitive
    }
}

impl InlineCodeFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rules: rules.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn add_rule(&mut self, rule: &str) {
        self.rules.push(rule.to_string());
        self.compiled = None;
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    fn build(&self, rule: &str) -> Result<Regex> {
        let pattern = if self.case_sensitive {
            rule.to_string()
        } else {
            format!("(?i){}", rule)
        };
        Regex::new(&pattern).map_err(|e| FilterError::InvalidRule {
            rule: rule.to_string(),
            message: e.to_string(),
        })
    }

    /// Compile every rule; fails on the first one that does not compile
    pub fn compile(&mut self) -> Result<()> {
        let compiled = self
            .rules
            .iter()
            .map(|rule| self.build(rule))
            .collect::<Result<Vec<_>>>()?;
        debug!("Compiled {} code finder rule(s)", compiled.len());
        self.compiled = Some(compiled);
        Ok(())
    }

    /// Convert matches in `fragment` to placeholder codes; returns how many
    /// codes were added
    pub fn process(&mut self, fragment: &mut TextFragment) -> Result<usize> {
        if self.compiled.is_none() {
            self.compile()?;
        }
        let Some(regexes) = self.compiled.as_ref() else {
            return Ok(0);
        };

        let mut added = 0;
        for regex in regexes {
            let spans = fragment.code_spans();
            let matches: Vec<(usize, usize)> = regex
                .find_iter(fragment.coded_text())
                .filter(|m| !m.is_empty())
                .filter(|m| !spans.iter().any(|&(s, e)| m.start() < e && s < m.end()))
                .map(|m| (m.start(), m.end()))
                .collect();

            // Right to left so earlier offsets stay valid
            for &(start, end) in matches.iter().rev() {
                fragment.change_to_code(start, end, TagType::Placeholder, TYPE_CODE_FINDER)?;
                added += 1;
            }
            trace!("Rule '{}' produced {} code(s)", regex.as_str(), matches.len());
        }

        if added > 0 {
            fragment.renumber_codes();
        }
        Ok(added)
    }

    /// Matches of the sample text, for checking rules; only the last rule is
    /// used unless `use_all_rules_when_testing`
    pub fn test_sample(&self) -> Result<Vec<String>> {
        let rules: Vec<&String> = if self.use_all_rules_when_testing {
            self.rules.iter().collect()
        } else {
            self.rules.last().into_iter().collect()
        };
        let mut found = Vec::new();
        for rule in rules {
            let regex = self.build(rule)?;
            found.extend(
                regex
                    .find_iter(&self.sample)
                    .filter(|m| !m.is_empty())
                    .map(|m| m.as_str().to_string()),
            );
        }
        Ok(found)
    }
}
